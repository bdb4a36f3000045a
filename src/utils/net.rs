use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::debug;

/// Best-effort discovery of the address other machines on the LAN use to reach us.
///
/// Connecting a UDP socket sends no packets; it only asks the OS which local
/// interface would route to the target. Falls back to loopback when the
/// machine has no route (offline sandboxes, CI containers).
pub fn local_ip_address() -> IpAddr {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect((Ipv4Addr::new(192, 0, 2, 1), 80))?;
        Ok(socket.local_addr()?.ip())
    };

    match probe() {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(e) => {
            debug!("Could not determine local network address: {e}");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}
