pub mod net;
pub use net::local_ip_address;
pub mod url_validation;
pub use url_validation::{UrlValidationError, is_loopback_host, validate_api_base_url};
