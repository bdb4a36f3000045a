//! Test Fixtures Module
//!
//! - Audio fixtures (programmatically generated WAV)
//! - Gateway fixtures (config, stub model and chat backend, request bodies)

// Not every test binary uses every fixture
#![allow(dead_code)]

pub mod audio_fixtures;
pub mod gateway;

pub use audio_fixtures::*;
pub use gateway::*;
