//! CLI command implementations.

pub mod channels;
pub mod common;
pub mod decrypt;
pub mod encrypt;
pub mod exchange;
pub mod keygen;
pub mod version;
