//! Shared plumbing for Bankbook services.

pub mod logging;
pub mod tsid;

pub use tsid::SurrogateKey;
