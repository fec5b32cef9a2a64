//! Shared infrastructure: error taxonomy and common API types.

pub mod api_common;
pub mod error;
