//! Helper Utilities
//!
//! Config directory handling and secret sealing.

mod fs;
mod secret;

pub use fs::*;
pub use secret::*;
