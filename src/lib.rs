//! Evolves, verifies and analyses trading algorithms proposed by a
//! generative oracle.

pub mod config;
pub mod engines;
pub mod error;
pub mod oracle;
pub mod types;

pub use error::{ForgeError, Result};
pub use types::*;
