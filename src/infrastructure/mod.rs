//! Infrastructure layer providing external service integrations.
//!
//! This module contains the persisted address slot and the postal code
//! lookup service client.

pub mod persistence;
pub mod viacep;

pub use persistence::*;
pub use viacep::*;
