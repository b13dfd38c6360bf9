//! cepbook - Terminal Address Book Library
//!
//! Saves named postal addresses, filling street, district, city and state in
//! from a Brazilian postal code (CEP) lookup.

pub mod config;
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
