//! Application layer managing state and business workflows.
//!
//! This module coordinates between the domain layer and presentation layer:
//! the address form, the filtered listing, navigation between them and the
//! notifications shown to the user.

pub mod form;
pub mod table;
pub mod state;

pub use form::*;
pub use table::*;
pub use state::*;
