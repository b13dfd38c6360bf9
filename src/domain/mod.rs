pub mod models;
pub mod cep;
pub mod errors;

pub use models::*;
pub use cep::*;
pub use errors::*;
