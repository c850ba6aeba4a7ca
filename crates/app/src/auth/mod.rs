//! Authentication

mod errors;
mod identity;
mod models;
mod session;
mod token;

pub use errors::*;
pub use identity::*;
pub use models::*;
pub use session::*;
pub use token::*;
