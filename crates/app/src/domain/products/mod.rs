//! Products

pub mod errors;
pub mod records;
pub mod source;

pub use errors::ProductSourceError;
pub use source::*;
