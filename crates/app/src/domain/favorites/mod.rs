//! Favorites

mod state;

pub use state::*;
