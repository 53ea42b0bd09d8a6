//! Access credential model and the shared holder slot.

pub mod credential;
pub mod holder;

pub use credential::*;
pub use holder::*;
