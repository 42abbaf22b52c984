//! Wire and data model shared by the tandem session engine.

pub mod model;

pub use model::*;
