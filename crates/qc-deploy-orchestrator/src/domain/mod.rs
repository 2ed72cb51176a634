//! # Domain Module
//!
//! Plan model, resolution table, errors and the pure rules around them.

pub mod catalog;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod presets;
pub mod services;
pub mod value_objects;

pub use catalog::*;
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use presets::*;
pub use services::*;
pub use value_objects::*;
