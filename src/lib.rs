pub mod cs;

pub use cs::compression;
pub use cs::compression::{Stepper, TextCompression};
pub use cs::error::{Error, Result};
