// Public modules
pub mod error;
pub mod patch;
pub mod paths;
pub mod replicate;
pub mod scene;
pub mod session;
pub mod table;

// Re-export common types for convenience
pub use error::{Error, Result};
