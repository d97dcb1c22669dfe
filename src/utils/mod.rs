//! Small, dependency-free helpers shared across modules.

pub mod encoding;
pub mod paths;
pub mod tokens;

pub use encoding::read_file_safe;
pub use tokens::estimate_tokens;
