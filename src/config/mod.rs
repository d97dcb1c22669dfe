//! Configuration loading and persistence (§6, §10).
//!
//! Settings live as JSON at a per-user config path resolved via the `dirs`
//! crate. Parse failures on load are soft: a warning is logged and defaults
//! are returned, mirroring the teacher's auto-discovered-config behaviour
//! (`src/config/loader.rs`) even though the file format here is JSON rather
//! than TOML/YAML.

pub mod loader;

pub use loader::{config_path, data_dir, load_settings, save_settings};
