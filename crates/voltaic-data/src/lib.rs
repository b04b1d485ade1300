//! Data files for Voltaic grids: configuration and cable layouts, in RON,
//! TOML or JSON, detected by file extension.

pub mod config;
pub mod layout;
pub mod loader;

pub use config::GridConfig;
pub use layout::Layout;
pub use loader::DataLoadError;
