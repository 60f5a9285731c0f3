//! Data-driven content for the manaflow engine: node templates and scenes
//! loaded from RON, TOML or JSON files.

pub mod library;
pub mod loader;
pub mod scene;
pub mod schema;

pub use library::TemplateLibrary;
pub use loader::DataLoadError;
pub use scene::{Scene, load_scene};
