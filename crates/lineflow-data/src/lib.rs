//! Line description files: stations, edges and engine settings in RON, TOML
//! or JSON, loaded into core descriptors and saved back verbatim.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, Format, build_simulator, load_line, parse_line, save_line};
pub use schema::LineFile;
