//! Format detection, parsing and writing of line files.
//!
//! The format is chosen by file extension (`.ron`, `.toml`, `.json`).
//! Parsing only checks syntax and field types; topology validation happens
//! when the descriptor is handed to the simulator.

use std::path::{Path, PathBuf};

use lineflow_core::engine::Simulator;
use lineflow_core::station::ConfigError;
use tracing::debug;

use crate::schema::LineFile;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or saving a line file.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The line could not be written in the requested format.
    #[error("cannot write {format:?}: {detail}")]
    Serialize { format: Format, detail: String },

    /// The file parsed but describes an invalid line.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported line file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Reading
// ===========================================================================

/// Parse line text in the given format. Parse errors name `<text>` as the file.
pub fn parse_line(content: &str, format: Format) -> Result<LineFile, DataLoadError> {
    parse_named(content, format, Path::new("<text>"))
}

fn parse_named(content: &str, format: Format, file: &Path) -> Result<LineFile, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read and parse a line file, format detected from the extension.
pub fn load_line(path: &Path) -> Result<LineFile, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let line = parse_named(&content, format, path)?;
    debug!(
        path = %path.display(),
        stations = line.stations.len(),
        edges = line.edges.len(),
        "loaded line file"
    );
    Ok(line)
}

/// Load a line file and build a simulator from it.
pub fn build_simulator(path: &Path) -> Result<Simulator, DataLoadError> {
    let (descriptor, settings) = load_line(path)?.into_parts();
    Ok(Simulator::new(descriptor, settings)?)
}

// ===========================================================================
// Writing
// ===========================================================================

/// Render a line in the given format.
pub fn to_string(line: &LineFile, format: Format) -> Result<String, DataLoadError> {
    let serialize_error = |detail: String| DataLoadError::Serialize { format, detail };
    match format {
        Format::Ron => ron::ser::to_string_pretty(line, ron::ser::PrettyConfig::default())
            .map_err(|e| serialize_error(e.to_string())),
        Format::Json => {
            serde_json::to_string_pretty(line).map_err(|e| serialize_error(e.to_string()))
        }
        Format::Toml => toml::to_string_pretty(line).map_err(|e| serialize_error(e.to_string())),
    }
}

/// Write a line file, format chosen by the extension.
pub fn save_line(path: &Path, line: &LineFile) -> Result<(), DataLoadError> {
    let format = detect_format(path)?;
    std::fs::write(path, to_string(line, format)?)?;
    debug!(path = %path.display(), "saved line file");
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
