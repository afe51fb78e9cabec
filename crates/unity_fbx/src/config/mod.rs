//! Export preset persistence

pub use serde::{Deserialize, Serialize};

/// Preset trait
///
/// Any serializable options type gains file-based presets in TOML or RON,
/// picked by file extension.
pub trait Preset: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load a preset from file
    fn load_from_file(path: &str) -> Result<Self, PresetError> {
        let contents = std::fs::read_to_string(path).map_err(PresetError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| PresetError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| PresetError::Parse(e.to_string()))
        } else {
            Err(PresetError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save a preset to file
    fn save_to_file(&self, path: &str) -> Result<(), PresetError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| PresetError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| PresetError::Serialize(e.to_string()))?
        } else {
            return Err(PresetError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(PresetError::Io)
    }
}

/// Preset errors
#[derive(thiserror::Error, Debug)]
pub enum PresetError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
