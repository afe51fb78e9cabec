//! Serializer seam
//!
//! The pipeline prepares the scene and hands it to an [`FbxSerializer`]
//! while every rewrite is still in place. Writing the actual FBX byte
//! format lives behind this trait; tests plug in recording serializers to
//! observe exactly what a writer would see.

use crate::export::FbxExportParams;
use crate::scene::Scene;
use thiserror::Error;

/// Sink for a fully prepared scene
pub trait FbxSerializer {
    /// Write the prepared scene to the destination in `params`
    ///
    /// Called once per export run, after preparation and before
    /// restoration. The scene's world-matrix caches are current.
    fn export(&mut self, scene: &Scene, params: &FbxExportParams) -> Result<(), SerializeError>;
}

/// Serializer failures
#[derive(Error, Debug)]
pub enum SerializeError {
    /// Destination could not be written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene contains something the writer cannot represent
    #[error("unsupported content: {0}")]
    Unsupported(String),
}
