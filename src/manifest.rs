//! Asset manifests
//!
//! A manifest is the hand-off document from an asset pipeline: a flat JSON
//! list of logical names and the source files backing them, fed straight
//! into [`build`](crate::build).
//!
//! ```json
//! {
//!   "assets": [
//!     { "name": "models/cube.fbx", "source": "build/meshes/cube.fbx" },
//!     { "name": "textures/brick.png", "source": "build/tex/brick.png" }
//!   ]
//! }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One manifest line: a logical name and the file backing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Logical asset name as consumers will request it.
    pub name: String,

    /// Source file read at build time.
    pub source: PathBuf,
}

/// Flat list of assets to pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub assets: Vec<ManifestEntry>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, source: impl Into<PathBuf>) {
        self.assets.push(ManifestEntry {
            name: name.into(),
            source: source.into(),
        });
    }

    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a manifest from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// `(name, source)` pairs in manifest order, shaped for
    /// [`build`](crate::build).
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.assets
            .iter()
            .map(|entry| (entry.name.as_str(), entry.source.as_path()))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
