use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::scan::ScanOptions;
use crate::tileset::Grid;

// ── ToolConfig ────────────────────────────────────────────────────────────────

/// Settings for the command-line tool, read from an optional JSON file.
///
/// Every field has a default, so `{}` is a valid config. Command-line flags
/// take precedence over values from the file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Grid cell width used for newly scanned tilesets.
    pub grid_width: u32,
    /// Grid cell height used for newly scanned tilesets.
    pub grid_height: u32,
    /// Sprite file extensions, without the dot.
    pub image_extensions: Vec<String>,
    /// Check referenced images on disk during `validate`.
    pub check_images: bool,
    /// Sprite folder to look for unreferenced images in.
    pub sprite_dir: Option<PathBuf>,
    /// Treat warnings as failures.
    pub strict: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            grid_width:       crate::GRID_CELL_SIZE,
            grid_height:      crate::GRID_CELL_SIZE,
            image_extensions: vec!["png".to_string()],
            check_images:     false,
            sprite_dir:       None,
            strict:           false,
        }
    }
}

impl ToolConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_json(&json)?;
        log::debug!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Scan options for a tileset that will be saved into `tileset_dir`.
    pub fn scan_options(&self, tileset_dir: &Path) -> ScanOptions {
        ScanOptions {
            extensions: self.image_extensions.clone(),
            first_id: 0,
            relative_to: tileset_dir.to_path_buf(),
            grid: Grid::orthogonal(self.grid_width, self.grid_height),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
