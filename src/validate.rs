use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::tileset::Tileset;

// ── Issue / Severity ─────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// One finding of a structural or on-disk check.
#[derive(Clone, Debug, PartialEq)]
pub enum Issue {
    EmptyName,
    ZeroGridSize { width: u32, height: u32 },
    ZeroTileSize { width: u32, height: u32 },
    TileCountMismatch { declared: u32, actual: u32 },
    ColumnsOnCollection { columns: u32 },
    TileSizeMismatch { declared: (u32, u32), largest: (u32, u32) },
    ZeroImageSize { id: u32, width: u32, height: u32 },
    EmptySource { id: u32 },
    SharedSource { source: String, ids: Vec<u32> },
    BadProbability { id: u32, probability: f32 },
    MissingFrameTile { id: u32, frame_tile: u32 },
    ImageMissing { id: u32, path: PathBuf },
    ImageUnreadable { id: u32, path: PathBuf, reason: String },
    ImageSizeMismatch { id: u32, declared: (u32, u32), actual: (u32, u32) },
    UnreferencedImage { path: PathBuf },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::EmptyName
            | Issue::TileSizeMismatch { .. }
            | Issue::SharedSource { .. }
            | Issue::UnreferencedImage { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// The tile this issue is about, if any.
    pub fn tile_id(&self) -> Option<u32> {
        match *self {
            Issue::ZeroImageSize { id, .. }
            | Issue::EmptySource { id }
            | Issue::BadProbability { id, .. }
            | Issue::MissingFrameTile { id, .. }
            | Issue::ImageMissing { id, .. }
            | Issue::ImageUnreadable { id, .. }
            | Issue::ImageSizeMismatch { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::EmptyName => write!(f, "tileset has an empty name"),
            Issue::ZeroGridSize { width, height } => write!(f, "grid cell size {width}x{height} is not positive"),
            Issue::ZeroTileSize { width, height } => write!(f, "declared tile size {width}x{height} is not positive"),
            Issue::TileCountMismatch { declared, actual } => {
                write!(f, "tilecount is {declared} but the tileset has {actual} tiles")
            }
            Issue::ColumnsOnCollection { columns } => {
                write!(f, "image collection declares {columns} columns (expected 0)")
            }
            Issue::TileSizeMismatch { declared, largest } => write!(
                f,
                "declared tile size {}x{} differs from the largest image {}x{}",
                declared.0, declared.1, largest.0, largest.1
            ),
            Issue::ZeroImageSize { id, width, height } => write!(f, "tile {id}: image size {width}x{height} is not positive"),
            Issue::EmptySource { id } => write!(f, "tile {id}: image source is empty"),
            Issue::SharedSource { source, ids } => write!(f, "tiles {ids:?} all use image {source}"),
            Issue::BadProbability { id, probability } => write!(f, "tile {id}: probability {probability} is invalid"),
            Issue::MissingFrameTile { id, frame_tile } => {
                write!(f, "tile {id}: animation frame refers to missing tile {frame_tile}")
            }
            Issue::ImageMissing { id, path } => write!(f, "tile {id}: image {} not found", path.display()),
            Issue::ImageUnreadable { id, path, reason } => {
                write!(f, "tile {id}: image {} could not be read: {reason}", path.display())
            }
            Issue::ImageSizeMismatch { id, declared, actual } => write!(
                f,
                "tile {id}: declared size {}x{} but the image is {}x{}",
                declared.0, declared.1, actual.0, actual.1
            ),
            Issue::UnreferencedImage { path } => write!(f, "image {} is not used by any tile", path.display()),
        }
    }
}

// ── Report ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub issues: Vec<Issue>,
}

impl Report {
    /// True when there is no error-severity issue. Warnings are allowed.
    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }
}

// ── Structural checks ────────────────────────────────────────────────────────

/// Schema-conformance checks that need nothing but the tileset itself.
///
/// Id uniqueness is guaranteed by [`Tileset`] and ids are unsigned, so
/// neither is checked here.
pub fn validate(ts: &Tileset) -> Report {
    let mut issues = Vec::new();

    if ts.name.trim().is_empty() {
        issues.push(Issue::EmptyName);
    }
    if let Some(grid) = ts.grid {
        if grid.width == 0 || grid.height == 0 {
            issues.push(Issue::ZeroGridSize { width: grid.width, height: grid.height });
        }
    }
    if ts.tile_width == 0 || ts.tile_height == 0 {
        issues.push(Issue::ZeroTileSize { width: ts.tile_width, height: ts.tile_height });
    }
    if ts.tile_count as usize != ts.len() {
        issues.push(Issue::TileCountMismatch { declared: ts.tile_count, actual: ts.len() as u32 });
    }
    if ts.columns != 0 {
        issues.push(Issue::ColumnsOnCollection { columns: ts.columns });
    }
    if let Some(largest) = ts.max_image_size() {
        let declared = (ts.tile_width, ts.tile_height);
        if declared != largest {
            issues.push(Issue::TileSizeMismatch { declared, largest });
        }
    }

    let mut by_source: HashMap<&str, Vec<u32>> = HashMap::new();
    for tile in ts {
        let img = &tile.image;
        if img.width == 0 || img.height == 0 {
            issues.push(Issue::ZeroImageSize { id: tile.id, width: img.width, height: img.height });
        }
        if img.source.trim().is_empty() {
            issues.push(Issue::EmptySource { id: tile.id });
        } else {
            by_source.entry(img.source.as_str()).or_default().push(tile.id);
        }
        if let Some(p) = tile.probability {
            if !p.is_finite() || p < 0.0 {
                issues.push(Issue::BadProbability { id: tile.id, probability: p });
            }
        }
        for frame in &tile.animation {
            if !ts.contains(frame.tile_id) {
                issues.push(Issue::MissingFrameTile { id: tile.id, frame_tile: frame.tile_id });
            }
        }
    }

    let mut shared: Vec<_> = by_source
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(source, ids)| Issue::SharedSource { source: source.to_string(), ids })
        .collect();
    shared.sort_by_key(|i| i.to_string());
    issues.extend(shared);

    Report { issues }
}

// ── On-disk checks ───────────────────────────────────────────────────────────

/// Resolve a tile source against the directory holding the tileset file.
pub fn resolve_source(base_dir: &Path, source: &str) -> PathBuf {
    base_dir.join(source)
}

/// Check that every referenced image exists and has the declared pixel size.
///
/// Only image headers are read. `base_dir` is the directory of the `.tsx`.
pub fn check_images(ts: &Tileset, base_dir: &Path) -> Vec<Issue> {
    let mut issues = Vec::new();
    for tile in ts {
        let path = resolve_source(base_dir, &tile.image.source);
        if !path.is_file() {
            issues.push(Issue::ImageMissing { id: tile.id, path });
            continue;
        }
        match image::image_dimensions(&path) {
            Ok(actual) => {
                let declared = (tile.image.width, tile.image.height);
                if actual != declared {
                    issues.push(Issue::ImageSizeMismatch { id: tile.id, declared, actual });
                }
            }
            Err(e) => issues.push(Issue::ImageUnreadable { id: tile.id, path, reason: e.to_string() }),
        }
    }
    issues
}

/// Images under `sprite_dir` with one of `extensions` that no tile refers to.
pub fn unreferenced_images(ts: &Tileset, base_dir: &Path, sprite_dir: &Path, extensions: &[String]) -> Vec<Issue> {
    let referenced: HashSet<PathBuf> = ts
        .iter()
        .map(|t| normalize(&resolve_source(base_dir, &t.image.source)))
        .collect();

    let mut issues: Vec<Issue> = crate::scan::image_files(sprite_dir, extensions)
        .into_iter()
        .filter(|path| !referenced.contains(&normalize(path)))
        .map(|path| Issue::UnreferencedImage { path })
        .collect();
    issues.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    issues
}

/// Canonical form used to compare paths that may contain `..` segments.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
