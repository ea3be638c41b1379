use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::tileset::{Grid, Tile, TileImage, Tileset};

// ── ScanOptions ──────────────────────────────────────────────────────────────

/// How a sprite folder is turned into tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanOptions {
    /// Accepted file extensions, compared case-insensitively, without the dot.
    pub extensions: Vec<String>,
    /// Id given to the first image when building a new tileset.
    pub first_id: u32,
    /// Directory the tileset file will be saved in; sources are written
    /// relative to it.
    pub relative_to: PathBuf,
    pub grid: Grid,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["png".to_string()],
            first_id: 0,
            relative_to: PathBuf::from("."),
            grid: Grid::orthogonal(crate::GRID_CELL_SIZE, crate::GRID_CELL_SIZE),
        }
    }
}

// ── Discovery ────────────────────────────────────────────────────────────────

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Every file under `dir` (recursively) with one of `extensions`, sorted by
/// path so ids come out the same on every platform.
pub fn image_files(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("scan: skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_extension(p, extensions))
        .collect();
    files.sort();
    files
}

// ── Relative sources ─────────────────────────────────────────────────────────

/// Absolute, lexically normalised form of `path` (`.` and `..` folded).
fn lexical_absolute(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for comp in abs.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `target` expressed relative to directory `base`, always `/`-separated.
pub fn relative_source(base: &Path, target: &Path) -> String {
    let base = lexical_absolute(base);
    let target = lexical_absolute(target);

    let base_parts: Vec<_> = base.components().collect();
    let target_parts: Vec<_> = target.components().collect();
    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); base_parts.len() - common];
    parts.extend(
        target_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

// ── Scanning ─────────────────────────────────────────────────────────────────

/// Pixel size of the image at `path`. Only the header is decoded.
pub fn image_size(path: &Path) -> Result<(u32, u32)> {
    image::image_dimensions(path).map_err(|source| Error::Image { path: path.to_path_buf(), source })
}

/// Tiles for every readable image in `dir`, numbered from `next_id`, skipping
/// sources for which `skip` returns true. `None` means no id is left; that is
/// only an error once an image actually needs one.
fn collect_tiles(
    dir: &Path,
    opts: &ScanOptions,
    mut next_id: Option<u32>,
    skip: impl Fn(&str) -> bool,
) -> Result<Vec<Tile>> {
    if !dir.is_dir() {
        return Err(Error::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "sprite folder does not exist"),
        ));
    }

    let mut tiles = Vec::new();
    for path in image_files(dir, &opts.extensions) {
        let source = relative_source(&opts.relative_to, &path);
        if skip(&source) {
            continue;
        }
        match image_size(&path) {
            Ok((w, h)) => {
                let id = next_id.ok_or(Error::IdSpaceExhausted)?;
                tiles.push(Tile::new(id, TileImage::new(source, w, h)));
                next_id = id.checked_add(1);
            }
            Err(e) => log::warn!("scan: skipping {e}"),
        }
    }
    Ok(tiles)
}

/// Build an image-collection tileset from every sprite under `dir`.
///
/// Declared tile size and count are derived from the images found.
pub fn scan_folder(name: &str, dir: &Path, opts: &ScanOptions) -> Result<Tileset> {
    let mut ts = Tileset::new(name, opts.grid.width, opts.grid.height);
    ts.grid = Some(opts.grid);
    for tile in collect_tiles(dir, opts, Some(opts.first_id), |_| false)? {
        ts.insert(tile)?;
    }
    ts.refresh_metadata();
    log::info!("scan: {} tiles from {}", ts.len(), dir.display());
    Ok(ts)
}

/// Add sprites under `dir` that `ts` does not reference yet. Existing ids are
/// kept; new tiles get ids from [`Tileset::next_free_id`]. Returns the new ids.
///
/// Fails with [`Error::IdSpaceExhausted`] when a new sprite needs an id past
/// `u32::MAX`.
pub fn append_folder(ts: &mut Tileset, dir: &Path, opts: &ScanOptions) -> Result<Vec<u32>> {
    let tiles = collect_tiles(dir, opts, ts.next_free_id(), |source| ts.find_by_source(source).is_some())?;
    let ids: Vec<u32> = tiles.iter().map(|t| t.id).collect();
    for tile in tiles {
        ts.insert(tile)?;
    }
    ts.refresh_metadata();
    log::info!("scan: appended {} tiles from {}", ids.len(), dir.display());
    Ok(ids)
}
