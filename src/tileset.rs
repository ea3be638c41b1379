use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geometry::cell_span;

// ── Orientation / FillMode ───────────────────────────────────────────────────

/// Grid orientation used by the editor when placing tiles from this set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Orthogonal => "orthogonal",
            Orientation::Isometric => "isometric",
        }
    }
}

impl FromStr for Orientation {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "orthogonal" => Ok(Orientation::Orthogonal),
            "isometric" => Ok(Orientation::Isometric),
            _ => Err(()),
        }
    }
}

/// How a tile image is fitted when it is drawn into a cell of a different size.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillMode {
    #[default]
    Stretch,
    PreserveAspectFit,
}

impl FillMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FillMode::Stretch => "stretch",
            FillMode::PreserveAspectFit => "preserve-aspect-fit",
        }
    }
}

impl FromStr for FillMode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "stretch" => Ok(FillMode::Stretch),
            "preserve-aspect-fit" => Ok(FillMode::PreserveAspectFit),
            _ => Err(()),
        }
    }
}

// ── Grid ─────────────────────────────────────────────────────────────────────

/// The logical grid that map coordinates are expressed in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    pub orientation: Orientation,
    /// Cell width in pixels.
    pub width: u32,
    /// Cell height in pixels.
    pub height: u32,
}

impl Grid {
    pub fn orthogonal(width: u32, height: u32) -> Self {
        Self { orientation: Orientation::Orthogonal, width, height }
    }
}

// ── Properties ───────────────────────────────────────────────────────────────

/// Value type of a custom property, as spelled in the `type` attribute.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PropertyType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Color,
    File,
    Object,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Int => "int",
            PropertyType::Float => "float",
            PropertyType::Bool => "bool",
            PropertyType::Color => "color",
            PropertyType::File => "file",
            PropertyType::Object => "object",
        }
    }
}

impl FromStr for PropertyType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        Ok(match s {
            "string" => PropertyType::String,
            "int" => PropertyType::Int,
            "float" => PropertyType::Float,
            "bool" => PropertyType::Bool,
            "color" => PropertyType::Color,
            "file" => PropertyType::File,
            "object" => PropertyType::Object,
            _ => return Err(()),
        })
    }
}

/// A named custom property. The value is kept in its textual form, exactly as
/// the editor wrote it; the typed accessors interpret it on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub kind: PropertyType,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyType, value: impl Into<String>) -> Self {
        Self { name: name.into(), kind, value: value.into() }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        self.value.parse().ok()
    }

    pub fn as_float(&self) -> Option<f64> {
        self.value.parse().ok()
    }
}

/// Look up a property by name.
pub fn find_property<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties.iter().find(|p| p.name == name)
}

// ── Tile ─────────────────────────────────────────────────────────────────────

/// The single image a tile is drawn from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileImage {
    /// Path relative to the tileset file, `/`-separated.
    pub source: String,
    pub width: u32,
    pub height: u32,
}

impl TileImage {
    pub fn new(source: impl Into<String>, width: u32, height: u32) -> Self {
        Self { source: source.into(), width, height }
    }
}

/// One frame of a tile animation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    pub tile_id: u32,
    /// Milliseconds.
    pub duration: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub id: u32,
    pub image: TileImage,
    /// Free-form class name (`type` attribute in the file).
    pub class: Option<String>,
    /// Relative weight used by the editor's random brushes.
    pub probability: Option<f32>,
    pub properties: Vec<Property>,
    pub animation: Vec<Frame>,
}

impl Tile {
    pub fn new(id: u32, image: TileImage) -> Self {
        Self {
            id,
            image,
            class: None,
            probability: None,
            properties: Vec::new(),
            animation: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        find_property(&self.properties, name)
    }

    /// File stem of the image source (`"vent"` for `../sprites/robotropolis/vent.png`).
    pub fn image_stem(&self) -> &str {
        let file = self.image.source.rsplit('/').next().unwrap_or(&self.image.source);
        match file.rfind('.') {
            Some(0) | None => file,
            Some(dot) => &file[..dot],
        }
    }
}

// ── Tileset ──────────────────────────────────────────────────────────────────

/// An image-collection tileset: every tile carries its own image.
///
/// Tiles are keyed by id in an ordered map, so ids are unique by construction
/// and iteration is always in ascending id order. Ids need not be contiguous.
///
/// `tile_width`, `tile_height` and `tile_count` are the values *declared* in
/// the file. For a collection tileset the editor derives them from the tiles
/// (largest image, number of tiles); [`Tileset::refresh_metadata`] recomputes
/// them the same way after authoring changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Tileset {
    pub name: String,
    /// Format version (`version` attribute).
    pub version: Option<String>,
    /// Version of the editor that last saved the file.
    pub tiled_version: Option<String>,
    pub class: Option<String>,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    /// Always 0 for image collections.
    pub columns: u32,
    pub spacing: u32,
    pub margin: u32,
    pub fill_mode: Option<FillMode>,
    pub grid: Option<Grid>,
    pub properties: Vec<Property>,
    tiles: BTreeMap<u32, Tile>,
}

impl Tileset {
    /// Version stamps written on tilesets created by this crate.
    pub const FORMAT_VERSION: &'static str = "1.10";
    pub const TILED_VERSION: &'static str = "1.11.1";

    /// An empty collection tileset on an orthogonal `grid_w × grid_h` grid.
    pub fn new(name: impl Into<String>, grid_w: u32, grid_h: u32) -> Self {
        Self {
            name: name.into(),
            version: Some(Self::FORMAT_VERSION.to_string()),
            tiled_version: Some(Self::TILED_VERSION.to_string()),
            class: None,
            tile_width: grid_w,
            tile_height: grid_h,
            tile_count: 0,
            columns: 0,
            spacing: 0,
            margin: 0,
            fill_mode: None,
            grid: Some(Grid::orthogonal(grid_w, grid_h)),
            properties: Vec::new(),
            tiles: BTreeMap::new(),
        }
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn get(&self, id: u32) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Tile> {
        self.tiles.get_mut(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.tiles.contains_key(&id)
    }

    /// Tiles in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.tiles.keys().copied()
    }

    /// Number of tiles actually present (not the declared `tile_count`).
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Ids below the highest used id that have no tile, in ascending order.
    ///
    /// Lazy: a file using ids 0 and `u32::MAX` has billions of gaps.
    pub fn missing_ids(&self) -> impl Iterator<Item = u32> + '_ {
        let mut expected = 0u32;
        self.tiles.keys().flat_map(move |&id| {
            let gap = expected..id;
            expected = id.saturating_add(1);
            gap
        })
    }

    /// One past the highest used id, which is what the editor hands out to a
    /// newly added tile. Gaps are never reused. `None` once `u32::MAX` is taken.
    pub fn next_free_id(&self) -> Option<u32> {
        match self.tiles.keys().next_back() {
            Some(&last) => last.checked_add(1),
            None => Some(0),
        }
    }

    /// First tile whose image source equals `source`.
    pub fn find_by_source(&self, source: &str) -> Option<&Tile> {
        self.tiles.values().find(|t| t.image.source == source)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        find_property(&self.properties, name)
    }

    // ── Authoring ─────────────────────────────────────────────────────────

    /// Add a tile. Fails if a tile with the same id already exists.
    pub fn insert(&mut self, tile: Tile) -> Result<()> {
        if self.tiles.contains_key(&tile.id) {
            return Err(Error::DuplicateTileId(tile.id));
        }
        self.tiles.insert(tile.id, tile);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Option<Tile> {
        self.tiles.remove(&id)
    }

    /// Recompute the declared tile size and count from the tiles.
    ///
    /// An empty tileset keeps its declared tile size.
    pub fn refresh_metadata(&mut self) {
        if let Some((w, h)) = self.max_image_size() {
            self.tile_width = w;
            self.tile_height = h;
        }
        self.tile_count = self.tiles.len() as u32;
        self.columns = 0;
    }

    // ── Grid helpers ──────────────────────────────────────────────────────

    /// Width and height of one grid cell. Falls back to the declared tile
    /// size when the file has no `<grid>` element.
    pub fn cell_size(&self) -> (u32, u32) {
        match self.grid {
            Some(g) => (g.width, g.height),
            None => (self.tile_width, self.tile_height),
        }
    }

    /// How many grid cells tile `id` covers as `(columns, rows)`.
    pub fn cell_span(&self, id: u32) -> Option<(u32, u32)> {
        let tile = self.tiles.get(&id)?;
        let (cw, ch) = self.cell_size();
        Some(cell_span(tile.image.width, tile.image.height, cw, ch))
    }

    /// Largest image width and largest image height over all tiles.
    pub fn max_image_size(&self) -> Option<(u32, u32)> {
        if self.tiles.is_empty() {
            return None;
        }
        let w = self.tiles.values().map(|t| t.image.width).max().unwrap_or(0);
        let h = self.tiles.values().map(|t| t.image.height).max().unwrap_or(0);
        Some((w, h))
    }
}

impl fmt::Display for Tileset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (cw, ch) = self.cell_size();
        write!(f, "{} ({} tiles, {cw}x{ch} grid)", self.name, self.tiles.len())
    }
}

impl<'a> IntoIterator for &'a Tileset {
    type Item = &'a Tile;
    type IntoIter = std::collections::btree_map::Values<'a, u32, Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.values()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
