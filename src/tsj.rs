//! The editor's JSON tileset format (`.tsj` / `.json`).
//!
//! Keys follow the editor's own output (lower-case, alphabetical), so files
//! written here diff cleanly against files the editor exports.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::tileset::{FillMode, Frame, Grid, Orientation, Property, PropertyType, Tile, TileImage, Tileset};

// ── Raw (JSON-facing) types ───────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct RawTileset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    #[serde(default)]
    columns: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fillmode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grid: Option<RawGrid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default)]
    margin: u32,
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    properties: Vec<RawProperty>,
    #[serde(default)]
    spacing: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tilecount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tiledversion: Option<String>,
    tileheight: u32,
    #[serde(default)]
    tiles: Vec<RawTile>,
    tilewidth: u32,
    #[serde(rename = "type", default = "tileset_type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

fn tileset_type() -> String {
    "tileset".to_string()
}

#[derive(Serialize, Deserialize)]
struct RawGrid {
    height: u32,
    #[serde(default = "default_orientation")]
    orientation: String,
    width: u32,
}

fn default_orientation() -> String {
    Orientation::Orthogonal.as_str().to_string()
}

#[derive(Serialize, Deserialize)]
struct RawTile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    animation: Vec<RawFrame>,
    id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    imageheight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    imagewidth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    probability: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    properties: Vec<RawProperty>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct RawFrame {
    duration: u32,
    tileid: u32,
}

#[derive(Serialize, Deserialize)]
struct RawProperty {
    name: String,
    #[serde(rename = "type", default = "default_property_type")]
    kind: String,
    value: Value,
}

fn default_property_type() -> String {
    PropertyType::String.as_str().to_string()
}

// ── Property values ──────────────────────────────────────────────────────────

/// Typed JSON value for a property. Falls back to a string when the text does
/// not parse as its declared type or would not be written back unchanged
/// (`"+5"`, `"1e3"`), so importing the value restores the exact text.
fn property_to_json(p: &Property) -> Value {
    match p.kind {
        PropertyType::Int => p.as_int().map(Value::from),
        // Integral floats are written the way the editor writes them: `1`, not `1.0`.
        PropertyType::Float => p
            .as_int()
            .map(Value::from)
            .or_else(|| p.as_float().and_then(serde_json::Number::from_f64).map(Value::Number)),
        PropertyType::Bool => p.as_bool().map(Value::Bool),
        _ => None,
    }
    .filter(|v| v.to_string() == p.value)
    .unwrap_or_else(|| Value::String(p.value.clone()))
}

fn property_from_json(raw: RawProperty) -> Result<Property> {
    let kind = PropertyType::from_str(&raw.kind).map_err(|_| Error::invalid("property", "type", &raw.kind))?;
    let value = match raw.value {
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    Ok(Property { name: raw.name, kind, value })
}

// ── Conversion ───────────────────────────────────────────────────────────────

/// Serialise `tileset` as pretty-printed JSON.
pub fn to_json(tileset: &Tileset) -> Result<String> {
    let raw = RawTileset {
        class: tileset.class.clone(),
        columns: tileset.columns,
        fillmode: tileset.fill_mode.map(|m| m.as_str().to_string()),
        grid: tileset.grid.map(|g| RawGrid {
            height: g.height,
            orientation: g.orientation.as_str().to_string(),
            width: g.width,
        }),
        image: None,
        margin: tileset.margin,
        name: tileset.name.clone(),
        properties: tileset.properties.iter().map(raw_property).collect(),
        spacing: tileset.spacing,
        tilecount: Some(tileset.tile_count),
        tiledversion: tileset.tiled_version.clone(),
        tileheight: tileset.tile_height,
        tiles: tileset.iter().map(raw_tile).collect(),
        tilewidth: tileset.tile_width,
        kind: tileset_type(),
        version: tileset.version.clone(),
    };
    Ok(serde_json::to_string_pretty(&raw)?)
}

fn raw_property(p: &Property) -> RawProperty {
    RawProperty { name: p.name.clone(), kind: p.kind.as_str().to_string(), value: property_to_json(p) }
}

fn raw_tile(t: &Tile) -> RawTile {
    RawTile {
        animation: t
            .animation
            .iter()
            .map(|f| RawFrame { duration: f.duration, tileid: f.tile_id })
            .collect(),
        id: t.id,
        image: Some(t.image.source.clone()),
        imageheight: Some(t.image.height),
        imagewidth: Some(t.image.width),
        probability: t.probability,
        properties: t.properties.iter().map(raw_property).collect(),
        class: t.class.clone(),
    }
}

/// Parse a JSON tileset. Enforces the same invariants as the XML reader.
pub fn from_json(json: &str) -> Result<Tileset> {
    let raw: RawTileset = serde_json::from_str(json)?;

    if raw.kind != "tileset" {
        return Err(Error::UnexpectedRoot(raw.kind));
    }
    if raw.image.is_some() {
        return Err(Error::Unsupported(
            "single-image tilesets (only image collections are supported)".to_string(),
        ));
    }

    let mut ts = Tileset::new(raw.name, 0, 0);
    ts.version = raw.version;
    ts.tiled_version = raw.tiledversion;
    ts.class = raw.class;
    ts.tile_width = raw.tilewidth;
    ts.tile_height = raw.tileheight;
    ts.columns = raw.columns;
    ts.spacing = raw.spacing;
    ts.margin = raw.margin;
    ts.fill_mode = match raw.fillmode {
        None => None,
        Some(m) => Some(FillMode::from_str(&m).map_err(|_| Error::invalid("tileset", "fillmode", &m))?),
    };
    ts.grid = match raw.grid {
        None => None,
        Some(g) => Some(Grid {
            orientation: Orientation::from_str(&g.orientation)
                .map_err(|_| Error::invalid("grid", "orientation", &g.orientation))?,
            width: g.width,
            height: g.height,
        }),
    };
    ts.properties = raw.properties.into_iter().map(property_from_json).collect::<Result<_>>()?;

    for t in raw.tiles {
        let source = t.image.ok_or(Error::MissingImage(t.id))?;
        let width = t.imagewidth.ok_or(Error::MissingAttribute { element: "tile", attribute: "imagewidth" })?;
        let height = t.imageheight.ok_or(Error::MissingAttribute { element: "tile", attribute: "imageheight" })?;
        let mut tile = Tile::new(t.id, TileImage::new(source, width, height));
        tile.class = t.class;
        tile.probability = t.probability;
        tile.properties = t.properties.into_iter().map(property_from_json).collect::<Result<_>>()?;
        tile.animation = t
            .animation
            .into_iter()
            .map(|f| Frame { tile_id: f.tileid, duration: f.duration })
            .collect();
        ts.insert(tile)?;
    }

    ts.tile_count = raw.tilecount.unwrap_or(ts.len() as u32);
    Ok(ts)
}

/// Write `tileset` as JSON to `path`.
pub fn save(tileset: &Tileset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut json = to_json(tileset)?;
    json.push('\n');
    fs::write(path, json).map_err(|e| Error::io(path, e))
}

pub fn load(path: impl AsRef<Path>) -> Result<Tileset> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    from_json(&json)
}
