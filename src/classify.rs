use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::geometry::{Cuboid, Tripoint};
use crate::tileset::Tileset;

// ── TileType ─────────────────────────────────────────────────────────────────

/// Gameplay kind of a tile. Angled variants come in sets of four, in the order
/// they are listed in the classification file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileType {
    #[default]
    None,
    Ground,
    Box,
    Wall,
    GroundAngled1,
    GroundAngled2,
    GroundAngled3,
    GroundAngled4,
    SideWall,
    SideWallAngled1,
    SideWallAngled2,
    SideWallAngled3,
    SideWallAngled4,
}

const GROUND_ANGLED: [TileType; 4] = [
    TileType::GroundAngled1,
    TileType::GroundAngled2,
    TileType::GroundAngled3,
    TileType::GroundAngled4,
];

const SIDE_WALL_ANGLED: [TileType; 4] = [
    TileType::SideWallAngled1,
    TileType::SideWallAngled2,
    TileType::SideWallAngled3,
    TileType::SideWallAngled4,
];

impl TileType {
    /// Kind named by a key of `predefinedBasicTiles`.
    pub fn from_basic_key(key: &str) -> Option<Self> {
        match key {
            "wall" => Some(TileType::Wall),
            "sideWall" => Some(TileType::SideWall),
            "ground" => Some(TileType::Ground),
            "box" => Some(TileType::Box),
            _ => None,
        }
    }

    /// The four variants named by a key of `predefinedAngledTiles`.
    pub fn angled_set(key: &str) -> Option<[Self; 4]> {
        match key {
            "angledSideWall" => Some(SIDE_WALL_ANGLED),
            "angledGround" => Some(GROUND_ANGLED),
            _ => None,
        }
    }

    /// Collision prism inside one unit cell, for the kinds that have one.
    ///
    /// x runs right, y up, z toward the viewer. Ground is a floor plate,
    /// a wall a back plate, a box fills the cell, and the first two angled
    /// ground pieces are the left and right halves of a slope.
    pub fn unit_bounds(self) -> Option<Cuboid> {
        let c = |a: (f32, f32, f32), b: (f32, f32, f32)| {
            Cuboid::new(Tripoint::new(a.0, a.1, a.2), Tripoint::new(b.0, b.1, b.2))
        };
        match self {
            TileType::Ground => Some(c((0.0, 0.0, 0.0), (1.0, 0.0, 1.0))),
            TileType::Wall => Some(c((0.0, 0.0, 0.0), (1.0, 1.0, 0.0))),
            TileType::Box => Some(c((0.0, 0.0, 0.0), (1.0, 1.0, 1.0))),
            TileType::GroundAngled1 => Some(c((0.0, 0.0, 1.0), (0.5, 0.0, 0.0))),
            TileType::GroundAngled2 => Some(c((0.5, 0.0, 1.0), (1.0, 0.0, 0.0))),
            _ => None,
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, TileType::Wall | TileType::SideWall) || SIDE_WALL_ANGLED.contains(&self)
    }

    pub fn is_ground(self) -> bool {
        self == TileType::Ground || GROUND_ANGLED.contains(&self)
    }
}

// ── CustomObject ─────────────────────────────────────────────────────────────

/// A multi-tile prop (a fan, a vent …) recognised by its top-left tile.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomObject {
    /// Key the object is listed under.
    pub name: String,
    /// Gameplay type; defaults to `name`.
    pub type_name: String,
    /// Tile ids row by row, top row first.
    pub tile_ids: Vec<Vec<u32>>,
    pub bounds: Cuboid,
}

impl CustomObject {
    pub fn top_left(&self) -> Option<u32> {
        self.tile_ids.first()?.first().copied()
    }

    /// `(columns, rows)` of the widest row and the number of rows.
    pub fn size(&self) -> (usize, usize) {
        let cols = self.tile_ids.iter().map(Vec::len).max().unwrap_or(0);
        (cols, self.tile_ids.len())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObject {
    #[serde(default)]
    tile_ids: Vec<Vec<u32>>,
    #[serde(default)]
    bounds: Cuboid,
    #[serde(rename = "type")]
    type_name: Option<String>,
}

// ── TileClassification ───────────────────────────────────────────────────────

/// Per-tileset gameplay config: tile kinds and custom objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileClassification {
    types: HashMap<u32, TileType>,
    objects: Vec<CustomObject>,
}

impl TileClassification {
    /// Parse the classification JSON.
    ///
    /// Sections are applied in file order and later assignments overwrite
    /// earlier ones. Unknown kinds and sections are logged and ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        let root: Map<String, Value> = serde_json::from_str(json)?;
        let mut cfg = Self::default();

        for (section, body) in root {
            match section.as_str() {
                "predefinedBasicTiles" => cfg.read_basic(body)?,
                "predefinedAngledTiles" => cfg.read_angled(body)?,
                "customTiles" => {}
                "customObjects" => cfg.read_objects(body)?,
                other => log::warn!("classify: ignoring unknown section '{other}'"),
            }
        }
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&json)
    }

    fn read_basic(&mut self, body: Value) -> Result<()> {
        let kinds: Map<String, Value> = serde_json::from_value(body)?;
        for (key, ids) in kinds {
            let Some(kind) = TileType::from_basic_key(&key) else {
                log::warn!("classify: unknown basic tile kind '{key}'");
                continue;
            };
            let ids: Vec<u32> = serde_json::from_value(ids)?;
            for id in ids {
                self.types.insert(id, kind);
            }
        }
        Ok(())
    }

    fn read_angled(&mut self, body: Value) -> Result<()> {
        let kinds: Map<String, Value> = serde_json::from_value(body)?;
        for (key, groups) in kinds {
            let Some(variants) = TileType::angled_set(&key) else {
                log::warn!("classify: unknown angled tile kind '{key}'");
                continue;
            };
            let groups: Vec<Vec<u32>> = serde_json::from_value(groups)?;
            for group in groups {
                // 0 marks a variant with no tile; anything past the fourth id is ignored.
                for (&id, &kind) in group.iter().zip(variants.iter()) {
                    if id != 0 {
                        self.types.insert(id, kind);
                    }
                }
            }
        }
        Ok(())
    }

    fn read_objects(&mut self, body: Value) -> Result<()> {
        let objects: Map<String, Value> = serde_json::from_value(body)?;
        for (name, raw) in objects {
            let raw: RawObject = serde_json::from_value(raw)?;
            if raw.tile_ids.first().is_none_or(Vec::is_empty) {
                log::warn!("classify: custom object '{name}' has no tile ids; dropped");
                continue;
            }
            self.objects.push(CustomObject {
                type_name: raw.type_name.unwrap_or_else(|| name.clone()),
                name,
                tile_ids: raw.tile_ids,
                bounds: raw.bounds,
            });
        }
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    /// Kind of tile `id`; [`TileType::None`] when it is not classified.
    pub fn tile_type(&self, id: u32) -> TileType {
        self.types.get(&id).copied().unwrap_or_default()
    }

    /// First custom object whose top-left tile is `top_left_id`.
    pub fn object_at(&self, top_left_id: u32) -> Option<&CustomObject> {
        self.objects.iter().find(|o| o.top_left() == Some(top_left_id))
    }

    pub fn objects(&self) -> &[CustomObject] {
        &self.objects
    }

    /// Classified ids in ascending order with their kinds.
    pub fn classified(&self) -> Vec<(u32, TileType)> {
        let mut all: Vec<_> = self.types.iter().map(|(&id, &t)| (id, t)).collect();
        all.sort_unstable_by_key(|&(id, _)| id);
        all
    }

    /// Ids mentioned by this config that `tileset` does not define.
    pub fn unknown_ids(&self, tileset: &Tileset) -> Vec<u32> {
        let object_ids = self.objects.iter().flat_map(|o| o.tile_ids.iter().flatten().copied());
        self.types
            .keys()
            .copied()
            .chain(object_ids)
            .filter(|id| !tileset.contains(*id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
