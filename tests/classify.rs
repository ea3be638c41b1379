use robotropolis_tiles::classify::{TileClassification, TileType};
use robotropolis_tiles::geometry::{Cuboid, Tripoint};
use robotropolis_tiles::{robotropolis, Error};

const SAMPLE: &str = r#"{
  "predefinedBasicTiles": {
    "wall": [0, 1, 3, 9],
    "sideWall": [17],
    "ground": [20, 21, 7],
    "box": [13, 22]
  },
  "predefinedAngledTiles": {
    "angledGround": [[4, 5, 0, 12]],
    "angledSideWall": [[18, 19]]
  },
  "customTiles": { "anything": [1, 2, 3] },
  "customObjects": {
    "fan": {
      "tileIds": [[14, 15]],
      "bounds": { "p1": { "x": 0, "y": 0, "z": 0 }, "p2": { "x": 4, "y": 6, "z": 1 } }
    },
    "vent": {
      "tileIds": [[29], [26]],
      "type": "machine"
    }
  }
}"#;

// ── Tile kinds ────────────────────────────────────────────────────────────────

#[test]
fn test_basic_kinds() {
    let c = TileClassification::from_json(SAMPLE).unwrap();
    assert_eq!(c.tile_type(0), TileType::Wall);
    assert_eq!(c.tile_type(9), TileType::Wall);
    assert_eq!(c.tile_type(17), TileType::SideWall);
    assert_eq!(c.tile_type(7), TileType::Ground);
    assert_eq!(c.tile_type(22), TileType::Box);
}

#[test]
fn test_unclassified_ids_are_none() {
    let c = TileClassification::from_json(SAMPLE).unwrap();
    assert_eq!(c.tile_type(16), TileType::None);
    assert_eq!(c.tile_type(1000), TileType::None);
}

#[test]
fn test_angled_groups_assign_variants_in_order() {
    let c = TileClassification::from_json(SAMPLE).unwrap();
    assert_eq!(c.tile_type(4), TileType::GroundAngled1);
    assert_eq!(c.tile_type(5), TileType::GroundAngled2);
    assert_eq!(c.tile_type(12), TileType::GroundAngled4);
    assert_eq!(c.tile_type(18), TileType::SideWallAngled1);
    assert_eq!(c.tile_type(19), TileType::SideWallAngled2);
}

#[test]
fn test_zero_is_a_placeholder() {
    let c = TileClassification::from_json(SAMPLE).unwrap();
    assert_eq!(c.tile_type(0), TileType::Wall, "0 in an angled group must not reclassify tile 0");
}

#[test]
fn test_ids_past_the_fourth_are_ignored() {
    let c = TileClassification::from_json(r#"{ "predefinedAngledTiles": { "angledGround": [[1, 2, 3, 4, 5]] } }"#)
        .unwrap();
    assert_eq!(c.tile_type(4), TileType::GroundAngled4);
    assert_eq!(c.tile_type(5), TileType::None);
}

#[test]
fn test_later_sections_overwrite_earlier_ones() {
    let json = r#"{
      "predefinedAngledTiles": { "angledGround": [[4]] },
      "predefinedBasicTiles": { "box": [4] }
    }"#;
    assert_eq!(TileClassification::from_json(json).unwrap().tile_type(4), TileType::Box);

    let json = r#"{
      "predefinedBasicTiles": { "box": [4] },
      "predefinedAngledTiles": { "angledGround": [[4]] }
    }"#;
    assert_eq!(TileClassification::from_json(json).unwrap().tile_type(4), TileType::GroundAngled1);
}

#[test]
fn test_unknown_kinds_and_sections_are_ignored() {
    let json = r#"{
      "predefinedBasicTiles": { "lava": [1], "wall": [2] },
      "predefinedAngledTiles": { "angledCeiling": [[3, 4, 5, 6]] },
      "spawnPoints": [1, 2]
    }"#;
    let c = TileClassification::from_json(json).unwrap();
    assert_eq!(c.classified(), vec![(2, TileType::Wall)]);
}

#[test]
fn test_classified_is_sorted_by_id() {
    let c = TileClassification::from_json(SAMPLE).unwrap();
    let ids: Vec<u32> = c.classified().into_iter().map(|(id, _)| id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    assert_eq!(ids.len(), 15);
}

// ── Custom objects ────────────────────────────────────────────────────────────

#[test]
fn test_custom_objects() {
    let c = TileClassification::from_json(SAMPLE).unwrap();
    assert_eq!(c.objects().len(), 2);

    let fan = c.object_at(14).unwrap();
    assert_eq!(fan.name, "fan");
    assert_eq!(fan.type_name, "fan", "type defaults to the object name");
    assert_eq!(fan.size(), (2, 1));
    assert_eq!(fan.bounds.size(), Tripoint::new(4.0, 6.0, 1.0));

    let vent = c.object_at(29).unwrap();
    assert_eq!(vent.type_name, "machine");
    assert_eq!(vent.size(), (1, 2));
    assert_eq!(vent.bounds, Cuboid::default());
}

#[test]
fn test_object_at_matches_only_the_top_left_tile() {
    let c = TileClassification::from_json(SAMPLE).unwrap();
    assert!(c.object_at(15).is_none());
    assert!(c.object_at(26).is_none());
}

#[test]
fn test_missing_bound_coordinates_default_to_zero() {
    let json = r#"{ "customObjects": { "crate": { "tileIds": [[13]], "bounds": { "p2": { "x": 2 } } } } }"#;
    let c = TileClassification::from_json(json).unwrap();
    let bounds = c.object_at(13).unwrap().bounds;
    assert_eq!(bounds.p1, Tripoint::default());
    assert_eq!(bounds.p2, Tripoint::new(2.0, 0.0, 0.0));
}

#[test]
fn test_objects_without_tiles_are_dropped() {
    let json = r#"{ "customObjects": { "ghost": { "tileIds": [] }, "blank": { "tileIds": [[]] }, "rock": { "tileIds": [[23]] } } }"#;
    let c = TileClassification::from_json(json).unwrap();
    let names: Vec<&str> = c.objects().iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["rock"]);
}

// ── Against the tileset ───────────────────────────────────────────────────────

#[test]
fn test_sample_ids_all_exist_in_robotropolis() {
    let c = TileClassification::from_json(SAMPLE).unwrap();
    assert!(c.unknown_ids(&robotropolis().unwrap()).is_empty());
}

#[test]
fn test_unknown_ids_are_sorted_and_unique() {
    let json = r#"{
      "predefinedBasicTiles": { "wall": [28, 2, 0] },
      "customObjects": { "big": { "tileIds": [[2, 27], [11, 28]] } }
    }"#;
    let c = TileClassification::from_json(json).unwrap();
    assert_eq!(c.unknown_ids(&robotropolis().unwrap()), vec![2, 11, 27, 28]);
}

// ── Loading ───────────────────────────────────────────────────────────────────

#[test]
fn test_empty_object_is_an_empty_classification() {
    let c = TileClassification::from_json("{}").unwrap();
    assert!(c.classified().is_empty());
    assert!(c.objects().is_empty());
}

#[test]
fn test_non_object_document_is_an_error() {
    assert!(matches!(TileClassification::from_json("[1, 2]"), Err(Error::Json(_))));
    assert!(matches!(TileClassification::from_json("not json"), Err(Error::Json(_))));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("robotropolis.json");
    std::fs::write(&path, SAMPLE).unwrap();
    let c = TileClassification::load(&path).unwrap();
    assert_eq!(c.tile_type(13), TileType::Box);
    assert!(matches!(TileClassification::load(dir.path().join("missing.json")), Err(Error::Io { .. })));
}

// ── Unit prisms ───────────────────────────────────────────────────────────────

#[test]
fn test_unit_prisms_of_the_basic_kinds() {
    let ground = TileType::Ground.unit_bounds().unwrap();
    assert_eq!(ground.size(), Tripoint::new(1.0, 0.0, 1.0));
    assert!(ground.is_flat());

    let wall = TileType::Wall.unit_bounds().unwrap();
    assert_eq!(wall.size(), Tripoint::new(1.0, 1.0, 0.0));

    let cube = TileType::Box.unit_bounds().unwrap();
    assert!(cube.contains(Tripoint::new(0.5, 0.5, 0.5)));
    assert!(!cube.is_flat());

    let left = TileType::GroundAngled1.unit_bounds().unwrap();
    let right = TileType::GroundAngled2.unit_bounds().unwrap();
    assert_eq!(left.max().x, right.min().x);
    assert!(left.contains(Tripoint::new(0.25, 0.0, 0.5)));
    assert!(!left.contains(Tripoint::new(0.75, 0.0, 0.5)));
}
