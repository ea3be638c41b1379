use robotropolis_tiles::tileset::{FillMode, Frame, Orientation, Property, PropertyType};
use robotropolis_tiles::{robotropolis, tsx, Error, Tile, TileImage, Tileset};

fn wrap(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" tiledversion="1.11.1" name="t" tilewidth="16" tileheight="16" tilecount="1" columns="0">
{body}
</tileset>
"#
    )
}

const ONE_TILE: &str = r#" <tile id="0">
  <image source="a.png" width="16" height="16"/>
 </tile>"#;

// ── Round trips ───────────────────────────────────────────────────────────────

#[test]
fn test_robotropolis_round_trips() {
    let ts = robotropolis().unwrap();
    let text = tsx::to_string(&ts).unwrap();
    let back = tsx::from_str(&text).unwrap();
    assert_eq!(back, ts);
}

#[test]
fn test_writer_output_keeps_the_editor_layout() {
    let text = tsx::to_string(&robotropolis().unwrap()).unwrap();
    assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#), "{text}");
    assert!(text.contains(
        r#"<tileset version="1.10" tiledversion="1.11.1" name="robotropolis" tilewidth="80" tileheight="160" tilecount="26" columns="0" fillmode="preserve-aspect-fit">"#
    ));
    assert!(text.contains(r#"<grid orientation="orthogonal" width="16" height="16""#));
    assert!(text.contains(r#"<image source="../sprites/robotropolis/vent.png" width="64" height="160""#));
    assert!(text.contains("\n <tile id=\"29\">"), "one-space indentation");
    assert!(text.ends_with("</tileset>\n"));
    assert!(!text.contains("spacing="));
    assert!(!text.contains("margin="));
}

#[test]
fn test_tile_extras_round_trip() {
    let mut ts = Tileset::new("extras", 16, 16);
    ts.spacing = 2;
    ts.margin = 1;
    ts.class = Some("props".into());
    ts.properties.push(Property::new("biome", PropertyType::String, "city"));

    let mut fan = Tile::new(3, TileImage::new("fan.png", 64, 96));
    fan.class = Some("machine".into());
    fan.probability = Some(0.5);
    fan.properties.push(Property::new("solid", PropertyType::Bool, "true"));
    fan.properties.push(Property::new("note", PropertyType::String, "spins\nslowly"));
    fan.animation = vec![Frame { tile_id: 3, duration: 100 }, Frame { tile_id: 4, duration: 120 }];
    ts.insert(fan).unwrap();
    ts.insert(Tile::new(4, TileImage::new("fan_right.png", 64, 96))).unwrap();
    ts.refresh_metadata();

    let text = tsx::to_string(&ts).unwrap();
    assert!(text.contains(r#"spacing="2""#));
    assert!(text.contains(r#"margin="1""#));
    let back = tsx::from_str(&text).unwrap();
    assert_eq!(back, ts);
    assert_eq!(back.get(3).unwrap().property("note").unwrap().value, "spins\nslowly");
}

#[test]
fn test_whitespace_only_property_round_trips() {
    let mut ts = Tileset::new("ws", 16, 16);
    let mut tile = Tile::new(0, TileImage::new("a.png", 16, 16));
    tile.properties.push(Property::new("newline", PropertyType::String, "\n"));
    tile.properties.push(Property::new("gap", PropertyType::String, " \n  "));
    ts.insert(tile).unwrap();
    ts.refresh_metadata();

    let back = tsx::from_str(&tsx::to_string(&ts).unwrap()).unwrap();
    assert_eq!(back.get(0).unwrap().property("newline").unwrap().value, "\n");
    assert_eq!(back.get(0).unwrap().property("gap").unwrap().value, " \n  ");
    assert_eq!(back, ts);
}

#[test]
fn test_highest_possible_id_is_readable() {
    let ts = tsx::from_str(&wrap(
        r#" <tile id="4294967295"><image source="a.png" width="16" height="16"/></tile>"#,
    ))
    .unwrap();
    assert!(ts.contains(u32::MAX));
    assert_eq!(ts.next_free_id(), None);
    assert_eq!(ts.missing_ids().take(2).collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("robotropolis.tsx");
    let ts = robotropolis().unwrap();
    tsx::save(&ts, &path).unwrap();
    assert_eq!(tsx::load(&path).unwrap(), ts);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = tsx::load(dir.path().join("nope.tsx")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err:?}");
}

// ── Optional content ──────────────────────────────────────────────────────────

#[test]
fn test_reads_properties_and_animation() {
    let text = wrap(
        r#" <properties>
  <property name="level" type="int" value="3"/>
 </properties>
 <tile id="0" type="wall" probability="0.25">
  <properties>
   <property name="solid" type="bool" value="true"/>
   <property name="desc">first line
second line</property>
  </properties>
  <image source="a.png" width="16" height="16"/>
  <animation>
   <frame tileid="0" duration="100"/>
  </animation>
 </tile>"#,
    );
    let ts = tsx::from_str(&text).unwrap();
    assert_eq!(ts.property("level").and_then(Property::as_int), Some(3));

    let tile = ts.get(0).unwrap();
    assert_eq!(tile.class.as_deref(), Some("wall"));
    assert_eq!(tile.probability, Some(0.25));
    assert_eq!(tile.property("solid").and_then(Property::as_bool), Some(true));
    assert_eq!(tile.property("desc").unwrap().value, "first line\nsecond line");
    assert_eq!(tile.animation, vec![Frame { tile_id: 0, duration: 100 }]);
}

#[test]
fn test_class_attribute_is_accepted_for_tiles() {
    let text = wrap(
        r#" <tile id="0" class="ground">
  <image source="a.png" width="16" height="16"/>
 </tile>"#,
    );
    let ts = tsx::from_str(&text).unwrap();
    assert_eq!(ts.get(0).unwrap().class.as_deref(), Some("ground"));
}

#[test]
fn test_unknown_elements_and_attributes_are_skipped() {
    let text = wrap(
        r#" <transformations hflip="1" vflip="0" rotate="0" preferuntransformed="0"/>
 <wangsets>
  <wangset name="x" type="corner" tile="-1"/>
 </wangsets>
 <tile id="0" extra="yes">
  <image source="a.png" width="16" height="16" trans="ff00ff"/>
  <objectgroup draworder="index"/>
 </tile>"#,
    );
    let ts = tsx::from_str(&text).unwrap();
    assert_eq!(ts.len(), 1);
    assert_eq!(ts.get(0).unwrap().image.source, "a.png");
}

#[test]
fn test_defaults_for_optional_tileset_attributes() {
    let text = r#"<tileset name="bare" tilewidth="16" tileheight="16">
 <tile id="5"><image source="a.png" width="16" height="16"/></tile>
</tileset>"#;
    let ts = tsx::from_str(text).unwrap();
    assert_eq!(ts.version, None);
    assert_eq!(ts.tile_count, 1);
    assert_eq!(ts.columns, 0);
    assert_eq!((ts.spacing, ts.margin), (0, 0));
    assert_eq!(ts.fill_mode, None);
    assert_eq!(ts.grid, None);
}

#[test]
fn test_isometric_grid_and_stretch_fill() {
    let text = r#"<tileset name="iso" tilewidth="32" tileheight="16" fillmode="stretch">
 <grid orientation="isometric" width="32" height="16"/>
</tileset>"#;
    let ts = tsx::from_str(text).unwrap();
    assert_eq!(ts.grid.unwrap().orientation, Orientation::Isometric);
    assert_eq!(ts.fill_mode, Some(FillMode::Stretch));
    assert!(ts.is_empty());
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[test]
fn test_wrong_root_element() {
    let err = tsx::from_str(r#"<map version="1.10"/>"#).unwrap_err();
    assert!(matches!(err, Error::UnexpectedRoot(ref name) if name == "map"), "{err:?}");
}

#[test]
fn test_missing_name() {
    let err = tsx::from_str(r#"<tileset tilewidth="16" tileheight="16"/>"#).unwrap_err();
    assert!(
        matches!(err, Error::MissingAttribute { element: "tileset", attribute: "name" }),
        "{err:?}"
    );
}

#[test]
fn test_bad_number() {
    let err = tsx::from_str(r#"<tileset name="t" tilewidth="wide" tileheight="16"/>"#).unwrap_err();
    match err {
        Error::InvalidAttribute { element, attribute, value } => {
            assert_eq!((element, attribute, value.as_str()), ("tileset", "tilewidth", "wide"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_negative_id() {
    let err = tsx::from_str(&wrap(
        r#" <tile id="-1"><image source="a.png" width="16" height="16"/></tile>"#,
    ))
    .unwrap_err();
    assert!(matches!(err, Error::InvalidAttribute { element: "tile", attribute: "id", .. }), "{err:?}");
}

#[test]
fn test_missing_id() {
    let err = tsx::from_str(&wrap(r#" <tile><image source="a.png" width="16" height="16"/></tile>"#)).unwrap_err();
    assert!(matches!(err, Error::MissingAttribute { element: "tile", attribute: "id" }), "{err:?}");
}

#[test]
fn test_duplicate_id() {
    let err = tsx::from_str(&wrap(&format!("{ONE_TILE}\n{ONE_TILE}"))).unwrap_err();
    assert!(matches!(err, Error::DuplicateTileId(0)), "{err:?}");
}

#[test]
fn test_tile_without_image() {
    let err = tsx::from_str(&wrap(r#" <tile id="4"/>"#)).unwrap_err();
    assert!(matches!(err, Error::MissingImage(4)), "{err:?}");
}

#[test]
fn test_tile_with_two_images() {
    let err = tsx::from_str(&wrap(
        r#" <tile id="4">
  <image source="a.png" width="16" height="16"/>
  <image source="b.png" width="16" height="16"/>
 </tile>"#,
    ))
    .unwrap_err();
    assert!(matches!(err, Error::MultipleImages(4)), "{err:?}");
}

#[test]
fn test_image_without_size() {
    let err = tsx::from_str(&wrap(r#" <tile id="0"><image source="a.png" width="16"/></tile>"#)).unwrap_err();
    assert!(
        matches!(err, Error::MissingAttribute { element: "image", attribute: "height" }),
        "{err:?}"
    );
}

#[test]
fn test_atlas_tileset_is_unsupported() {
    let text = r#"<tileset name="atlas" tilewidth="16" tileheight="16" tilecount="4" columns="2">
 <image source="atlas.png" width="32" height="32"/>
</tileset>"#;
    assert!(matches!(tsx::from_str(text), Err(Error::Unsupported(_))));
}

#[test]
fn test_unknown_orientation() {
    let text = r#"<tileset name="t" tilewidth="16" tileheight="16">
 <grid orientation="hexagonal" width="16" height="16"/>
</tileset>"#;
    let err = tsx::from_str(text).unwrap_err();
    assert!(
        matches!(err, Error::InvalidAttribute { element: "grid", attribute: "orientation", .. }),
        "{err:?}"
    );
}

#[test]
fn test_unknown_fill_mode() {
    let text = r#"<tileset name="t" tilewidth="16" tileheight="16" fillmode="tile"/>"#;
    let err = tsx::from_str(text).unwrap_err();
    assert!(
        matches!(err, Error::InvalidAttribute { element: "tileset", attribute: "fillmode", .. }),
        "{err:?}"
    );
}

#[test]
fn test_unknown_property_type() {
    let err = tsx::from_str(&wrap(
        r#" <properties><property name="p" type="vector" value="1,2"/></properties>"#,
    ))
    .unwrap_err();
    assert!(matches!(err, Error::InvalidAttribute { element: "property", attribute: "type", .. }), "{err:?}");
}

#[test]
fn test_malformed_xml() {
    let err = tsx::from_str(r#"<tileset name="t" tilewidth="16" tileheight="16"><tile id="0">"#).unwrap_err();
    assert!(matches!(err, Error::Xml(_)), "{err:?}");
}
