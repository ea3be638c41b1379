//! Reader and writer for the editor's XML tileset format (`.tsx`).
//!
//! Only image-collection tilesets are supported, i.e. every `<tile>` carries
//! its own `<image>`. The element and attribute names are owned by the editor
//! and are preserved exactly:
//!
//! ```text
//! <tileset version tiledversion name tilewidth tileheight tilecount columns fillmode>
//!  <grid orientation width height/>
//!  <tile id>
//!   <image source width height/>
//!  </tile>*
//! </tileset>
//! ```

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use xml::common::XmlVersion;
use xml::reader::{EventReader, ParserConfig, XmlEvent};
use xml::writer::{EmitterConfig, EventWriter, XmlEvent as WriteEvent};

use crate::error::{Error, Result};
use crate::tileset::{FillMode, Frame, Grid, Orientation, Property, PropertyType, Tile, TileImage, Tileset};

// ── Element tree ─────────────────────────────────────────────────────────────
//
// Tileset files are small, so the event stream is folded into a minimal
// element tree first and interpreted afterwards.

#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn required(&self, element: &'static str, attribute: &'static str) -> Result<&str> {
        self.attr(attribute).ok_or(Error::MissingAttribute { element, attribute })
    }

    fn parse<T: FromStr>(&self, element: &'static str, attribute: &'static str) -> Result<Option<T>> {
        match self.attr(attribute) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| Error::invalid(element, attribute, raw)),
        }
    }

    fn parse_required<T: FromStr>(&self, element: &'static str, attribute: &'static str) -> Result<T> {
        let raw = self.required(element, attribute)?;
        raw.trim().parse().map_err(|_| Error::invalid(element, attribute, raw))
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn build_tree<R: Read>(source: R) -> Result<Node> {
    let reader: EventReader<R> = ParserConfig::new()
        .trim_whitespace(false)
        .ignore_comments(true)
        .create_reader(source);

    let mut stack: Vec<Node> = Vec::new();
    for event in reader {
        match event? {
            XmlEvent::StartElement { name, attributes, .. } => {
                stack.push(Node {
                    name: name.local_name,
                    attrs: attributes
                        .into_iter()
                        .map(|a| (a.name.local_name, a.value))
                        .collect(),
                    ..Node::default()
                });
            }
            XmlEvent::EndElement { .. } => {
                let Some(done) = stack.pop() else { continue };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(done),
                    None => return Ok(done),
                }
            }
            // Whitespace-only text is reported separately; it matters for
            // property values such as "\n".
            XmlEvent::Characters(text) | XmlEvent::CData(text) | XmlEvent::Whitespace(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            _ => {}
        }
    }
    // The parser reports unbalanced documents itself; an empty one ends here.
    Err(Error::UnexpectedEnd("tileset"))
}

// ── Reading ──────────────────────────────────────────────────────────────────

/// Parse a tileset from TSX text.
pub fn from_str(text: &str) -> Result<Tileset> {
    from_reader(text.as_bytes())
}

/// Parse a tileset from any byte source.
pub fn from_reader<R: Read>(source: R) -> Result<Tileset> {
    let root = build_tree(source)?;
    if root.name != "tileset" {
        return Err(Error::UnexpectedRoot(root.name));
    }
    read_tileset(&root)
}

/// Read and parse a `.tsx` file.
pub fn load(path: impl AsRef<Path>) -> Result<Tileset> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    log::debug!("tsx: loading {}", path.display());
    from_str(&text)
}

fn read_tileset(node: &Node) -> Result<Tileset> {
    const EL: &str = "tileset";

    let mut ts = Tileset::new(node.required(EL, "name")?, 0, 0);
    ts.version = node.attr("version").map(str::to_string);
    ts.tiled_version = node.attr("tiledversion").map(str::to_string);
    ts.class = node.attr("class").map(str::to_string);
    ts.tile_width = node.parse_required(EL, "tilewidth")?;
    ts.tile_height = node.parse_required(EL, "tileheight")?;
    ts.spacing = node.parse(EL, "spacing")?.unwrap_or(0);
    ts.margin = node.parse(EL, "margin")?.unwrap_or(0);
    ts.columns = node.parse(EL, "columns")?.unwrap_or(0);
    ts.fill_mode = match node.attr("fillmode") {
        None => None,
        Some(raw) => Some(FillMode::from_str(raw).map_err(|_| Error::invalid(EL, "fillmode", raw))?),
    };
    ts.grid = None;

    for child in &node.children {
        match child.name.as_str() {
            "grid" => ts.grid = Some(read_grid(child)?),
            "properties" => ts.properties = read_properties(child)?,
            "tile" => {
                let tile = read_tile(child)?;
                ts.insert(tile)?;
            }
            "image" => {
                return Err(Error::Unsupported(
                    "single-image tilesets (only image collections are supported)".to_string(),
                ));
            }
            other => log::debug!("tsx: skipping <{other}> in <tileset>"),
        }
    }

    ts.tile_count = node.parse(EL, "tilecount")?.unwrap_or(ts.len() as u32);
    Ok(ts)
}

fn read_grid(node: &Node) -> Result<Grid> {
    const EL: &str = "grid";
    let orientation = match node.attr("orientation") {
        None => Orientation::Orthogonal,
        Some(raw) => Orientation::from_str(raw).map_err(|_| Error::invalid(EL, "orientation", raw))?,
    };
    Ok(Grid {
        orientation,
        width: node.parse_required(EL, "width")?,
        height: node.parse_required(EL, "height")?,
    })
}

fn read_tile(node: &Node) -> Result<Tile> {
    const EL: &str = "tile";
    let id: u32 = node.parse_required(EL, "id")?;

    let mut images = node.children_named("image");
    let image = images.next().ok_or(Error::MissingImage(id))?;
    if images.next().is_some() {
        return Err(Error::MultipleImages(id));
    }

    let mut tile = Tile::new(id, read_image(image)?);
    tile.class = node.attr("type").or_else(|| node.attr("class")).map(str::to_string);
    tile.probability = node.parse(EL, "probability")?;

    for child in &node.children {
        match child.name.as_str() {
            "image" => {}
            "properties" => tile.properties = read_properties(child)?,
            "animation" => tile.animation = read_animation(child)?,
            other => log::debug!("tsx: skipping <{other}> in tile {id}"),
        }
    }
    Ok(tile)
}

fn read_image(node: &Node) -> Result<TileImage> {
    const EL: &str = "image";
    Ok(TileImage {
        source: node.required(EL, "source")?.to_string(),
        width: node.parse_required(EL, "width")?,
        height: node.parse_required(EL, "height")?,
    })
}

fn read_properties(node: &Node) -> Result<Vec<Property>> {
    const EL: &str = "property";
    node.children_named("property")
        .map(|p| -> Result<Property> {
            let kind = match p.attr("type") {
                None => PropertyType::String,
                Some(raw) => PropertyType::from_str(raw).map_err(|_| Error::invalid(EL, "type", raw))?,
            };
            // Multi-line strings are stored as element text instead of `value`.
            let value = match p.attr("value") {
                Some(v) => v.to_string(),
                None => p.text.clone(),
            };
            Ok(Property { name: p.required(EL, "name")?.to_string(), kind, value })
        })
        .collect()
}

fn read_animation(node: &Node) -> Result<Vec<Frame>> {
    const EL: &str = "frame";
    node.children_named("frame")
        .map(|f| -> Result<Frame> {
            Ok(Frame {
                tile_id: f.parse_required(EL, "tileid")?,
                duration: f.parse_required(EL, "duration")?,
            })
        })
        .collect()
}

// ── Writing ──────────────────────────────────────────────────────────────────

/// Serialise `tileset` as TSX text, the way the editor lays it out.
pub fn to_string(tileset: &Tileset) -> Result<String> {
    let mut buf = Vec::new();
    write_to(tileset, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `tileset` to `path`, replacing any existing file.
pub fn save(tileset: &Tileset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = to_string(tileset)?;
    fs::write(path, text).map_err(|e| Error::io(path, e))
}

pub fn write_to<W: Write>(tileset: &Tileset, sink: W) -> Result<()> {
    let mut w = EmitterConfig::new()
        .perform_indent(true)
        .indent_string(" ")
        .create_writer(sink);

    w.write(WriteEvent::StartDocument {
        version: XmlVersion::Version10,
        encoding: Some("UTF-8"),
        standalone: None,
    })?;

    let mut attrs: Vec<(&str, String)> = Vec::new();
    if let Some(v) = &tileset.version {
        attrs.push(("version", v.clone()));
    }
    if let Some(v) = &tileset.tiled_version {
        attrs.push(("tiledversion", v.clone()));
    }
    attrs.push(("name", tileset.name.clone()));
    if let Some(class) = &tileset.class {
        attrs.push(("class", class.clone()));
    }
    attrs.push(("tilewidth", tileset.tile_width.to_string()));
    attrs.push(("tileheight", tileset.tile_height.to_string()));
    if tileset.spacing != 0 {
        attrs.push(("spacing", tileset.spacing.to_string()));
    }
    if tileset.margin != 0 {
        attrs.push(("margin", tileset.margin.to_string()));
    }
    attrs.push(("tilecount", tileset.tile_count.to_string()));
    attrs.push(("columns", tileset.columns.to_string()));
    if let Some(mode) = tileset.fill_mode {
        attrs.push(("fillmode", mode.as_str().to_string()));
    }
    start(&mut w, "tileset", &attrs)?;

    if let Some(grid) = &tileset.grid {
        start(
            &mut w,
            "grid",
            &[
                ("orientation", grid.orientation.as_str().to_string()),
                ("width", grid.width.to_string()),
                ("height", grid.height.to_string()),
            ],
        )?;
        end(&mut w)?;
    }

    write_properties(&mut w, &tileset.properties)?;

    for tile in tileset {
        write_tile(&mut w, tile)?;
    }

    end(&mut w)?;

    let mut sink = w.into_inner();
    sink.write_all(b"\n").map_err(|e| Error::XmlWrite(e.into()))?;
    Ok(())
}

fn write_tile<W: Write>(w: &mut EventWriter<W>, tile: &Tile) -> Result<()> {
    let mut attrs = vec![("id", tile.id.to_string())];
    if let Some(class) = &tile.class {
        attrs.push(("type", class.clone()));
    }
    if let Some(p) = tile.probability {
        attrs.push(("probability", p.to_string()));
    }
    start(w, "tile", &attrs)?;

    write_properties(w, &tile.properties)?;

    start(
        w,
        "image",
        &[
            ("source", tile.image.source.clone()),
            ("width", tile.image.width.to_string()),
            ("height", tile.image.height.to_string()),
        ],
    )?;
    end(w)?;

    if !tile.animation.is_empty() {
        start(w, "animation", &[])?;
        for frame in &tile.animation {
            start(
                w,
                "frame",
                &[("tileid", frame.tile_id.to_string()), ("duration", frame.duration.to_string())],
            )?;
            end(w)?;
        }
        end(w)?;
    }

    end(w)
}

fn write_properties<W: Write>(w: &mut EventWriter<W>, properties: &[Property]) -> Result<()> {
    if properties.is_empty() {
        return Ok(());
    }
    start(w, "properties", &[])?;
    for p in properties {
        let mut attrs = vec![("name", p.name.clone())];
        if p.kind != PropertyType::String {
            attrs.push(("type", p.kind.as_str().to_string()));
        }
        if p.value.contains('\n') {
            start(w, "property", &attrs)?;
            w.write(WriteEvent::characters(&p.value))?;
        } else {
            attrs.push(("value", p.value.clone()));
            start(w, "property", &attrs)?;
        }
        end(w)?;
    }
    end(w)
}

fn start<W: Write>(w: &mut EventWriter<W>, name: &str, attrs: &[(&str, String)]) -> Result<()> {
    let mut event = WriteEvent::start_element(name);
    for (key, value) in attrs {
        event = event.attr(*key, value.as_str());
    }
    w.write(event)?;
    Ok(())
}

fn end<W: Write>(w: &mut EventWriter<W>) -> Result<()> {
    w.write(WriteEvent::end_element())?;
    Ok(())
}
