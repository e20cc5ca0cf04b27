//! `.tsx` output. Attributes holding their default are left out and children
//! are written in a fixed order, so a saved file loads back into an equal
//! [`Tileset`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::attrs::AttrWriter;
use crate::error::{Result, TsxError};
use crate::image::encode_image;
use crate::properties::encode_properties;
use crate::tile::encode_tile;
use crate::tileset::{Terrain, Tileset};
use crate::xml::{self, XmlElement};

/// Write `tileset` as a complete `.tsx` document.
///
/// A tileset with a `source` is written as a reference only: `firstgid` and
/// `source`, no content.
pub fn save_tileset_to_writer(tileset: &Tileset, writer: impl Write) -> Result<()> {
    xml::write(&encode_tileset(tileset), writer)
}

/// Create (or truncate) `path` and write `tileset` to it.
pub fn save_tileset_file(tileset: &Tileset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(TsxError::WriteFailure)?;
    tracing::debug!(path = %path.display(), tileset = %tileset.name, "saving tileset");
    save_tileset_to_writer(tileset, BufWriter::new(file))
}

fn encode_tileset(tileset: &Tileset) -> XmlElement {
    let mut root = XmlElement::new("tileset");
    let mut attrs = AttrWriter::on(&mut root);
    attrs
        .push_non_default("firstgid", tileset.first_gid, 0)
        .push_str("source", &tileset.source);
    if !tileset.source.is_empty() {
        return root;
    }

    attrs
        .push_str("name", &tileset.name)
        .push_str("class", &tileset.class)
        .push_str("version", &tileset.version)
        .push_str("tiledversion", &tileset.tiled_version)
        .push_non_default("tilewidth", tileset.tile_width, 0)
        .push_non_default("tileheight", tileset.tile_height, 0)
        .push_non_default("spacing", tileset.spacing, 0)
        .push_non_default("margin", tileset.margin, 0)
        .push_non_default("columns", tileset.columns, 0)
        .push_non_default("tilecount", tileset.tile_count, 0);

    if let Some(image) = &tileset.image {
        root.push_child(encode_image(image));
    }
    if let Some(offset) = tileset.tile_offset {
        let mut element = XmlElement::new("tileoffset");
        AttrWriter::on(&mut element)
            .push("x", offset.x)
            .push("y", offset.y);
        root.push_child(element);
    }
    if !tileset.terrain_types.is_empty() {
        let mut types = XmlElement::new("terraintypes");
        for terrain in &tileset.terrain_types {
            types.push_child(encode_terrain(terrain));
        }
        root.push_child(types);
    }
    if let Some(props) = encode_properties(&tileset.properties) {
        root.push_child(props);
    }
    for tile in tileset.tiles() {
        root.push_child(encode_tile(tile));
    }
    root
}

fn encode_terrain(terrain: &Terrain) -> XmlElement {
    let mut element = XmlElement::new("terrain");
    let tile = terrain.tile.map_or(-1, i64::from);
    AttrWriter::on(&mut element)
        .push("name", &terrain.name)
        .push("tile", tile);
    if let Some(props) = encode_properties(&terrain.properties) {
        element.push_child(props);
    }
    element
}
