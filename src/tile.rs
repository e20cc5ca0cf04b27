use std::fmt;
use std::str::FromStr;

use crate::attrs::{AttrWriter, Attrs};
use crate::error::{Result, TsxError};
use crate::image::{decode_image, encode_image, Image};
use crate::object::{decode_object_group, encode_object_group, ObjectGroup};
use crate::properties::{decode_properties, encode_properties, Properties};
use crate::xml::XmlElement;

/// One step of a tile animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Local ID of the tile shown during this frame.
    pub tile_id: u32,
    /// How long the frame lasts, in milliseconds.
    pub duration: u32,
}

/// Terrain membership of a tile's four corners.
///
/// Each corner holds an index into [`Tileset::terrain_types`](crate::Tileset::terrain_types),
/// in the order top-left, top-right, bottom-left, bottom-right. Written as
/// `"0,0,,1"`, an empty field meaning no terrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileTerrain {
    /// Corner terrain indices.
    pub corners: [Option<u32>; 4],
}

impl TileTerrain {
    /// Terrain of the top-left corner.
    pub fn top_left(&self) -> Option<u32> {
        self.corners[0]
    }

    /// Terrain of the top-right corner.
    pub fn top_right(&self) -> Option<u32> {
        self.corners[1]
    }

    /// Terrain of the bottom-left corner.
    pub fn bottom_left(&self) -> Option<u32> {
        self.corners[2]
    }

    /// Terrain of the bottom-right corner.
    pub fn bottom_right(&self) -> Option<u32> {
        self.corners[3]
    }
}

impl FromStr for TileTerrain {
    type Err = TsxError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || TsxError::MalformedAttribute {
            element: "tile".to_owned(),
            attribute: "terrain".to_owned(),
            value: s.to_owned(),
            expected: "four comma separated terrain indices",
        };
        let fields: Vec<&str> = s.split(',').collect();
        if fields.len() != 4 {
            return Err(malformed());
        }
        let mut corners = [None; 4];
        for (corner, field) in corners.iter_mut().zip(fields) {
            let field = field.trim();
            if !field.is_empty() {
                *corner = Some(field.parse().map_err(|_| malformed())?);
            }
        }
        Ok(TileTerrain { corners })
    }
}

impl fmt::Display for TileTerrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, corner) in self.corners.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if let Some(index) = corner {
                write!(f, "{index}")?;
            }
        }
        Ok(())
    }
}

/// Per-tile overrides. Tiles without any are simply not listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilesetTile {
    /// Zero-based local tile index.
    pub id: u32,
    /// Free-form class tag (`type`, or `class` in newer documents).
    pub tile_type: String,
    /// Corner terrains.
    pub terrain: Option<TileTerrain>,
    /// Relative weight for random tile selection; 0 means unweighted.
    pub probability: f64,
    /// Animation frames, empty when the tile is static.
    pub animation: Vec<Frame>,
    /// Own image, for image-collection tilesets.
    pub image: Option<Image>,
    /// Collision or marker geometry.
    pub object_groups: Vec<ObjectGroup>,
    /// Custom properties.
    pub properties: Properties,
}

pub(crate) fn decode_tile(element: &XmlElement) -> Result<TilesetTile> {
    let attrs = Attrs::of(element);
    let id = attrs
        .parse_opt("id")?
        .ok_or_else(|| attrs.malformed("id", "", "tile id"))?;
    let terrain = match attrs.str("terrain") {
        Some(raw) => Some(raw.parse()?),
        None => None,
    };

    let mut tile = TilesetTile {
        id,
        tile_type: attrs.str("type").or(attrs.str("class")).unwrap_or_default().to_owned(),
        terrain,
        probability: attrs.parse_or("probability", 0.0)?,
        ..Default::default()
    };
    tracing::trace!(tile = id, "decoding tile");

    for child in &element.children {
        match child.name.as_str() {
            "animation" => {
                for frame in child.children_named("frame") {
                    let a = Attrs::of(frame);
                    tile.animation.push(Frame {
                        tile_id: a.parse_or("tileid", 0)?,
                        duration: a.parse_or("duration", 0)?,
                    });
                }
            }
            "image" => tile.image = Some(decode_image(child)?),
            "objectgroup" => tile.object_groups.push(decode_object_group(child)?),
            "properties" => decode_properties(child, &mut tile.properties)?,
            other => tracing::debug!(tile = id, element = other, "skipping unknown <tile> child"),
        }
    }
    Ok(tile)
}

pub(crate) fn encode_tile(tile: &TilesetTile) -> XmlElement {
    let mut element = XmlElement::new("tile");
    let mut attrs = AttrWriter::on(&mut element);
    attrs.push("id", tile.id).push_str("type", &tile.tile_type);
    if let Some(terrain) = &tile.terrain {
        attrs.push("terrain", terrain);
    }
    attrs.push_non_default("probability", tile.probability, 0.0);

    if !tile.animation.is_empty() {
        let mut animation = XmlElement::new("animation");
        for frame in &tile.animation {
            let mut child = XmlElement::new("frame");
            AttrWriter::on(&mut child)
                .push("tileid", frame.tile_id)
                .push("duration", frame.duration);
            animation.push_child(child);
        }
        element.push_child(animation);
    }
    if let Some(image) = &tile.image {
        element.push_child(encode_image(image));
    }
    for group in &tile.object_groups {
        element.push_child(encode_object_group(group));
    }
    if let Some(props) = encode_properties(&tile.properties) {
        element.push_child(props);
    }
    element
}
