// src/loader/json_loader.rs
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::color::Color;
use crate::error::{Result, TsxError};
use crate::image::Image;
use crate::loader::tsx_loader::read_document;
use crate::object::{DrawOrder, HAlign, Object, ObjectGroup, ObjectShape, Point, Text, VAlign, Visibility};
use crate::properties::{Properties, PropertyValue};
use crate::tile::{Frame, TileTerrain, TilesetTile};
use crate::tileset::{Terrain, TileOffset, Tileset};

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonTileset {
    name: String,
    class: String,
    // Older files write the format version as a number.
    version: JsonValue,
    tiledversion: String,
    tilewidth: u32,
    tileheight: u32,
    spacing: u32,
    margin: u32,
    tilecount: u32,
    columns: u32,
    image: String,
    imagewidth: u32,
    imageheight: u32,
    transparentcolor: Option<String>,
    tileoffset: Option<JsonOffset>,
    properties: Vec<JsonProperty>,
    terrains: Vec<JsonTerrain>,
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonOffset {
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    propertytype: String,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonTerrain {
    #[serde(default)]
    name: String,
    #[serde(default = "no_tile")]
    tile: i64,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

fn no_tile() -> i64 {
    -1
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    terrain: Option<Vec<i64>>,
    #[serde(default)]
    probability: f64,
    #[serde(default)]
    image: String,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
    #[serde(default)]
    animation: Vec<JsonFrame>,
    #[serde(default)]
    objectgroup: Option<JsonObjectGroup>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonFrame {
    tileid: u32,
    duration: u32,
}

#[derive(Deserialize)]
struct JsonObjectGroup {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default = "one")]
    opacity: f64,
    #[serde(default)]
    visible: Option<bool>,
    #[serde(default)]
    offsetx: f64,
    #[serde(default)]
    offsety: f64,
    #[serde(default)]
    draworder: Option<String>,
    #[serde(default)]
    objects: Vec<JsonObject>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

fn one() -> f64 {
    1.0
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    visible: Option<bool>,
    #[serde(default)]
    ellipse: bool,
    #[serde(default)]
    point: bool,
    #[serde(default)]
    polygon: Option<Vec<JsonObjectPoint>>,
    #[serde(default)]
    polyline: Option<Vec<JsonObjectPoint>>,
    #[serde(default)]
    text: Option<JsonText>,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonObjectPoint {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct JsonText {
    #[serde(default)]
    text: String,
    #[serde(default)]
    fontfamily: Option<String>,
    #[serde(default)]
    pixelsize: Option<u32>,
    #[serde(default)]
    wrap: bool,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    underline: bool,
    #[serde(default)]
    strikeout: bool,
    #[serde(default = "default_true")]
    kerning: bool,
    #[serde(default)]
    halign: Option<String>,
    #[serde(default)]
    valign: Option<String>,
}

fn default_true() -> bool {
    true
}

fn malformed(element: &str, attribute: &str, value: impl ToString, expected: &'static str) -> TsxError {
    TsxError::MalformedAttribute {
        element: element.to_owned(),
        attribute: attribute.to_owned(),
        value: value.to_string(),
        expected,
    }
}

// Untyped values: class members and properties written without a `type`.
fn infer_value(value: &JsonValue) -> Option<PropertyValue> {
    if let Some(v) = value.as_bool() {
        Some(PropertyValue::Bool(v))
    } else if let Some(v) = value.as_i64() {
        Some(PropertyValue::Int(v))
    } else if let Some(v) = value.as_f64() {
        Some(PropertyValue::Float(v))
    } else if let Some(s) = value.as_str() {
        Some(PropertyValue::String(s.to_owned()))
    } else {
        value.as_object().map(|members| PropertyValue::Class {
            property_type: String::new(),
            members: class_members(members),
        })
    }
}

fn class_members(members: &serde_json::Map<String, JsonValue>) -> Properties {
    members
        .iter()
        .filter_map(|(name, v)| infer_value(v).map(|v| (name.as_str(), v)))
        .collect()
}

fn json_property(prop: JsonProperty) -> Result<(String, PropertyValue)> {
    let JsonProperty {
        name,
        kind,
        propertytype,
        value,
    } = prop;

    let parsed = match kind.as_deref() {
        Some("bool") => value.as_bool().map(PropertyValue::Bool).ok_or("bool"),
        Some("int") => value.as_i64().map(PropertyValue::Int).ok_or("int"),
        Some("float") => value.as_f64().map(PropertyValue::Float).ok_or("float"),
        Some("string") => value
            .as_str()
            .map(|s| PropertyValue::String(s.to_owned()))
            .ok_or("string"),
        Some("class") => value
            .as_object()
            .map(|members| PropertyValue::Class {
                property_type: propertytype,
                members: class_members(members),
            })
            .ok_or("class members object"),
        Some(other) => Ok(PropertyValue::Other {
            kind: other.to_owned(),
            value: match &value {
                JsonValue::String(s) => s.clone(),
                v => v.to_string(),
            },
        }),
        None => infer_value(&value).ok_or("scalar value"),
    };

    match parsed {
        Ok(v) => Ok((name, v)),
        Err(expected) => Err(malformed("property", &name, &value, expected)),
    }
}

fn properties_from_json(props: Vec<JsonProperty>) -> Result<Properties> {
    let mut out = Properties::new();
    for p in props {
        let (name, value) = json_property(p)?;
        if out.insert(name.clone(), value).is_some() {
            tracing::warn!(property = %name, "duplicate property name, keeping the last one");
        }
    }
    Ok(out)
}

fn color_from_json(element: &str, attribute: &str, raw: &str) -> Result<Color> {
    raw.parse()
        .map_err(|_| malformed(element, attribute, raw, "color"))
}

fn visibility(visible: Option<bool>) -> Visibility {
    match visible {
        None => Visibility::Unspecified,
        Some(true) => Visibility::Visible,
        Some(false) => Visibility::Hidden,
    }
}

fn points(raw: Vec<JsonObjectPoint>) -> Vec<Point> {
    raw.into_iter().map(|p| Point { x: p.x, y: p.y }).collect()
}

fn text_from_json(text: JsonText) -> Result<Text> {
    let defaults = Text::default();
    Ok(Text {
        content: text.text,
        font_family: text.fontfamily.unwrap_or(defaults.font_family),
        pixel_size: text.pixelsize.unwrap_or(defaults.pixel_size),
        wrap: text.wrap,
        color: match text.color {
            Some(raw) => color_from_json("text", "color", &raw)?,
            None => defaults.color,
        },
        bold: text.bold,
        italic: text.italic,
        underline: text.underline,
        strikeout: text.strikeout,
        kerning: text.kerning,
        halign: match text.halign {
            Some(raw) => HAlign::from_keyword(&raw)
                .ok_or_else(|| malformed("text", "halign", &raw, "horizontal alignment"))?,
            None => defaults.halign,
        },
        valign: match text.valign {
            Some(raw) => VAlign::from_keyword(&raw)
                .ok_or_else(|| malformed("text", "valign", &raw, "vertical alignment"))?,
            None => defaults.valign,
        },
    })
}

fn object_from_json(obj: JsonObject) -> Result<Object> {
    let mut markers = Vec::new();
    if let Some(gid) = obj.gid {
        markers.push(ObjectShape::Tile { gid });
    }
    if obj.ellipse {
        markers.push(ObjectShape::Ellipse);
    }
    if obj.point {
        markers.push(ObjectShape::Point);
    }
    if let Some(polygon) = obj.polygon {
        markers.push(ObjectShape::Polygon(points(polygon)));
    }
    if let Some(polyline) = obj.polyline {
        markers.push(ObjectShape::Polyline(points(polyline)));
    }
    if let Some(text) = obj.text {
        markers.push(ObjectShape::Text(text_from_json(text)?));
    }

    let object_type = if !obj.class.is_empty() {
        obj.class
    } else {
        obj.kind
    };

    Ok(Object {
        id: obj.id,
        name: obj.name,
        object_type,
        x: obj.x,
        y: obj.y,
        width: obj.width,
        height: obj.height,
        rotation: obj.rotation,
        visible: visibility(obj.visible),
        shape: ObjectShape::from_markers(obj.id, markers)?,
        properties: properties_from_json(obj.properties)?,
    })
}

fn object_group_from_json(group: JsonObjectGroup) -> Result<ObjectGroup> {
    Ok(ObjectGroup {
        id: group.id,
        name: group.name,
        color: group
            .color
            .map(|raw| color_from_json("objectgroup", "color", &raw))
            .transpose()?,
        opacity: group.opacity,
        visible: visibility(group.visible),
        offset_x: group.offsetx,
        offset_y: group.offsety,
        draw_order: match group.draworder {
            Some(raw) => DrawOrder::from_keyword(&raw)
                .ok_or_else(|| malformed("objectgroup", "draworder", &raw, "draw order (topdown or index)"))?,
            None => DrawOrder::TopDown,
        },
        objects: group
            .objects
            .into_iter()
            .map(object_from_json)
            .collect::<Result<Vec<_>>>()?,
        properties: properties_from_json(group.properties)?,
    })
}

fn terrain_from_json(tile_id: u32, raw: Vec<i64>) -> Result<TileTerrain> {
    let bad = || malformed("tile", "terrain", format!("{raw:?} (tile {tile_id})"), "four terrain indices");
    let corners: [i64; 4] = raw.as_slice().try_into().map_err(|_| bad())?;
    let mut out = TileTerrain::default();
    for (slot, corner) in out.corners.iter_mut().zip(corners) {
        // -1 marks a corner without terrain.
        *slot = match corner {
            -1 => None,
            c => Some(u32::try_from(c).map_err(|_| bad())?),
        };
    }
    Ok(out)
}

fn tile_from_json(tile: JsonTile) -> Result<TilesetTile> {
    let image = (!tile.image.is_empty()).then(|| Image {
        source: tile.image,
        width: tile.imagewidth,
        height: tile.imageheight,
        ..Default::default()
    });
    Ok(TilesetTile {
        id: tile.id,
        tile_type: if !tile.class.is_empty() {
            tile.class
        } else {
            tile.kind
        },
        terrain: tile
            .terrain
            .map(|raw| terrain_from_json(tile.id, raw))
            .transpose()?,
        probability: tile.probability,
        animation: tile
            .animation
            .into_iter()
            .map(|f| Frame {
                tile_id: f.tileid,
                duration: f.duration,
            })
            .collect(),
        image,
        object_groups: tile
            .objectgroup
            .map(object_group_from_json)
            .transpose()?
            .into_iter()
            .collect(),
        properties: properties_from_json(tile.properties)?,
    })
}

pub(crate) fn decode_tileset_json(base_dir: &Path, content: &str) -> Result<Tileset> {
    let j: JsonTileset = serde_json::from_str(content)
        .map_err(|e| TsxError::malformed(format!("invalid JSON tileset: {e}")))?;

    let trans = j
        .transparentcolor
        .as_deref()
        .map(|raw| color_from_json("tileset", "transparentcolor", raw))
        .transpose()?;
    let image = (!j.image.is_empty()).then(|| Image {
        source: j.image,
        trans,
        width: j.imagewidth,
        height: j.imageheight,
        ..Default::default()
    });

    let mut terrain_types = Vec::with_capacity(j.terrains.len());
    for t in j.terrains {
        terrain_types.push(Terrain {
            name: t.name,
            tile: u32::try_from(t.tile).ok(),
            properties: properties_from_json(t.properties)?,
        });
    }

    let mut tileset = Tileset {
        name: j.name,
        class: j.class,
        version: match j.version {
            JsonValue::Null => String::new(),
            JsonValue::String(s) => s,
            other => other.to_string(),
        },
        tiled_version: j.tiledversion,
        tile_width: j.tilewidth,
        tile_height: j.tileheight,
        spacing: j.spacing,
        margin: j.margin,
        tile_count: j.tilecount,
        columns: j.columns,
        image,
        tile_offset: j.tileoffset.map(|o| TileOffset { x: o.x, y: o.y }),
        terrain_types,
        properties: properties_from_json(j.properties)?,
        ..Default::default()
    };
    tileset.set_base_dir(base_dir);

    for tile in j.tiles {
        let tile = tile_from_json(tile)?;
        let id = tile.id;
        if tileset.push_tile(tile).is_some() {
            tracing::warn!(tileset = %tileset.name, tile = id, "duplicate tile id, keeping the last one");
        }
    }
    tileset.source_loaded = true;
    Ok(tileset)
}

/// Decode a tileset in Tiled's JSON format (`.tsj`).
pub fn load_tileset_from_json(base_dir: impl AsRef<Path>, reader: impl Read) -> Result<Tileset> {
    let content = read_document(reader)?;
    decode_tileset_json(base_dir.as_ref(), &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: JsonValue) -> Result<Tileset> {
        decode_tileset_json(Path::new("sets"), &value.to_string())
    }

    #[test]
    fn decodes_grid_tileset_with_typed_properties() {
        let ts = decode(json!({
            "name": "base",
            "version": 1.2,
            "tiledversion": "1.10.2",
            "tilewidth": 32,
            "tileheight": 32,
            "tilecount": 6080,
            "columns": 64,
            "image": "base.png",
            "imagewidth": 2048,
            "imageheight": 3040,
            "transparentcolor": "#ff00ff",
            "tileoffset": {"x": 2, "y": -3},
            "properties": [
                {"name": "biome", "type": "string", "value": "forest"},
                {"name": "gravity", "type": "float", "value": 9.5},
                {"name": "level", "type": "int", "value": 3},
                {"name": "night", "type": "bool", "value": true},
                {"name": "tint", "type": "color", "value": "#ff112233"},
                {"name": "stats", "type": "class", "propertytype": "Stats",
                 "value": {"hp": 12, "label": "boss"}}
            ],
            "tiles": [{"id": 116, "type": "door"}]
        }))
        .unwrap();

        assert_eq!(ts.name, "base");
        assert_eq!(ts.version, "1.2");
        assert_eq!(ts.columns, 64);
        let image = ts.image.as_ref().unwrap();
        assert_eq!((image.width, image.height), (2048, 3040));
        assert_eq!(image.trans, Some(Color::rgb(255, 0, 255)));
        assert_eq!(ts.offset(), TileOffset { x: 2, y: -3 });
        assert_eq!(ts.properties.get_string("biome"), Some("forest"));
        assert_eq!(ts.properties.get_f64("gravity"), Some(9.5));
        assert_eq!(ts.properties.get_i64("level"), Some(3));
        assert_eq!(ts.properties.get_bool("night"), Some(true));
        assert_eq!(
            ts.properties.get("tint"),
            Some(&PropertyValue::Other {
                kind: "color".into(),
                value: "#ff112233".into()
            })
        );
        match ts.properties.get("stats") {
            Some(PropertyValue::Class {
                property_type,
                members,
            }) => {
                assert_eq!(property_type, "Stats");
                assert_eq!(members.get_i64("hp"), Some(12));
                assert_eq!(members.get_string("label"), Some("boss"));
            }
            other => panic!("expected class value, got {other:?}"),
        }
        assert_eq!(ts.tile(116).map(|t| t.tile_type.as_str()), Some("door"));
        assert!(ts.is_source_loaded());
    }

    #[test]
    fn decodes_tile_details() {
        let ts = decode(json!({
            "name": "detail",
            "terrains": [{"name": "Grass", "tile": 4}, {"name": "Sand"}],
            "tiles": [{
                "id": 464,
                "class": "torch",
                "terrain": [0, 0, -1, 1],
                "probability": 0.25,
                "animation": [
                    {"tileid": 75, "duration": 500},
                    {"tileid": 76, "duration": 500}
                ],
                "objectgroup": {
                    "draworder": "index",
                    "objects": [
                        {"id": 1, "x": -0.25, "y": 17.75, "width": 32.375, "height": 6.125},
                        {"id": 2, "ellipse": true, "visible": false},
                        {"id": 3, "polygon": [{"x": 0, "y": 0}, {"x": 4, "y": 0}, {"x": 4, "y": 4}]},
                        {"id": 4, "text": {"text": "hi", "bold": true, "halign": "center"}}
                    ]
                }
            }]
        }))
        .unwrap();

        assert_eq!(ts.terrain_types[0].tile, Some(4));
        assert_eq!(ts.terrain_types[1].tile, None);
        let tile = ts.tile(464).unwrap();
        assert_eq!(tile.tile_type, "torch");
        assert_eq!(tile.terrain.unwrap().corners, [Some(0), Some(0), None, Some(1)]);
        assert_eq!(tile.probability, 0.25);
        assert_eq!(tile.animation.len(), 2);
        assert_eq!(tile.animation[1], Frame { tile_id: 76, duration: 500 });

        let group = &tile.object_groups[0];
        assert_eq!(group.draw_order, DrawOrder::Index);
        assert_eq!(group.opacity, 1.0);
        let rect = &group.objects[0];
        assert_eq!(rect.shape, ObjectShape::Rectangle);
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (-0.25, 17.75, 32.375, 6.125));
        assert_eq!(group.objects[1].shape, ObjectShape::Ellipse);
        assert_eq!(group.objects[1].visible, Visibility::Hidden);
        match &group.objects[2].shape {
            ObjectShape::Polygon(points) => assert_eq!(points.len(), 3),
            other => panic!("expected polygon, got {other:?}"),
        }
        match &group.objects[3].shape {
            ObjectShape::Text(text) => {
                assert_eq!(text.content, "hi");
                assert!(text.bold);
                assert!(text.kerning);
                assert_eq!(text.halign, HAlign::Center);
                assert_eq!(text.pixel_size, 16);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn conflicting_shapes_are_ambiguous() {
        let err = decode(json!({
            "tiles": [{"id": 0, "objectgroup": {"objects": [{"id": 9, "point": true, "gid": 3}]}}]
        }))
        .unwrap_err();
        match err {
            TsxError::AmbiguousObjectShape { object_id, markers } => {
                assert_eq!(object_id, 9);
                assert_eq!(markers, ["gid", "point"]);
            }
            other => panic!("expected AmbiguousObjectShape, got {other:?}"),
        }
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(matches!(
            decode_tileset_json(Path::new(""), "{ not json"),
            Err(TsxError::MalformedDocument { .. })
        ));
        assert!(matches!(
            decode(json!({"tiles": [{"id": 0, "terrain": [0, 1]}]})),
            Err(TsxError::MalformedAttribute { .. })
        ));
        assert!(matches!(
            decode(json!({"properties": [{"name": "n", "type": "int", "value": "three"}]})),
            Err(TsxError::MalformedAttribute { .. })
        ));
    }

    #[test]
    fn loads_from_reader() {
        let ts = load_tileset_from_json("sets", &br#"{"name":"r","tilewidth":8,"tileheight":8}"#[..]).unwrap();
        assert_eq!(ts.name, "r");
        assert_eq!(ts.base_dir(), Path::new("sets"));
    }

    #[test]
    fn non_utf8_json_is_malformed() {
        let err = load_tileset_from_json("sets", &b"{\"name\":\"\xff\"}"[..]).unwrap_err();
        assert!(matches!(err, TsxError::MalformedDocument { .. }));
    }
}
