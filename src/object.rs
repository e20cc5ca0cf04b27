//! Object groups and the shapes placed in them.

use crate::attrs::{AttrWriter, Attrs, DEFAULT_OPACITY};
use crate::color::Color;
use crate::error::{Result, TsxError};
use crate::properties::{decode_properties, encode_properties, Properties};
use crate::xml::XmlElement;

/// Optional visibility flag: absent means "visible", but absence is kept so
/// that it survives a round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// No `visible` attribute.
    #[default]
    Unspecified,
    /// `visible="1"`.
    Visible,
    /// `visible="0"`.
    Hidden,
}

impl Visibility {
    /// Effective visibility.
    pub fn is_visible(self) -> bool {
        self != Visibility::Hidden
    }
}

/// Order in which the objects of a group are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DrawOrder {
    /// Sorted by y coordinate (`topdown`).
    #[default]
    TopDown,
    /// Document order (`index`).
    Index,
}

impl DrawOrder {
    /// Attribute keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            DrawOrder::TopDown => "topdown",
            DrawOrder::Index => "index",
        }
    }

    pub(crate) fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "topdown" => Some(DrawOrder::TopDown),
            "index" => Some(DrawOrder::Index),
            _ => None,
        }
    }
}

/// A polygon or polyline vertex, relative to the object position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    /// Horizontal offset in pixels.
    pub x: f64,
    /// Vertical offset in pixels.
    pub y: f64,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl HAlign {
    fn as_str(self) -> &'static str {
        match self {
            HAlign::Left => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
            HAlign::Justify => "justify",
        }
    }

    pub(crate) fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "left" => Some(HAlign::Left),
            "center" => Some(HAlign::Center),
            "right" => Some(HAlign::Right),
            "justify" => Some(HAlign::Justify),
            _ => None,
        }
    }
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum VAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl VAlign {
    fn as_str(self) -> &'static str {
        match self {
            VAlign::Top => "top",
            VAlign::Center => "center",
            VAlign::Bottom => "bottom",
        }
    }

    pub(crate) fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "top" => Some(VAlign::Top),
            "center" => Some(VAlign::Center),
            "bottom" => Some(VAlign::Bottom),
            _ => None,
        }
    }
}

/// Payload of a text object.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct Text {
    pub content: String,
    pub font_family: String,
    pub pixel_size: u32,
    pub wrap: bool,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub kerning: bool,
    pub halign: HAlign,
    pub valign: VAlign,
}

const DEFAULT_FONT_FAMILY: &str = "sans-serif";
const DEFAULT_PIXEL_SIZE: u32 = 16;

impl Default for Text {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            pixel_size: DEFAULT_PIXEL_SIZE,
            wrap: false,
            color: Color::BLACK,
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            kerning: true,
            halign: HAlign::Left,
            valign: VAlign::Top,
        }
    }
}

/// The shape of an [`Object`]. Exactly one applies to any object.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ObjectShape {
    /// No shape marker: a plain rectangle of the object's size.
    #[default]
    Rectangle,
    /// `<ellipse/>`.
    Ellipse,
    /// `<point/>`.
    Point,
    /// `<polygon points="..."/>`, closed.
    Polygon(Vec<Point>),
    /// `<polyline points="..."/>`, open.
    Polyline(Vec<Point>),
    /// `<text>...</text>`.
    Text(Text),
    /// `gid` attribute: a placed tile instance.
    Tile {
        /// Global tile ID, flip flags included.
        gid: u32,
    },
}

impl ObjectShape {
    /// Name of the element or attribute that marks this shape.
    pub fn marker(&self) -> &'static str {
        match self {
            ObjectShape::Rectangle => "rectangle",
            ObjectShape::Ellipse => "ellipse",
            ObjectShape::Point => "point",
            ObjectShape::Polygon(_) => "polygon",
            ObjectShape::Polyline(_) => "polyline",
            ObjectShape::Text(_) => "text",
            ObjectShape::Tile { .. } => "gid",
        }
    }

    /// Build the shape of object `object_id` from every marker found on it.
    ///
    /// No marker yields [`ObjectShape::Rectangle`]; more than one is
    /// [`TsxError::AmbiguousObjectShape`].
    pub fn from_markers(
        object_id: u32,
        markers: impl IntoIterator<Item = ObjectShape>,
    ) -> Result<ObjectShape> {
        let mut markers = markers.into_iter();
        let Some(shape) = markers.next() else {
            return Ok(ObjectShape::Rectangle);
        };
        let rest: Vec<ObjectShape> = markers.collect();
        if rest.is_empty() {
            return Ok(shape);
        }
        Err(TsxError::AmbiguousObjectShape {
            object_id,
            markers: std::iter::once(&shape)
                .chain(&rest)
                .map(ObjectShape::marker)
                .collect(),
        })
    }
}

/// A shape or marker placed in an [`ObjectGroup`].
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct Object {
    pub id: u32,
    pub name: String,
    /// Free-form class tag (`type`, or `class` in newer documents).
    pub object_type: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees.
    pub rotation: f64,
    pub visible: Visibility,
    pub shape: ObjectShape,
    pub properties: Properties,
}

impl Object {
    /// Global tile ID when the object is a tile instance.
    pub fn gid(&self) -> Option<u32> {
        match self.shape {
            ObjectShape::Tile { gid } => Some(gid),
            _ => None,
        }
    }
}

/// An ordered collection of objects, e.g. a tile's collision shapes.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct ObjectGroup {
    pub id: u32,
    pub name: String,
    pub color: Option<Color>,
    pub opacity: f64,
    pub visible: Visibility,
    pub offset_x: f64,
    pub offset_y: f64,
    pub draw_order: DrawOrder,
    pub objects: Vec<Object>,
    pub properties: Properties,
}

impl Default for ObjectGroup {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            color: None,
            opacity: DEFAULT_OPACITY,
            visible: Visibility::Unspecified,
            offset_x: 0.0,
            offset_y: 0.0,
            draw_order: DrawOrder::TopDown,
            objects: Vec::new(),
            properties: Properties::new(),
        }
    }
}

pub(crate) fn decode_object_group(element: &XmlElement) -> Result<ObjectGroup> {
    let attrs = Attrs::of(element);
    let mut group = ObjectGroup {
        id: attrs.parse_or("id", 0)?,
        name: attrs.string("name"),
        color: attrs.parse_opt("color")?,
        opacity: attrs.parse_or("opacity", DEFAULT_OPACITY)?,
        visible: attrs.visibility("visible")?,
        offset_x: attrs.parse_or("offsetx", 0.0)?,
        offset_y: attrs.parse_or("offsety", 0.0)?,
        draw_order: attrs.keyword_or(
            "draworder",
            DrawOrder::TopDown,
            DrawOrder::from_keyword,
            "draw order (topdown or index)",
        )?,
        ..Default::default()
    };

    for child in &element.children {
        match child.name.as_str() {
            "object" => group.objects.push(decode_object(child)?),
            "properties" => decode_properties(child, &mut group.properties)?,
            other => tracing::debug!(element = other, "skipping unknown <objectgroup> child"),
        }
    }
    Ok(group)
}

pub(crate) fn decode_object(element: &XmlElement) -> Result<Object> {
    let attrs = Attrs::of(element);
    let id = attrs.parse_or("id", 0)?;

    let mut markers = Vec::new();
    if let Some(gid) = attrs.parse_opt("gid")? {
        markers.push(ObjectShape::Tile { gid });
    }
    let mut properties = Properties::new();
    for child in &element.children {
        match child.name.as_str() {
            "ellipse" => markers.push(ObjectShape::Ellipse),
            "point" => markers.push(ObjectShape::Point),
            "polygon" => markers.push(ObjectShape::Polygon(decode_points(child)?)),
            "polyline" => markers.push(ObjectShape::Polyline(decode_points(child)?)),
            "text" => markers.push(ObjectShape::Text(decode_text(child)?)),
            "properties" => decode_properties(child, &mut properties)?,
            other => tracing::debug!(element = other, "skipping unknown <object> child"),
        }
    }

    Ok(Object {
        id,
        name: attrs.string("name"),
        object_type: attrs.str("type").or(attrs.str("class")).unwrap_or_default().to_owned(),
        x: attrs.parse_or("x", 0.0)?,
        y: attrs.parse_or("y", 0.0)?,
        width: attrs.parse_or("width", 0.0)?,
        height: attrs.parse_or("height", 0.0)?,
        rotation: attrs.parse_or("rotation", 0.0)?,
        visible: attrs.visibility("visible")?,
        shape: ObjectShape::from_markers(id, markers)?,
        properties,
    })
}

fn decode_points(element: &XmlElement) -> Result<Vec<Point>> {
    let attrs = Attrs::of(element);
    let raw = attrs.str("points").unwrap_or_default();
    raw.split_whitespace()
        .map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some(Point {
                x: x.parse().ok()?,
                y: y.parse().ok()?,
            })
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| attrs.malformed("points", raw, "list of x,y pairs"))
}

fn decode_text(element: &XmlElement) -> Result<Text> {
    let attrs = Attrs::of(element);
    let defaults = Text::default();
    Ok(Text {
        content: element.text.clone(),
        font_family: attrs
            .str("fontfamily")
            .unwrap_or(DEFAULT_FONT_FAMILY)
            .to_owned(),
        pixel_size: attrs.parse_or("pixelsize", DEFAULT_PIXEL_SIZE)?,
        wrap: attrs.bool_or("wrap", defaults.wrap)?,
        color: attrs.parse_or("color", defaults.color)?,
        bold: attrs.bool_or("bold", defaults.bold)?,
        italic: attrs.bool_or("italic", defaults.italic)?,
        underline: attrs.bool_or("underline", defaults.underline)?,
        strikeout: attrs.bool_or("strikeout", defaults.strikeout)?,
        kerning: attrs.bool_or("kerning", defaults.kerning)?,
        halign: attrs.keyword_or(
            "halign",
            HAlign::Left,
            HAlign::from_keyword,
            "horizontal alignment",
        )?,
        valign: attrs.keyword_or("valign", VAlign::Top, VAlign::from_keyword, "vertical alignment")?,
    })
}

pub(crate) fn encode_object_group(group: &ObjectGroup) -> XmlElement {
    let mut element = XmlElement::new("objectgroup");
    let mut attrs = AttrWriter::on(&mut element);
    attrs
        .push_non_default("id", group.id, 0)
        .push_str("name", &group.name);
    if let Some(color) = group.color {
        attrs.push("color", color);
    }
    attrs
        .push_non_default("opacity", group.opacity, DEFAULT_OPACITY)
        .push_visibility("visible", group.visible)
        .push_non_default("offsetx", group.offset_x, 0.0)
        .push_non_default("offsety", group.offset_y, 0.0)
        .push_non_default("draworder", group.draw_order.as_str(), DrawOrder::TopDown.as_str());

    if let Some(props) = encode_properties(&group.properties) {
        element.push_child(props);
    }
    for object in &group.objects {
        element.push_child(encode_object(object));
    }
    element
}

pub(crate) fn encode_object(object: &Object) -> XmlElement {
    let mut element = XmlElement::new("object");
    let mut attrs = AttrWriter::on(&mut element);
    attrs
        .push_non_default("id", object.id, 0)
        .push_str("name", &object.name)
        .push_str("type", &object.object_type);
    if let Some(gid) = object.gid() {
        attrs.push("gid", gid);
    }
    attrs
        .push_non_default("x", object.x, 0.0)
        .push_non_default("y", object.y, 0.0)
        .push_non_default("width", object.width, 0.0)
        .push_non_default("height", object.height, 0.0)
        .push_non_default("rotation", object.rotation, 0.0)
        .push_visibility("visible", object.visible);

    if let Some(props) = encode_properties(&object.properties) {
        element.push_child(props);
    }
    match &object.shape {
        ObjectShape::Rectangle | ObjectShape::Tile { .. } => {}
        ObjectShape::Ellipse => element.push_child(XmlElement::new("ellipse")),
        ObjectShape::Point => element.push_child(XmlElement::new("point")),
        ObjectShape::Polygon(points) => element.push_child(encode_points("polygon", points)),
        ObjectShape::Polyline(points) => element.push_child(encode_points("polyline", points)),
        ObjectShape::Text(text) => element.push_child(encode_text(text)),
    }
    element
}

fn encode_points(name: &str, points: &[Point]) -> XmlElement {
    let mut element = XmlElement::new(name);
    let joined = points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");
    element.push_attribute("points", joined);
    element
}

fn encode_text(text: &Text) -> XmlElement {
    let defaults = Text::default();
    let mut element = XmlElement::new("text");
    AttrWriter::on(&mut element)
        .push_non_default("fontfamily", text.font_family.as_str(), DEFAULT_FONT_FAMILY)
        .push_non_default("pixelsize", text.pixel_size, DEFAULT_PIXEL_SIZE)
        .push_bool("wrap", text.wrap, defaults.wrap)
        .push_non_default("color", text.color, defaults.color)
        .push_bool("bold", text.bold, defaults.bold)
        .push_bool("italic", text.italic, defaults.italic)
        .push_bool("underline", text.underline, defaults.underline)
        .push_bool("strikeout", text.strikeout, defaults.strikeout)
        .push_bool("kerning", text.kerning, defaults.kerning)
        .push_non_default("halign", text.halign.as_str(), HAlign::Left.as_str())
        .push_non_default("valign", text.valign.as_str(), VAlign::Top.as_str());
    element.text = text.content.clone();
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    fn object(src: &str) -> Result<Object> {
        decode_object(&xml::parse(src).unwrap())
    }

    #[test]
    fn plain_object_is_a_rectangle() {
        let o = object(r#"<object id="1" x="-0.25" y="17.75" width="32.375" height="6.125"/>"#)
            .unwrap();
        assert_eq!(o.shape, ObjectShape::Rectangle);
        assert_eq!((o.x, o.y, o.width, o.height), (-0.25, 17.75, 32.375, 6.125));
        assert_eq!(o.visible, Visibility::Unspecified);
        assert!(o.visible.is_visible());
    }

    #[test]
    fn each_marker_selects_its_shape() {
        assert_eq!(object(r#"<object id="2"><ellipse/></object>"#).unwrap().shape, ObjectShape::Ellipse);
        assert_eq!(object(r#"<object id="3"><point/></object>"#).unwrap().shape, ObjectShape::Point);
        assert_eq!(object(r#"<object id="4" gid="7"/>"#).unwrap().gid(), Some(7));
        assert_eq!(
            object(r#"<object id="5"><polyline points="0,0 4.5,-2"/></object>"#)
                .unwrap()
                .shape,
            ObjectShape::Polyline(vec![Point { x: 0.0, y: 0.0 }, Point { x: 4.5, y: -2.0 }])
        );
        let text = object(r#"<object id="6"><text wrap="1" halign="center">Hello</text></object>"#)
            .unwrap();
        match text.shape {
            ObjectShape::Text(t) => {
                assert_eq!(t.content, "Hello");
                assert!(t.wrap);
                assert_eq!(t.halign, HAlign::Center);
                assert_eq!(t.pixel_size, 16);
                assert!(t.kerning);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn two_markers_are_ambiguous() {
        let err = object(r#"<object id="9" gid="3"><ellipse/></object>"#).unwrap_err();
        match err {
            TsxError::AmbiguousObjectShape { object_id, markers } => {
                assert_eq!(object_id, 9);
                assert_eq!(markers, ["gid", "ellipse"]);
            }
            other => panic!("expected AmbiguousObjectShape, got {other:?}"),
        }

        let err = ObjectShape::from_markers(
            1,
            [ObjectShape::Polygon(Vec::new()), ObjectShape::Point],
        )
        .unwrap_err();
        assert!(matches!(err, TsxError::AmbiguousObjectShape { object_id: 1, .. }));
        assert_eq!(
            ObjectShape::from_markers(1, std::iter::empty()).unwrap(),
            ObjectShape::Rectangle
        );
    }

    #[test]
    fn bad_points_are_malformed() {
        assert!(matches!(
            object(r#"<object id="1"><polygon points="0,0 1"/></object>"#),
            Err(TsxError::MalformedAttribute { .. })
        ));
    }

    #[test]
    fn encoding_emits_only_the_populated_shape() {
        let o = Object {
            id: 4,
            shape: ObjectShape::Polygon(vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 16.0, y: 0.0 },
                Point { x: 8.0, y: 12.5 },
            ]),
            visible: Visibility::Hidden,
            ..Default::default()
        };
        let el = encode_object(&o);
        let names: Vec<_> = el.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["polygon"]);
        assert_eq!(el.children[0].attribute("points"), Some("0,0 16,0 8,12.5"));
        assert_eq!(el.attribute("visible"), Some("0"));
        assert_eq!(el.attribute("x"), None);
        assert_eq!(decode_object(&el).unwrap(), o);
    }

    #[test]
    fn group_defaults_are_elided_and_restored() {
        let group = ObjectGroup {
            draw_order: DrawOrder::Index,
            objects: vec![Object {
                id: 1,
                width: 8.0,
                height: 8.0,
                ..Default::default()
            }],
            ..Default::default()
        };
        let el = encode_object_group(&group);
        assert_eq!(el.attributes, vec![("draworder".to_owned(), "index".to_owned())]);
        let back = decode_object_group(&el).unwrap();
        assert_eq!(back.opacity, 1.0);
        assert_eq!(back, group);
    }
}
