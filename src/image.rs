use crate::attrs::{AttrWriter, Attrs};
use crate::color::Color;
use crate::error::Result;
use crate::xml::XmlElement;

/// Reference to external pixel data, or embedded pixel data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    /// Path of the image file, relative to the document that declared it.
    pub source: String,
    /// File format of embedded data (`png`, `gif` ...).
    pub format: String,
    /// Color to treat as transparent.
    pub trans: Option<Color>,
    /// Width in pixels, 0 when unknown.
    pub width: u32,
    /// Height in pixels, 0 when unknown.
    pub height: u32,
    /// Embedded pixel data, kept as-is.
    pub data: Option<ImageData>,
}

/// Contents of an `<image><data>` element. Never decoded here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageData {
    /// `base64` or empty.
    pub encoding: String,
    /// Compression applied before encoding, if any.
    pub compression: String,
    /// The encoded payload.
    pub content: String,
}

pub(crate) fn decode_image(element: &XmlElement) -> Result<Image> {
    let attrs = Attrs::of(element);
    let data = element.children_named("data").next().map(|data| {
        let a = Attrs::of(data);
        ImageData {
            encoding: a.string("encoding"),
            compression: a.string("compression"),
            content: data.text.clone(),
        }
    });

    Ok(Image {
        source: attrs.string("source"),
        format: attrs.string("format"),
        trans: attrs.parse_opt("trans")?,
        width: attrs.parse_or("width", 0)?,
        height: attrs.parse_or("height", 0)?,
        data,
    })
}

pub(crate) fn encode_image(image: &Image) -> XmlElement {
    let mut element = XmlElement::new("image");
    let mut attrs = AttrWriter::on(&mut element);
    attrs
        .push_str("format", &image.format)
        .push_str("source", &image.source);
    if let Some(trans) = image.trans {
        attrs.push("trans", trans.to_bare_hex());
    }
    attrs
        .push_non_default("width", image.width, 0)
        .push_non_default("height", image.height, 0);

    if let Some(data) = &image.data {
        let mut child = XmlElement::new("data");
        AttrWriter::on(&mut child)
            .push_str("encoding", &data.encoding)
            .push_str("compression", &data.compression);
        child.text = data.content.clone();
        element.push_child(child);
    }
    element
}
