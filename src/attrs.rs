//! Attribute coercion: typed decode with documented defaults, and the inverse
//! encode which leaves an attribute out entirely when it holds its default.

use std::any::type_name;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{Result, TsxError};
use crate::object::Visibility;
use crate::xml::XmlElement;

pub(crate) const DEFAULT_OPACITY: f64 = 1.0;

/// Read-only view over an element's attributes.
pub(crate) struct Attrs<'a> {
    element: &'a XmlElement,
}

impl<'a> Attrs<'a> {
    pub fn of(element: &'a XmlElement) -> Self {
        Self { element }
    }

    pub fn str(&self, name: &str) -> Option<&'a str> {
        self.element.attribute(name)
    }

    /// Attribute text, or the empty string when absent.
    pub fn string(&self, name: &str) -> String {
        self.str(name).unwrap_or_default().to_owned()
    }

    pub fn parse_opt<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.str(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.malformed(name, raw, short_type_name::<T>())),
        }
    }

    pub fn parse_or<T: FromStr>(&self, name: &str, default: T) -> Result<T> {
        Ok(self.parse_opt(name)?.unwrap_or(default))
    }

    /// Booleans are written as `0`/`1`; `true`/`false` are accepted too.
    pub fn bool_opt(&self, name: &str) -> Result<Option<bool>> {
        match self.str(name).map(str::trim) {
            None => Ok(None),
            Some("1") | Some("true") => Ok(Some(true)),
            Some("0") | Some("false") => Ok(Some(false)),
            Some(raw) => Err(self.malformed(name, raw, "boolean (0 or 1)")),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool> {
        Ok(self.bool_opt(name)?.unwrap_or(default))
    }

    /// Enumerated attribute, with `parse` mapping each accepted keyword.
    pub fn keyword_or<T>(
        &self,
        name: &str,
        default: T,
        parse: fn(&str) -> Option<T>,
        expected: &'static str,
    ) -> Result<T> {
        match self.str(name) {
            None => Ok(default),
            Some(raw) => parse(raw.trim()).ok_or_else(|| self.malformed(name, raw, expected)),
        }
    }

    pub fn visibility(&self, name: &str) -> Result<Visibility> {
        Ok(match self.bool_opt(name)? {
            None => Visibility::Unspecified,
            Some(true) => Visibility::Visible,
            Some(false) => Visibility::Hidden,
        })
    }

    pub fn malformed(&self, name: &str, raw: &str, expected: &'static str) -> TsxError {
        TsxError::MalformedAttribute {
            element: self.element.name.clone(),
            attribute: name.to_owned(),
            value: raw.to_owned(),
            expected,
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Appends attributes to an element under construction, in call order.
pub(crate) struct AttrWriter<'a> {
    element: &'a mut XmlElement,
}

impl<'a> AttrWriter<'a> {
    pub fn on(element: &'a mut XmlElement) -> Self {
        Self { element }
    }

    pub fn push(&mut self, name: &str, value: impl Display) -> &mut Self {
        self.element.push_attribute(name, value.to_string());
        self
    }

    /// Empty strings are the default for every textual attribute.
    pub fn push_str(&mut self, name: &str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.element.push_attribute(name, value);
        }
        self
    }

    pub fn push_non_default<T: PartialEq + Display>(
        &mut self,
        name: &str,
        value: T,
        default: T,
    ) -> &mut Self {
        if value != default {
            self.push(name, value);
        }
        self
    }

    pub fn push_bool(&mut self, name: &str, value: bool, default: bool) -> &mut Self {
        if value != default {
            self.push(name, if value { "1" } else { "0" });
        }
        self
    }

    pub fn push_visibility(&mut self, name: &str, visible: Visibility) -> &mut Self {
        match visible {
            Visibility::Unspecified => self,
            Visibility::Visible => self.push(name, "1"),
            Visibility::Hidden => self.push(name, "0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(attrs: &[(&str, &str)]) -> XmlElement {
        let mut e = XmlElement::new("object");
        for (k, v) in attrs {
            e.push_attribute(*k, *v);
        }
        e
    }

    #[test]
    fn absent_attributes_fall_back_to_defaults() {
        let e = element(&[]);
        let a = Attrs::of(&e);
        assert_eq!(a.parse_or("opacity", DEFAULT_OPACITY).unwrap(), 1.0);
        assert_eq!(a.parse_or("spacing", 0u32).unwrap(), 0);
        assert!(a.bool_or("kerning", true).unwrap());
        assert_eq!(a.visibility("visible").unwrap(), Visibility::Unspecified);
        assert_eq!(a.string("name"), "");
    }

    #[test]
    fn present_but_unparseable_attribute_is_an_error() {
        let e = element(&[("width", "wide"), ("visible", "maybe")]);
        let a = Attrs::of(&e);
        match a.parse_or("width", 0.0f64) {
            Err(TsxError::MalformedAttribute {
                element,
                attribute,
                value,
                ..
            }) => {
                assert_eq!(element, "object");
                assert_eq!(attribute, "width");
                assert_eq!(value, "wide");
            }
            other => panic!("expected MalformedAttribute, got {other:?}"),
        }
        assert!(a.visibility("visible").is_err());
    }

    #[test]
    fn booleans_accept_digits_and_words() {
        let e = element(&[("a", "1"), ("b", "false"), ("visible", "0")]);
        let a = Attrs::of(&e);
        assert_eq!(a.bool_opt("a").unwrap(), Some(true));
        assert_eq!(a.bool_opt("b").unwrap(), Some(false));
        assert_eq!(a.visibility("visible").unwrap(), Visibility::Hidden);
    }

    #[test]
    fn writer_elides_defaults() {
        let mut e = XmlElement::new("objectgroup");
        AttrWriter::on(&mut e)
            .push_str("name", "")
            .push_non_default("opacity", 1.0, DEFAULT_OPACITY)
            .push_non_default("offsetx", 2.5, 0.0)
            .push_bool("wrap", false, false)
            .push_bool("kerning", false, true)
            .push_visibility("visible", Visibility::Unspecified);
        assert_eq!(
            e.attributes,
            vec![
                ("offsetx".to_owned(), "2.5".to_owned()),
                ("kerning".to_owned(), "0".to_owned()),
            ]
        );
    }

    #[test]
    fn floats_keep_their_exact_text_form() {
        let mut e = XmlElement::new("object");
        AttrWriter::on(&mut e)
            .push("x", -0.25f64)
            .push("y", 17.75f64)
            .push("width", 32.375f64)
            .push("height", 6.0f64);
        assert_eq!(e.attribute("x"), Some("-0.25"));
        assert_eq!(e.attribute("y"), Some("17.75"));
        assert_eq!(e.attribute("width"), Some("32.375"));
        assert_eq!(e.attribute("height"), Some("6"));
    }
}
