use crate::attrs::{AttrWriter, Attrs};
use crate::error::Result;
use crate::xml::XmlElement;

/// Value of a custom property.
///
/// The scalar Tiled types are interpreted and `class` values keep their
/// members; `color`, `file`, `object` and anything newer are carried verbatim
/// in [`PropertyValue::Other`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `type="string"` or no type at all.
    String(String),
    /// `type="int"`.
    Int(i64),
    /// `type="float"`.
    Float(f64),
    /// `type="bool"`, written as `true`/`false`.
    Bool(bool),
    /// `type="class"`: an instance of a custom class with nested members.
    Class {
        /// The `propertytype` attribute naming the class.
        property_type: String,
        /// Member values, as written in the nested `<properties>`.
        members: Properties,
    },
    /// Any other property type, passed through untouched.
    Other {
        /// The `type` attribute.
        kind: String,
        /// The raw value text.
        value: String,
    },
}

impl PropertyValue {
    /// The Tiled type name of this value.
    pub fn kind(&self) -> &str {
        match self {
            PropertyValue::String(_) => "string",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Class { .. } => "class",
            PropertyValue::Other { kind, .. } => kind,
        }
    }

    /// Canonical text form of the value. Empty for class values.
    pub fn to_text(&self) -> String {
        match self {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Int(v) => v.to_string(),
            PropertyValue::Float(v) => v.to_string(),
            PropertyValue::Bool(v) => v.to_string(),
            PropertyValue::Class { .. } => String::new(),
            PropertyValue::Other { value, .. } => value.clone(),
        }
    }

    /// Interpret `text` according to a Tiled type name. On failure returns the
    /// name of the expected type.
    pub(crate) fn from_text(
        kind: Option<&str>,
        text: &str,
    ) -> std::result::Result<Self, &'static str> {
        match kind.unwrap_or("string") {
            "string" => Ok(PropertyValue::String(text.to_owned())),
            "int" => text.trim().parse().map(PropertyValue::Int).map_err(|_| "int"),
            "float" => text
                .trim()
                .parse()
                .map(PropertyValue::Float)
                .map_err(|_| "float"),
            "bool" => match text.trim() {
                "true" | "1" => Ok(PropertyValue::Bool(true)),
                "false" | "0" => Ok(PropertyValue::Bool(false)),
                _ => Err("bool"),
            },
            other => Ok(PropertyValue::Other {
                kind: other.to_owned(),
                value: text.to_owned(),
            }),
        }
    }
}

/// A named custom property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name, unique within its [`Properties`].
    pub name: String,
    /// Property value.
    pub value: PropertyValue,
}

/// Ordered set of custom properties keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<Property>);

impl Properties {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no property is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Properties in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.0.iter()
    }

    /// Look a value up by name.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Set `name` to `value`. An existing entry keeps its position and its
    /// previous value is returned.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: PropertyValue,
    ) -> Option<PropertyValue> {
        let name = name.into();
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.value, value)),
            None => {
                self.0.push(Property { name, value });
                None
            }
        }
    }

    /// Remove a property by name.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let pos = self.0.iter().position(|p| p.name == name)?;
        Some(self.0.remove(pos).value)
    }

    /// A `bool` property.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// An `int` property.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// An `int` property that fits in `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// A `float` property.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// A `string` property.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl<N: Into<String>> FromIterator<(N, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (N, PropertyValue)>>(iter: I) -> Self {
        let mut out = Properties::new();
        for (name, value) in iter {
            out.insert(name, value);
        }
        out
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Merge the `<property>` children of a `<properties>` element into `out`.
pub(crate) fn decode_properties(element: &XmlElement, out: &mut Properties) -> Result<()> {
    for prop in element.children_named("property") {
        let attrs = Attrs::of(prop);
        let name = attrs.string("name");
        let value = match attrs.str("type") {
            Some("class") => {
                let mut members = Properties::new();
                for nested in prop.children_named("properties") {
                    decode_properties(nested, &mut members)?;
                }
                PropertyValue::Class {
                    property_type: attrs.string("propertytype"),
                    members,
                }
            }
            kind => {
                let text = match attrs.str("value") {
                    Some(v) => v,
                    None if prop.children.is_empty() => prop.text.as_str(),
                    None => "",
                };
                PropertyValue::from_text(kind, text)
                    .map_err(|expected| attrs.malformed("value", text, expected))?
            }
        };
        if out.insert(name.clone(), value).is_some() {
            tracing::warn!(property = %name, "duplicate property, keeping the last value");
        }
    }
    Ok(())
}

/// `None` when there is nothing to write.
pub(crate) fn encode_properties(props: &Properties) -> Option<XmlElement> {
    if props.is_empty() {
        return None;
    }
    let mut element = XmlElement::new("properties");
    for prop in props {
        let mut child = XmlElement::new("property");
        let mut attrs = AttrWriter::on(&mut child);
        attrs.push("name", &prop.name);
        if !matches!(prop.value, PropertyValue::String(_)) {
            attrs.push("type", prop.value.kind());
        }
        if let PropertyValue::Class {
            property_type,
            members,
        } = &prop.value
        {
            attrs.push_str("propertytype", property_type);
            if let Some(nested) = encode_properties(members) {
                child.push_child(nested);
            }
            element.push_child(child);
            continue;
        }
        let text = prop.value.to_text();
        // Newlines do not survive attribute normalization.
        if text.contains('\n') {
            child.text = text;
        } else {
            attrs.push("value", text);
        }
        element.push_child(child);
    }
    Some(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TsxError;
    use crate::xml;

    #[test]
    fn decodes_typed_values_in_order() {
        let doc = xml::parse(
            r##"<properties>
  <property name="is_night" type="bool" value="true"/>
  <property name="gravity" type="float" value="9.8"/>
  <property name="difficulty" type="int" value="3"/>
  <property name="theme" value="forest"/>
  <property name="tint" type="color" value="#ff00ff00"/>
  <property name="story">once
upon a time</property>
</properties>"##,
        )
        .unwrap();
        let mut props = Properties::new();
        decode_properties(&doc, &mut props).unwrap();

        let names: Vec<_> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            ["is_night", "gravity", "difficulty", "theme", "tint", "story"]
        );
        assert_eq!(props.get_bool("is_night"), Some(true));
        assert_eq!(props.get_f64("gravity"), Some(9.8));
        assert_eq!(props.get_i32("difficulty"), Some(3));
        assert_eq!(props.get_string("theme"), Some("forest"));
        assert_eq!(props.get_string("story"), Some("once\nupon a time"));
        assert_eq!(
            props.get("tint"),
            Some(&PropertyValue::Other {
                kind: "color".into(),
                value: "#ff00ff00".into()
            })
        );
    }

    #[test]
    fn bad_int_value_is_malformed() {
        let doc =
            xml::parse(r#"<properties><property name="n" type="int" value="x"/></properties>"#)
                .unwrap();
        let err = decode_properties(&doc, &mut Properties::new()).unwrap_err();
        assert!(matches!(err, TsxError::MalformedAttribute { expected: "int", .. }));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut props: Properties = [
            ("a", PropertyValue::Int(1)),
            ("b", PropertyValue::Int(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(props.insert("a", PropertyValue::Int(3)), Some(PropertyValue::Int(1)));
        let names: Vec<_> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(props.get_i64("a"), Some(3));
        assert_eq!(props.remove("a"), Some(PropertyValue::Int(3)));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn encoding_omits_string_type_and_moves_multiline_to_text() {
        let props: Properties = [
            ("theme", PropertyValue::String("forest".into())),
            ("lines", PropertyValue::String("a\nb".into())),
            ("solid", PropertyValue::Bool(false)),
        ]
        .into_iter()
        .collect();
        let element = encode_properties(&props).unwrap();
        let theme = &element.children[0];
        assert_eq!(theme.attribute("type"), None);
        assert_eq!(theme.attribute("value"), Some("forest"));
        let lines = &element.children[1];
        assert_eq!(lines.attribute("value"), None);
        assert_eq!(lines.text, "a\nb");
        assert_eq!(element.children[2].attribute("type"), Some("bool"));
        assert_eq!(element.children[2].attribute("value"), Some("false"));

        assert!(encode_properties(&Properties::new()).is_none());
    }

    #[test]
    fn hash_prefixed_color_value_round_trips() {
        let doc = xml::parse(
            r##"<properties><property name="tint" type="color" value="#80ff00ff"/></properties>"##,
        )
        .unwrap();
        let mut props = Properties::new();
        decode_properties(&doc, &mut props).unwrap();

        let element = encode_properties(&props).unwrap();
        assert_eq!(element.children[0].attribute("value"), Some("#80ff00ff"));
        let mut out = Vec::new();
        xml::write(&element, &mut out).unwrap();
        let again = xml::parse(std::str::from_utf8(&out).unwrap()).unwrap();
        let mut back = Properties::new();
        decode_properties(&again, &mut back).unwrap();
        assert_eq!(back, props);
    }

    #[test]
    fn class_values_keep_type_and_members() {
        let doc = xml::parse(
            r#"<properties>
  <property name="stats" type="class" propertytype="Stats">
   <properties>
    <property name="hp" type="int" value="12"/>
    <property name="label" value="boss"/>
   </properties>
  </property>
</properties>"#,
        )
        .unwrap();
        let mut props = Properties::new();
        decode_properties(&doc, &mut props).unwrap();
        match props.get("stats") {
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

        let element = encode_properties(&props).unwrap();
        let stats = &element.children[0];
        assert_eq!(stats.attribute("type"), Some("class"));
        assert_eq!(stats.attribute("propertytype"), Some("Stats"));
        assert_eq!(stats.attribute("value"), None);
        let mut back = Properties::new();
        decode_properties(&element, &mut back).unwrap();
        assert_eq!(back, props);
    }
}
