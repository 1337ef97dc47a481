//! IPP attribute collections.
//!
//! A small typed model of an IPP message: ordered attributes tagged with
//! their group, each carrying one or more values. Nested collections reuse
//! the same container with [`Group::Zero`] members.

pub mod codec;

use serde::Serialize;

pub use codec::{decode, encode};

/// Attribute group of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Group {
    /// Member of a collection value
    Zero,
    Operation,
    Job,
    Printer,
}

/// Value syntax used when coercing a string to an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    Integer,
    Boolean,
    Enum,
    OctetString,
    Range,
    Keyword,
    Name,
    Uri,
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum IppValue {
    Integer(i32),
    Enum(i32),
    Boolean(bool),
    Range { lower: i32, upper: i32 },
    OctetString(Vec<u8>),
    Keyword(String),
    Name(String),
    Text(String),
    Uri(String),
    MimeMediaType(String),
    Charset(String),
    NaturalLanguage(String),
    Collection(IppAttributes),
}

impl IppValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Keyword(s)
            | Self::Name(s)
            | Self::Text(s)
            | Self::Uri(s)
            | Self::MimeMediaType(s)
            | Self::Charset(s)
            | Self::NaturalLanguage(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(n) | Self::Enum(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&IppAttributes> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }
}

/// A named attribute with its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IppAttribute {
    pub group: Group,
    pub name: String,
    pub values: Vec<IppValue>,
}

impl IppAttribute {
    pub fn first(&self) -> Option<&IppValue> {
        self.values.first()
    }

    /// True when any string value equals `value`.
    pub fn contains_string(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.as_str() == Some(value))
    }

    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(IppValue::as_str)
    }
}

/// Ordered attribute collection, used both for whole messages and for
/// collection values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IppAttributes {
    /// Protocol version, major and minor
    pub version: (u8, u8),
    /// Operation id in requests, status code in responses
    pub op_or_status: u16,
    pub request_id: u32,
    attrs: Vec<IppAttribute>,
}

impl Default for IppAttributes {
    fn default() -> Self {
        Self {
            version: (2, 0),
            op_or_status: 0,
            request_id: 1,
            attrs: Vec::new(),
        }
    }
}

impl IppAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, group: Group, name: impl Into<String>, value: IppValue) -> &mut Self {
        self.add_values(group, name, vec![value])
    }

    pub fn add_values(&mut self, group: Group, name: impl Into<String>, values: Vec<IppValue>) -> &mut Self {
        self.attrs.push(IppAttribute {
            group,
            name: name.into(),
            values,
        });
        self
    }

    /// Add a collection member (group [`Group::Zero`]).
    pub fn add_member(&mut self, name: impl Into<String>, value: IppValue) -> &mut Self {
        self.add(Group::Zero, name, value)
    }

    pub fn find(&self, name: &str) -> Option<&IppAttribute> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// First value of the named attribute as a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(IppAttribute::first).and_then(IppValue::as_str)
    }

    pub fn get_integer(&self, name: &str) -> Option<i32> {
        self.find(name).and_then(IppAttribute::first).and_then(IppValue::as_integer)
    }

    pub fn get_collection(&self, name: &str) -> Option<&IppAttributes> {
        self.find(name)
            .and_then(IppAttribute::first)
            .and_then(IppValue::as_collection)
    }

    /// True when the named attribute exists and has `value` among its strings.
    pub fn contains_string(&self, name: &str, value: &str) -> bool {
        self.find(name).is_some_and(|a| a.contains_string(value))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IppAttribute> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl<'a> IntoIterator for &'a IppAttributes {
    type Item = &'a IppAttribute;
    type IntoIter = std::slice::Iter<'a, IppAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}

// Job template attributes with a non-name syntax, sorted by name.
const OPTION_TYPES: &[(&str, ValueTag)] = &[
    ("blackplot", ValueTag::Boolean),
    ("brightness", ValueTag::Integer),
    ("columns", ValueTag::Integer),
    ("copies", ValueTag::Integer),
    ("finishings", ValueTag::Enum),
    ("fit-to-page", ValueTag::Boolean),
    ("fitplot", ValueTag::Boolean),
    ("gamma", ValueTag::Integer),
    ("hue", ValueTag::Integer),
    ("job-authorization-uri", ValueTag::Uri),
    ("job-cancel-after", ValueTag::Integer),
    ("job-hold-until", ValueTag::Keyword),
    ("job-impressions", ValueTag::Integer),
    ("job-k-limit", ValueTag::Integer),
    ("job-page-limit", ValueTag::Integer),
    ("job-pages-per-set", ValueTag::Integer),
    ("job-password", ValueTag::OctetString),
    ("job-password-encryption", ValueTag::Keyword),
    ("job-priority", ValueTag::Integer),
    ("job-quota-period", ValueTag::Integer),
    ("landscape", ValueTag::Boolean),
    ("media", ValueTag::Keyword),
    ("mirror", ValueTag::Boolean),
    ("natural-scaling", ValueTag::Integer),
    ("number-up", ValueTag::Integer),
    ("number-up-layout", ValueTag::Keyword),
    ("orientation-requested", ValueTag::Enum),
    ("output-bin", ValueTag::Keyword),
    ("output-order", ValueTag::Keyword),
    ("page-bottom", ValueTag::Integer),
    ("page-left", ValueTag::Integer),
    ("page-ranges", ValueTag::Range),
    ("page-right", ValueTag::Integer),
    ("page-top", ValueTag::Integer),
    ("penwidth", ValueTag::Integer),
    ("ppi", ValueTag::Integer),
    ("prettyprint", ValueTag::Boolean),
    ("print-color-mode", ValueTag::Keyword),
    ("print-content-optimize", ValueTag::Keyword),
    ("print-quality", ValueTag::Enum),
    ("print-rendering-intent", ValueTag::Keyword),
    ("print-scaling", ValueTag::Keyword),
    ("raw", ValueTag::Boolean),
    ("saturation", ValueTag::Integer),
    ("scaling", ValueTag::Integer),
    ("sides", ValueTag::Keyword),
    ("wrap", ValueTag::Boolean),
];

/// Value syntax of a job template attribute; unknown names are `name` values.
pub fn option_value_tag(name: &str) -> ValueTag {
    OPTION_TYPES
        .binary_search_by(|(n, _)| (*n).cmp(name))
        .map(|i| OPTION_TYPES[i].1)
        .unwrap_or(ValueTag::Name)
}
