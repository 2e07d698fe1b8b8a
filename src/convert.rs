//! Conversion of Buildkite entities into Terraform attributes

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};

use crate::error::{Error, Result};

/// Kind of schema to generate for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaMode {
    /// All the attributes of the entity, nested entities being references
    FullEntity,
    /// Only the unique identifier of the entity
    ReferenceOnly,
}

/// Attributes of a converted entity, keyed by their Terraform name
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Value of a single converted attribute
///
/// Objects read back from Terraform state always deserialize as [`AttributeValue::Object`]:
/// a string map and a nested entity share the same encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    String(String),
    Number(i64),
    Bool(bool),
    Object(Attributes),
    Map(BTreeMap<String, String>),
    List(Vec<Attributes>),
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<BTreeMap<String, String>> for AttributeValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::Map(value)
    }
}

impl From<Attributes> for AttributeValue {
    fn from(value: Attributes) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Attributes>> for AttributeValue {
    fn from(value: Vec<Attributes>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Build [`Attributes`] from `key => value` pairs
macro_rules! attributes {
    {$($key:expr => $value:expr),* $(,)?} => {
        {
            let mut attributes = $crate::convert::Attributes::new();
            $(
                attributes.insert(
                    ::std::string::String::from($key),
                    $crate::convert::AttributeValue::from($value),
                );
            )*
            attributes
        }
    };
}

pub(crate) use attributes;

/// Conversion from a Buildkite API type to Terraform attributes
pub trait Convert {
    /// Schema of the attributes produced by [`Convert::convert`] in the given mode
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute>;

    /// Convert the entity
    fn convert(&self, mode: SchemaMode) -> Result<Attributes>;
}

/// Paginated list of entities, as returned by GraphQL connections
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, bound = "T: Deserialize<'de>")]
pub struct EdgeList<T> {
    pub count: i64,
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for EdgeList<T> {
    fn default() -> Self {
        Self {
            count: 0,
            edges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> EdgeList<T> {
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

impl<T> FromIterator<T> for EdgeList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let edges: Vec<Edge<T>> = iter.into_iter().map(|node| Edge { node }).collect();
        Self {
            count: edges.len() as i64,
            edges,
        }
    }
}

impl<T: Convert> EdgeList<T> {
    pub fn convert(&self, mode: SchemaMode) -> Result<Vec<Attributes>> {
        convert_all(self.nodes(), mode)
    }
}

/// Convert every entity of a list
pub fn convert_all<'a, T, I>(entities: I, mode: SchemaMode) -> Result<Vec<Attributes>>
where
    T: Convert + 'a,
    I: IntoIterator<Item = &'a T>,
{
    entities
        .into_iter()
        .map(|entity| entity.convert(mode))
        .collect()
}

/// Convert a nested entity that may be absent
pub fn convert_optional<T: Convert>(
    entity: Option<&T>,
    mode: SchemaMode,
) -> Result<AttributeValue> {
    Ok(entity.map(|entity| entity.convert(mode)).transpose()?.into())
}

/// Schema for a list of entities
pub fn list_attribute<T: Convert>(mode: SchemaMode, description: &str) -> Attribute {
    computed(AttributeType::AttributeList(T::schema(mode)), description)
}

/// Schema for a single nested entity
pub fn object_attribute<T: Convert>(mode: SchemaMode, description: &str) -> Attribute {
    computed(AttributeType::AttributeSingle(T::schema(mode)), description)
}

/// Schema for an attribute set by the provider only
pub fn computed(attr_type: AttributeType, description: &str) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint: AttributeConstraint::Computed,
        ..Default::default()
    }
}

pub fn computed_string(description: &str) -> Attribute {
    computed(AttributeType::String, description)
}

pub fn computed_bool(description: &str) -> Attribute {
    computed(AttributeType::Bool, description)
}

pub fn computed_number(description: &str) -> Attribute {
    computed(AttributeType::Number, description)
}

pub fn computed_map(description: &str) -> Attribute {
    computed(AttributeType::Map(AttributeType::String.into()), description)
}

/// Parse `key=value` entries into a map
///
/// Entries are split on their first `=`, so values may contain `=` themselves.
pub fn parse_key_values<S: AsRef<str>>(entries: &[S]) -> Result<BTreeMap<String, String>> {
    entries
        .iter()
        .map(|entry| {
            let entry = entry.as_ref();
            entry
                .split_once('=')
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .ok_or_else(|| Error::MalformedMetadata(entry.to_owned()))
        })
        .collect()
}
