use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Property assignments of a node, sub-resource or main resource block.
/// Insertion order is kept so a written file lists keys the way they were read.
pub type Properties = IndexMap<String, Value>;

/// The structured form of one `.tscn` or `.tres` file.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub header: Header,
    #[serde(default)]
    pub ext_resources: Vec<ExtResource>,
    #[serde(default)]
    pub sub_resources: Vec<SubResource>,
    /// Properties of the `[resource]` block of a `.tres` file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Properties>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub editable_instances: Vec<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Scene,
    Resource,
}

impl ResourceKind {
    /// The section tag that opens a file of this kind.
    pub fn tag(self) -> &'static str {
        match self {
            ResourceKind::Scene => "gd_scene",
            ResourceKind::Resource => "gd_resource",
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// The `type` attribute of a `gd_resource` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_class: Option<String>,
    /// Advisory. Mutation helpers recompute it; the writer trusts it as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_steps: Option<u32>,
    pub format: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            kind: ResourceKind::Scene,
            resource_type: None,
            script_class: None,
            load_steps: None,
            format: 3,
            uid: None,
        }
    }
}

/// `[ext_resource ...]`: a resource living in another file.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ExtResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub path: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// `[sub_resource ...]` plus its property lines.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SubResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    #[serde(default)]
    pub properties: Properties,
}

/// `[node ...]` plus its property lines.
///
/// `parent` is `None` for the scene root and `"."` for direct children of it.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    /// Header attributes this crate has no field for, kept as raw text.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra_attributes: IndexMap<String, String>,
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            ..Node::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// `[connection ...]`: a signal wired from one node to a method on another.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub signal: String,
    pub from: String,
    pub to: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unbinds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binds: Option<Vec<Value>>,
}

impl Connection {
    pub fn new(
        signal: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Connection {
            signal: signal.into(),
            from: from.into(),
            to: to.into(),
            method: method.into(),
            flags: None,
            unbinds: None,
            binds: None,
        }
    }
}

// --- Values ---

/// A property value. Serde support lives in `serialization`.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vector2(Vector2),
    Vector3(Vector3),
    Color(Color),
    /// `ExtResource("id")`
    ExtResource(String),
    /// `SubResource("id")`
    SubResource(String),
    /// `NodePath("path")`
    NodePath(String),
    Array(Vec<Value>),
    Dictionary(Dictionary),
    /// A literal this crate does not decompose (`Rect2(...)`, `Transform3D(...)`,
    /// `PackedStringArray(...)`, `&"name"`, ...). Written back verbatim.
    Opaque(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats here, as the engine does for real-valued fields.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vector2> for Value {
    fn from(v: Vector2) -> Self {
        Value::Vector2(v)
    }
}

impl From<Vector3> for Value {
    fn from(v: Vector3) -> Self {
        Value::Vector3(v)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Value::Dictionary(dict)
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Vector2 { x, y }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Color { r, g, b, a }
    }
}

/// An ordered `{key: value}` literal. Keys keep their parsed type; lookups by
/// `&str` match string keys only.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Dictionary {
    entries: Vec<(Value, Value)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or replaces in place, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(Value, Value)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

impl IntoIterator for Dictionary {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_insert_replaces_in_place() {
        let mut dict = Dictionary::new();
        dict.insert("a", 1);
        dict.insert("b", 2);
        let previous = dict.insert("a", 3);

        assert_eq!(previous, Some(Value::Int(1)));
        assert_eq!(dict.len(), 2);
        let keys: Vec<_> = dict.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("b")]);
        assert_eq!(dict.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_dictionary_lookup_ignores_non_string_keys() {
        let mut dict = Dictionary::new();
        dict.insert(Value::Int(1), "one");
        assert!(dict.get("1").is_none());
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_header_defaults_to_scene_format_3() {
        let header = Header::default();
        assert_eq!(header.kind, ResourceKind::Scene);
        assert_eq!(header.format, 3);
        assert!(header.load_steps.is_none());
    }

    #[test]
    fn test_node_builder() {
        let node = Node::new("Player")
            .with_type("CharacterBody2D")
            .with_parent(".")
            .with_property("speed", 300);
        assert!(!node.is_root());
        assert_eq!(node.properties.get("speed"), Some(&Value::Int(300)));
    }
}
