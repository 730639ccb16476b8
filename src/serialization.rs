use crate::ast::{Color, Dictionary, Value, Vector2, Vector3};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Map;

/// Key marking a typed record in JSON form, e.g. `{"_type": "Vector2", "x": 1, "y": 2}`.
/// The writer never emits dictionary keys starting with it.
pub const TYPE_TAG: &str = "_type";

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Opaque(raw) => serialize_reference(serializer, "Opaque", "text", raw),
            Value::Vector2(v) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry(TYPE_TAG, "Vector2")?;
                map.serialize_entry("x", &v.x)?;
                map.serialize_entry("y", &v.y)?;
                map.end()
            }
            Value::Vector3(v) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry(TYPE_TAG, "Vector3")?;
                map.serialize_entry("x", &v.x)?;
                map.serialize_entry("y", &v.y)?;
                map.serialize_entry("z", &v.z)?;
                map.end()
            }
            Value::Color(c) => {
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry(TYPE_TAG, "Color")?;
                map.serialize_entry("r", &c.r)?;
                map.serialize_entry("g", &c.g)?;
                map.serialize_entry("b", &c.b)?;
                map.serialize_entry("a", &c.a)?;
                map.end()
            }
            Value::ExtResource(id) => serialize_reference(serializer, "ExtResource", "id", id),
            Value::SubResource(id) => serialize_reference(serializer, "SubResource", "id", id),
            Value::NodePath(path) => serialize_reference(serializer, "NodePath", "path", path),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Dictionary(dict) if dict.iter().all(|(k, _)| k.as_str().is_some()) => {
                let mut map = serializer.serialize_map(Some(dict.len()))?;
                for (key, value) in dict.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            // JSON object keys are strings; other keys need the pair form.
            Value::Dictionary(dict) => {
                let entries: Vec<(&Value, &Value)> = dict.iter().collect();
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(TYPE_TAG, "Dictionary")?;
                map.serialize_entry("entries", &entries)?;
                map.end()
            }
        }
    }
}

fn serialize_reference<S: Serializer>(
    serializer: S,
    tag: &str,
    field: &str,
    target: &str,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry(TYPE_TAG, tag)?;
    map.serialize_entry(field, target)?;
    map.end()
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

impl Value {
    /// Converts JSON into a value. Objects carrying a known `_type` tag become
    /// typed literals; every other object becomes a [`Dictionary`] with string keys.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => match tagged_record(&map) {
                Some(value) => value,
                None => Value::Dictionary(
                    map.into_iter()
                        .map(|(k, v)| (Value::String(k), Value::from_json(v)))
                        .collect::<Dictionary>(),
                ),
            },
        }
    }
}

fn tagged_record(map: &Map<String, serde_json::Value>) -> Option<Value> {
    let tag = map.get(TYPE_TAG)?.as_str()?;
    let num = |key: &str| map.get(key).and_then(serde_json::Value::as_f64);
    let text = |key: &str| map.get(key).and_then(serde_json::Value::as_str).map(str::to_owned);

    match tag {
        "Vector2" => Some(Value::Vector2(Vector2::new(num("x")?, num("y")?))),
        "Vector3" => Some(Value::Vector3(Vector3::new(num("x")?, num("y")?, num("z")?))),
        "Color" => Some(Value::Color(Color::rgba(
            num("r")?,
            num("g")?,
            num("b")?,
            num("a").unwrap_or(1.0),
        ))),
        "ExtResource" => text("id").map(Value::ExtResource),
        "SubResource" => text("id").map(Value::SubResource),
        "NodePath" => text("path").map(Value::NodePath),
        "Opaque" => text("text").map(Value::Opaque),
        "Dictionary" => map
            .get("entries")?
            .as_array()?
            .iter()
            .map(|pair| match pair.as_array()?.as_slice() {
                [key, value] => Some((
                    Value::from_json(key.clone()),
                    Value::from_json(value.clone()),
                )),
                _ => None,
            })
            .collect::<Option<Dictionary>>()
            .map(Value::Dictionary),
        _ => None,
    }
}
