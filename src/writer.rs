//! Renders a [`Document`] back into `.tscn`/`.tres` text.
//!
//! Output re-parses to an equal document; it is not byte-identical to
//! hand-written input (attribute order and spacing are normalized).

use crate::ast::*;
use crate::lexer::{is_balanced, quote};
use crate::serialization::TYPE_TAG;
use std::fmt::{self, Write};

/// Constructor names whose calls are written verbatim when they arrive as strings.
const CONSTRUCTORS: &[&str] = &[
    "Vector2",
    "Vector2i",
    "Vector3",
    "Vector3i",
    "Vector4",
    "Vector4i",
    "Rect2",
    "Rect2i",
    "Transform2D",
    "Transform3D",
    "Basis",
    "Quaternion",
    "AABB",
    "Plane",
    "Projection",
    "Color",
    "NodePath",
    "StringName",
    "ExtResource",
    "SubResource",
    "PackedByteArray",
    "PackedInt32Array",
    "PackedInt64Array",
    "PackedFloat32Array",
    "PackedFloat64Array",
    "PackedStringArray",
    "PackedVector2Array",
    "PackedVector3Array",
    "PackedVector4Array",
    "PackedColorArray",
];

/// Renders the whole document. The result ends with exactly one newline.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    // fmt::Write for String never returns an error.
    let _ = write_document(&mut out, doc);
    let mut text = out.trim_end().to_string();
    text.push('\n');
    text
}

/// Renders a single value the way it appears after `key = `.
pub fn format_value(value: &Value) -> String {
    value.to_string()
}

fn write_document<W: Write>(w: &mut W, doc: &Document) -> fmt::Result {
    write_header(w, &doc.header)?;
    w.write_str("\n\n")?;

    for ext in &doc.ext_resources {
        write!(w, "[ext_resource type={}", quote(&ext.resource_type))?;
        if let Some(uid) = &ext.uid {
            write!(w, " uid={}", quote(uid))?;
        }
        writeln!(w, " path={} id={}]", quote(&ext.path), quote(&ext.id))?;
    }
    if !doc.ext_resources.is_empty() {
        w.write_char('\n')?;
    }

    for sub in &doc.sub_resources {
        writeln!(
            w,
            "[sub_resource type={} id={}]",
            quote(&sub.resource_type),
            quote(&sub.id)
        )?;
        write_properties(w, &sub.properties)?;
        w.write_char('\n')?;
    }

    if let Some(resource) = &doc.resource {
        w.write_str("[resource]\n")?;
        write_properties(w, resource)?;
        w.write_char('\n')?;
    }

    for node in &doc.nodes {
        write_node_header(w, node)?;
        write_properties(w, &node.properties)?;
        w.write_char('\n')?;
    }

    for connection in &doc.connections {
        write_connection(w, connection)?;
    }
    if !doc.connections.is_empty() {
        w.write_char('\n')?;
    }

    for path in &doc.editable_instances {
        writeln!(w, "[editable path={}]", quote(path))?;
    }
    Ok(())
}

fn write_header<W: Write>(w: &mut W, header: &Header) -> fmt::Result {
    write!(w, "[{}", header.kind.tag())?;
    if header.kind == ResourceKind::Resource {
        if let Some(resource_type) = &header.resource_type {
            write!(w, " type={}", quote(resource_type))?;
        }
        if let Some(script_class) = &header.script_class {
            write!(w, " script_class={}", quote(script_class))?;
        }
    }
    if let Some(load_steps) = header.load_steps {
        write!(w, " load_steps={load_steps}")?;
    }
    write!(w, " format={}", header.format)?;
    if let Some(uid) = &header.uid {
        write!(w, " uid={}", quote(uid))?;
    }
    w.write_char(']')
}

/// Attribute order: name, type, parent, instance, instance_placeholder, owner,
/// index, groups, then any attributes kept from the source.
fn write_node_header<W: Write>(w: &mut W, node: &Node) -> fmt::Result {
    write!(w, "[node name={}", quote(&node.name))?;
    if let Some(node_type) = &node.node_type {
        write!(w, " type={}", quote(node_type))?;
    }
    if let Some(parent) = &node.parent {
        write!(w, " parent={}", quote(parent))?;
    }
    if let Some(instance) = &node.instance {
        write!(w, " instance={instance}")?;
    }
    if let Some(placeholder) = &node.instance_placeholder {
        write!(w, " instance_placeholder={}", quote(placeholder))?;
    }
    if let Some(owner) = &node.owner {
        write!(w, " owner={}", quote(owner))?;
    }
    if let Some(index) = node.index {
        write!(w, " index=\"{index}\"")?;
    }
    if !node.groups.is_empty() {
        let groups: Vec<String> = node.groups.iter().map(|g| quote(g)).collect();
        write!(w, " groups=[{}]", groups.join(", "))?;
    }
    for (key, raw) in &node.extra_attributes {
        write!(w, " {key}={raw}")?;
    }
    w.write_str("]\n")
}

fn write_connection<W: Write>(w: &mut W, connection: &Connection) -> fmt::Result {
    write!(
        w,
        "[connection signal={} from={} to={} method={}",
        quote(&connection.signal),
        quote(&connection.from),
        quote(&connection.to),
        quote(&connection.method)
    )?;
    if let Some(flags) = connection.flags {
        write!(w, " flags={flags}")?;
    }
    if let Some(unbinds) = connection.unbinds {
        write!(w, " unbinds={unbinds}")?;
    }
    if let Some(binds) = &connection.binds {
        w.write_str(" binds=")?;
        write_array(w, binds)?;
    }
    w.write_str("]\n")
}

fn write_properties<W: Write>(w: &mut W, properties: &Properties) -> fmt::Result {
    for (key, value) in properties {
        write!(w, "{key} = ")?;
        write_value(w, value)?;
        w.write_char('\n')?;
    }
    Ok(())
}

// --- Values ---

fn write_value<W: Write>(w: &mut W, value: &Value) -> fmt::Result {
    match value {
        Value::Null => w.write_str("null"),
        Value::Bool(b) => write!(w, "{b}"),
        Value::Int(i) => write!(w, "{i}"),
        Value::Float(f) => w.write_str(&format_float(*f)),
        Value::String(s) if looks_like_constructor(s) => w.write_str(s),
        Value::String(s) => w.write_str(&quote(s)),
        Value::Vector2(v) => write!(w, "Vector2({}, {})", format_real(v.x), format_real(v.y)),
        Value::Vector3(v) => write!(
            w,
            "Vector3({}, {}, {})",
            format_real(v.x),
            format_real(v.y),
            format_real(v.z)
        ),
        Value::Color(c) => write!(
            w,
            "Color({}, {}, {}, {})",
            format_real(c.r),
            format_real(c.g),
            format_real(c.b),
            format_real(c.a)
        ),
        Value::ExtResource(id) => write!(w, "ExtResource({})", quote(id)),
        Value::SubResource(id) => write!(w, "SubResource({})", quote(id)),
        Value::NodePath(path) => write!(w, "NodePath({})", quote(path)),
        Value::Array(items) => write_array(w, items),
        Value::Dictionary(dict) => match structural_shape(dict) {
            Some(shaped) => write_value(w, &shaped),
            None => write_dictionary(w, dict),
        },
        Value::Opaque(raw) => w.write_str(raw),
    }
}

fn write_array<W: Write>(w: &mut W, items: &[Value]) -> fmt::Result {
    w.write_char('[')?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            w.write_str(", ")?;
        }
        write_value(w, item)?;
    }
    w.write_char(']')
}

fn write_dictionary<W: Write>(w: &mut W, dict: &Dictionary) -> fmt::Result {
    w.write_char('{')?;
    let mut first = true;
    for (key, value) in dict.iter() {
        if is_type_tag(key) {
            continue;
        }
        if !first {
            w.write_str(", ")?;
        }
        first = false;
        write_value(w, key)?;
        w.write_str(": ")?;
        write_value(w, value)?;
    }
    w.write_char('}')
}

fn is_type_tag(key: &Value) -> bool {
    key.as_str().is_some_and(|k| k.starts_with(TYPE_TAG))
}

/// Plain `{x, y}`, `{x, y, z}` and `{r, g, b[, a]}` records with numeric fields
/// are written as the matching constructor.
fn structural_shape(dict: &Dictionary) -> Option<Value> {
    let mut fields: Vec<(&str, f64)> = Vec::new();
    for (key, value) in dict.iter() {
        if is_type_tag(key) {
            continue;
        }
        fields.push((key.as_str()?, value.as_f64()?));
    }
    let field = |name: &str| fields.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);

    let mut names: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
    names.sort_unstable();
    match names.as_slice() {
        ["x", "y"] => Some(Value::Vector2(Vector2::new(field("x")?, field("y")?))),
        ["x", "y", "z"] => Some(Value::Vector3(Vector3::new(
            field("x")?,
            field("y")?,
            field("z")?,
        ))),
        ["b", "g", "r"] => Some(Value::Color(Color::rgb(
            field("r")?,
            field("g")?,
            field("b")?,
        ))),
        ["a", "b", "g", "r"] => Some(Value::Color(Color::rgba(
            field("r")?,
            field("g")?,
            field("b")?,
            field("a")?,
        ))),
        _ => None,
    }
}

/// A single-line, balanced constructor call such as `Rect2(0, 0, 1, 1)`.
/// Anything else is quoted so it cannot swallow the lines after it on re-read.
fn looks_like_constructor(s: &str) -> bool {
    let Some(open) = s.find('(') else {
        return false;
    };
    s.ends_with(')')
        && CONSTRUCTORS.contains(&&s[..open])
        && !s.contains(['\n', '\r'])
        && is_balanced(s)
}

/// Scalar floats always carry a `.` or an exponent so they read back as floats.
fn format_float(f: f64) -> String {
    match non_finite(f) {
        Some(name) => name.to_string(),
        None => format!("{f:?}"),
    }
}

/// Constructor components use the shortest form: `1`, not `1.0`.
fn format_real(f: f64) -> String {
    match non_finite(f) {
        Some(name) => name.to_string(),
        None => format!("{f}"),
    }
}

fn non_finite(f: f64) -> Option<&'static str> {
    if f.is_nan() {
        Some("nan")
    } else if f == f64::INFINITY {
        Some("inf")
    } else if f == f64::NEG_INFINITY {
        Some("inf_neg")
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}
