//! Reading, editing and writing Godot scene (`.tscn`) and resource (`.tres`) text.
//!
//! ```
//! let doc = tscn_core::parse("[gd_scene format=3]\n\n[node name=\"Main\" type=\"Node2D\"]\n");
//! assert_eq!(doc.nodes[0].name, "Main");
//! assert_eq!(tscn_core::parse(&tscn_core::serialize(&doc)), doc);
//! ```

pub mod api;
pub mod ast;
pub mod edit;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod serialization;
pub mod utils;
pub mod value;
pub mod writer;

pub use api::{analyze, Analysis};
pub use ast::{
    Color, Connection, Dictionary, Document, ExtResource, Header, Node, Properties, ResourceKind,
    SubResource, Value, Vector2, Vector3,
};
pub use edit::{NodeUpdate, SceneTree, TreeEntry};
pub use error::{ParseWarning, TscnError};
pub use parser::{parse, Parser};
pub use writer::serialize;
