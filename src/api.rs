use crate::ast::Document;
use crate::edit::SceneTree;
use crate::error::{ParseWarning, TscnError};
use crate::parser::Parser;
use crate::writer::serialize;
use serde::{Serialize, Serializer};

/// The result of analyzing one scene or resource file: the parsed document
/// plus every line the parser had to skip.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub document: Document,
    pub warnings: Vec<ParseWarning>,
}

impl Serialize for Analysis {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.document.serialize(serializer)
    }
}

impl Analysis {
    /// Serializes the document into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `TscnError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, TscnError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Serializes the document into a YAML string.
    ///
    /// # Errors
    /// Returns a `TscnError::Yaml` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, TscnError> {
        Ok(serde_yaml::to_string(&self)?)
    }

    /// Writes the document back out in the text format.
    #[must_use]
    pub fn to_tscn(&self) -> String {
        serialize(&self.document)
    }

    #[must_use]
    pub fn tree(&self) -> SceneTree {
        self.document.tree()
    }

    /// Serializes the node tree view into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `TscnError::Json` if serialization fails.
    pub fn tree_json(&self) -> Result<String, TscnError> {
        Ok(serde_json::to_string_pretty(&self.tree())?)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Parses a `.tscn`/`.tres` source and collects its warnings.
///
/// `file_name` only labels diagnostics; nothing is read from disk.
#[must_use]
pub fn analyze(source: &str, file_name: &str) -> Analysis {
    let mut parser = Parser::new_with_name(source, file_name.to_string());
    let document = parser.parse_document();
    let warnings = parser.into_warnings();
    if !warnings.is_empty() {
        log::debug!("{file_name}: {} line(s) skipped", warnings.len());
    }
    Analysis { document, warnings }
}

/// Reads a document back from the JSON produced by [`Analysis::to_json`].
///
/// # Errors
/// Returns a `TscnError::Json` if the input is not a valid document.
pub fn from_json(json: &str) -> Result<Document, TscnError> {
    Ok(serde_json::from_str(json)?)
}
