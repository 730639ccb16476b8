use crate::ast::*;
use crate::error::ParseWarning;
use crate::lexer::{is_balanced, parse_section, Lexer, Line, LineType, SectionHeader};
use crate::value::parse_value;
use miette::{NamedSource, SourceSpan};
use std::sync::Arc;

/// A line-oriented parser for `.tscn`/`.tres` text.
///
/// Parsing never fails. Lines that are not understood are skipped and recorded
/// as [`ParseWarning`]s, so files written by newer engine versions still load.
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    name: String,
    lines: Vec<Line<'a>>,
    position: usize,
    warnings: Vec<ParseWarning>,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.tscn".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        let source = Arc::new(NamedSource::new(name.clone(), source_text.to_string()));
        Self {
            source,
            name,
            lines: Lexer::new(source_text).lex(),
            position: 0,
            warnings: Vec::new(),
        }
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ParseWarning> {
        self.warnings
    }

    // === Main Parsing Methods ===

    /// Document ::= { Section | Comment | Blank }
    pub fn parse_document(&mut self) -> Document {
        self.position = 0;
        self.warnings.clear();
        let mut doc = Document::default();

        while let Some(line) = self.lines.get(self.position) {
            let ltype = line.ltype.clone();
            match ltype {
                LineType::Section(inner) => {
                    self.position += 1;
                    self.parse_section_block(&mut doc, parse_section(&inner));
                }
                LineType::Blank | LineType::Comment => self.position += 1,
                LineType::UnterminatedSection => {
                    let span = self.current_span();
                    self.skip_line("unterminated section tag");
                    self.warnings.push(ParseWarning::UnterminatedSection {
                        src: (*self.source).clone(),
                        span,
                    });
                }
                LineType::Property { .. } | LineType::Stray => {
                    let span = self.current_span();
                    self.skip_line("text outside of any section");
                    self.warnings.push(ParseWarning::StrayLine {
                        src: (*self.source).clone(),
                        span,
                    });
                }
            }
        }

        doc
    }

    /// Dispatches on the tag of a section whose header line was just consumed.
    fn parse_section_block(&mut self, doc: &mut Document, header: SectionHeader) {
        log::trace!("{}: section `{}`", self.name, header.tag);
        match header.tag.as_str() {
            "gd_scene" | "gd_resource" => doc.header = header_from_section(&header),
            "ext_resource" => doc.ext_resources.push(ExtResource {
                resource_type: header.text("type").unwrap_or_default(),
                path: header.text("path").unwrap_or_default(),
                id: header.text("id").unwrap_or_default(),
                uid: header.text("uid"),
            }),
            "sub_resource" => {
                let properties = self.parse_properties();
                doc.sub_resources.push(SubResource {
                    resource_type: header.text("type").unwrap_or_default(),
                    id: header.text("id").unwrap_or_default(),
                    properties,
                });
            }
            "resource" => {
                let properties = self.parse_properties();
                doc.resource.get_or_insert_with(Properties::new).extend(properties);
            }
            "node" => {
                let mut node = node_from_section(&header);
                node.properties = self.parse_properties();
                doc.nodes.push(node);
            }
            "connection" => doc.connections.push(connection_from_section(&header)),
            "editable" => {
                if let Some(path) = header.text("path") {
                    doc.editable_instances.push(path);
                }
            }
            _ => {
                let start = self.position - 1;
                let span = self.span_of(start);
                log::debug!(
                    "{}:{}: skipping unknown section `{}`",
                    self.name,
                    start + 1,
                    header.tag
                );
                // The body belongs to the unknown section; drop it with the header.
                let _ = self.parse_properties();
                self.warnings.push(ParseWarning::UnknownSection {
                    src: (*self.source).clone(),
                    span,
                    tag: header.tag.clone(),
                });
            }
        }
    }

    /// PropertyBlock ::= { Property | Comment } ( Blank | Section | EOF )
    /// Property ::= Key "=" Value
    ///
    /// A value that opens a string or bracket without closing it continues on
    /// the following lines until it balances.
    fn parse_properties(&mut self) -> Properties {
        let mut properties = Properties::new();

        while let Some(line) = self.lines.get(self.position) {
            match &line.ltype {
                LineType::Blank | LineType::Section(_) | LineType::UnterminatedSection => break,
                LineType::Comment => self.position += 1,
                LineType::Stray => {
                    let span = self.current_span();
                    self.skip_line("property line without `=`");
                    self.warnings.push(ParseWarning::MalformedProperty {
                        src: (*self.source).clone(),
                        span,
                    });
                }
                LineType::Property { key, .. } => {
                    let key = key.clone();
                    let mut value = line
                        .text
                        .split_once('=')
                        .map(|(_, rhs)| rhs.trim_start().to_string())
                        .unwrap_or_default();
                    self.position += 1;

                    while !is_balanced(&value) {
                        let Some(next) = self.lines.get(self.position) else {
                            break;
                        };
                        value.push('\n');
                        value.push_str(next.text);
                        self.position += 1;
                    }

                    properties.insert(key, parse_value(&value));
                }
            }
        }

        properties
    }

    // === Line Helper Methods ===

    fn current_span(&self) -> SourceSpan {
        self.span_of(self.position)
    }

    fn span_of(&self, index: usize) -> SourceSpan {
        match self.lines.get(index) {
            Some(line) => (line.pos_start, line.pos_end - line.pos_start).into(),
            None => (0, 0).into(),
        }
    }

    fn skip_line(&mut self, reason: &str) {
        log::debug!("{}:{}: skipping {reason}", self.name, self.position + 1);
        self.position += 1;
    }
}

fn header_from_section(header: &SectionHeader) -> Header {
    let kind = if header.tag == "gd_resource" {
        ResourceKind::Resource
    } else {
        ResourceKind::Scene
    };
    Header {
        kind,
        resource_type: match kind {
            ResourceKind::Resource => header.text("type"),
            ResourceKind::Scene => None,
        },
        script_class: header.text("script_class"),
        load_steps: header.int("load_steps").and_then(|n| u32::try_from(n).ok()),
        format: header
            .int("format")
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(3),
        uid: header.text("uid"),
    }
}

fn node_from_section(header: &SectionHeader) -> Node {
    let mut node = Node::new(header.text("name").unwrap_or_default());
    for attr in &header.attributes {
        match attr.key.as_str() {
            "name" => {}
            "type" => node.node_type = Some(attr.text()),
            "parent" => node.parent = Some(attr.text()),
            "instance" => node.instance = Some(parse_value(&attr.raw)),
            "instance_placeholder" => node.instance_placeholder = Some(attr.text()),
            "owner" => node.owner = Some(attr.text()),
            "index" => match attr.as_int() {
                Some(index) => node.index = Some(index),
                None => {
                    node.extra_attributes
                        .insert(attr.key.clone(), attr.raw.clone());
                }
            },
            "groups" => {
                node.groups = match parse_value(&attr.raw) {
                    Value::Array(items) => items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                }
            }
            _ => {
                node.extra_attributes
                    .insert(attr.key.clone(), attr.raw.clone());
            }
        }
    }
    node
}

fn connection_from_section(header: &SectionHeader) -> Connection {
    let mut connection = Connection::new(
        header.text("signal").unwrap_or_default(),
        header.text("from").unwrap_or_default(),
        header.text("to").unwrap_or_default(),
        header.text("method").unwrap_or_default(),
    );
    connection.flags = header.int("flags");
    connection.unbinds = header.int("unbinds");
    connection.binds = header.get("binds").and_then(|attr| match parse_value(&attr.raw) {
        Value::Array(items) => Some(items),
        _ => None,
    });
    connection
}

/// Parses a complete file. See [`Parser`] for warnings.
pub fn parse(source: &str) -> Document {
    Parser::new(source).parse_document()
}
