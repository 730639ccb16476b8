use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum TscnError {
    #[error("Node not found: {path}")]
    #[diagnostic(
        code(edit::node_not_found),
        help("Node paths are relative to the scene root, e.g. `Player/Sprite2D`. The root itself is addressed by its name.")
    )]
    NodeNotFound { path: String },

    #[error(transparent)]
    #[diagnostic(code(api::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(api::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

/// A line the parser skipped. Parsing carries on past every one of these.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParseWarning {
    #[error("Unknown section `{tag}`")]
    #[diagnostic(
        code(parser::unknown_section),
        severity(Warning),
        help("This section type is not understood and was skipped. Newer format versions may add sections.")
    )]
    UnknownSection {
        #[source_code]
        src: NamedSource<String>,
        #[label("skipped")]
        span: SourceSpan,
        tag: String,
    },

    #[error("Unterminated section tag")]
    #[diagnostic(
        code(parser::unterminated_section),
        severity(Warning),
        help("A section tag must close with `]` on the same line.")
    )]
    UnterminatedSection {
        #[source_code]
        src: NamedSource<String>,
        #[label("missing `]`")]
        span: SourceSpan,
    },

    #[error("Property line without `=`")]
    #[diagnostic(
        code(parser::malformed_property),
        severity(Warning),
        help("Lines inside a block must look like `key = value`.")
    )]
    MalformedProperty {
        #[source_code]
        src: NamedSource<String>,
        #[label("skipped")]
        span: SourceSpan,
    },

    #[error("Text outside of any section")]
    #[diagnostic(
        code(parser::stray_line),
        severity(Warning),
        help("Only section tags, comments and blank lines may appear between blocks.")
    )]
    StrayLine {
        #[source_code]
        src: NamedSource<String>,
        #[label("skipped")]
        span: SourceSpan,
    },
}

impl ParseWarning {
    pub fn span(&self) -> SourceSpan {
        match self {
            ParseWarning::UnknownSection { span, .. }
            | ParseWarning::UnterminatedSection { span, .. }
            | ParseWarning::MalformedProperty { span, .. }
            | ParseWarning::StrayLine { span, .. } => *span,
        }
    }
}
