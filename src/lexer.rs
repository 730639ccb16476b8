use crate::utils::line_spans;

/// Represents the different kinds of line the scanner distinguishes.
/// The format is line oriented: every line is exactly one of these.
#[derive(Debug, PartialEq, Clone)]
pub enum LineType {
    /// An empty or whitespace-only line. Ends a property block.
    Blank,
    /// A comment, starting with `;` and continuing to the end of the line.
    Comment,
    /// A bracketed section tag such as `[node name="Player" parent="."]`.
    /// The associated `String` holds the text between the brackets.
    Section(String),
    /// A line that opens a section with `[` but never closes it.
    UnterminatedSection,
    /// A `key = value` assignment. Both sides are trimmed; the value is raw text.
    Property { key: String, value: String },
    /// Anything else.
    Stray,
}

/// A classified line with its position in the source.
#[derive(Debug, Clone)]
pub struct Line<'a> {
    pub ltype: LineType,
    pub text: &'a str,
    /// 1-based line number.
    pub number: usize,
    pub pos_start: usize,
    pub pos_end: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    pub fn lex(&self) -> Vec<Line<'a>> {
        line_spans(self.input)
            .into_iter()
            .enumerate()
            .map(|(i, (offset, text))| Line {
                ltype: classify(text),
                text,
                number: i + 1,
                pos_start: offset,
                pos_end: offset + text.len(),
            })
            .collect()
    }
}

pub fn classify(text: &str) -> LineType {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return LineType::Blank;
    }
    if trimmed.starts_with(';') {
        return LineType::Comment;
    }
    if let Some(rest) = trimmed.strip_prefix('[') {
        return match rest.strip_suffix(']') {
            Some(inner) => LineType::Section(inner.trim().to_string()),
            None => LineType::UnterminatedSection,
        };
    }
    match trimmed.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => LineType::Property {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        },
        _ => LineType::Stray,
    }
}

// --- Section headers ---

/// A parsed section tag: the tag word followed by `key=value` attributes.
#[derive(Debug, PartialEq, Clone)]
pub struct SectionHeader {
    pub tag: String,
    pub attributes: Vec<Attribute>,
}

impl SectionHeader {
    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.key == key)
    }

    /// The attribute's text, with quotes stripped when it was quoted.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(Attribute::text)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Attribute::as_int)
    }
}

/// One `key=value` pair from a section tag. `raw` is the value exactly as
/// written, quotes and brackets included.
#[derive(Debug, PartialEq, Clone)]
pub struct Attribute {
    pub key: String,
    pub raw: String,
}

impl Attribute {
    pub fn is_quoted(&self) -> bool {
        self.raw.starts_with('"')
    }

    pub fn text(&self) -> String {
        match read_quoted(&self.raw) {
            Some((content, _)) => content,
            None => self.raw.clone(),
        }
    }

    /// Accepts both `index=2` and `index="2"`.
    pub fn as_int(&self) -> Option<i64> {
        self.text().trim().parse().ok()
    }
}

/// Splits the inside of a section tag into its tag word and attributes.
///
/// An attribute value is, in priority order: a double-quoted string, a
/// bracketed array captured up to its matching `]`, or a bare token running to
/// the next top-level whitespace (so `ExtResource( 1 )` stays one token).
/// Words without `=` are dropped.
pub fn parse_section(inner: &str) -> SectionHeader {
    let inner = inner.trim();
    let (tag, rest) = match inner.find(char::is_whitespace) {
        Some(i) => (&inner[..i], &inner[i..]),
        None => (inner, ""),
    };

    let mut attributes = Vec::new();
    let mut rest = rest.trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        let after_key = rest[key_end..].trim_start();

        let Some(after_eq) = after_key.strip_prefix('=') else {
            log::debug!("dropping attribute without a value: {key}");
            rest = after_key;
            continue;
        };
        let value_text = after_eq.trim_start();
        let value_len = attribute_value_len(value_text);
        attributes.push(Attribute {
            key: key.to_string(),
            raw: value_text[..value_len].to_string(),
        });
        rest = value_text[value_len..].trim_start();
    }

    SectionHeader {
        tag: tag.to_string(),
        attributes,
    }
}

fn attribute_value_len(text: &str) -> usize {
    if text.starts_with('"') {
        return match read_quoted(text) {
            Some((_, end)) => end,
            None => text.len(),
        };
    }
    let bracketed = text.starts_with('[');
    let mut nesting = Nesting::default();
    for (i, c) in text.char_indices() {
        if !bracketed && c.is_whitespace() && nesting.at_top_level() {
            return i;
        }
        nesting.feed(c);
        if bracketed && nesting.at_top_level() {
            return i + c.len_utf8();
        }
    }
    text.len()
}

// --- Nesting-aware splitting ---

/// Tracks bracket depth and whether the scan is inside a string literal.
/// `[`, `{` and `(` open a level; `]`, `}` and `)` close one; neither counts
/// inside a string. A `"` toggles the string state unless escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct Nesting {
    depth: i32,
    in_string: bool,
    escaped: bool,
}

impl Nesting {
    pub fn feed(&mut self, c: char) {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            return;
        }
        match c {
            '"' => self.in_string = true,
            '[' | '{' | '(' => self.depth += 1,
            ']' | '}' | ')' => self.depth -= 1,
            _ => {}
        }
    }

    pub fn at_top_level(&self) -> bool {
        self.depth <= 0 && !self.in_string
    }
}

/// True when every string, bracket, brace and parenthesis opened in `text` is closed.
pub fn is_balanced(text: &str) -> bool {
    let mut nesting = Nesting::default();
    text.chars().for_each(|c| nesting.feed(c));
    nesting.at_top_level()
}

/// Splits on `sep` wherever it appears outside strings and nested brackets.
/// Segments are trimmed; empty segments (e.g. after a trailing comma) are dropped.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut nesting = Nesting::default();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == sep && nesting.at_top_level() {
            parts.push(text[start..i].trim());
            start = i + c.len_utf8();
            continue;
        }
        nesting.feed(c);
    }
    parts.push(text[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Splits once on the first top-level `sep`.
pub fn split_once_top_level(text: &str, sep: char) -> Option<(&str, &str)> {
    let mut nesting = Nesting::default();
    for (i, c) in text.char_indices() {
        if c == sep && nesting.at_top_level() {
            return Some((text[..i].trim(), text[i + c.len_utf8()..].trim()));
        }
        nesting.feed(c);
    }
    None
}

// --- Strings ---

/// Reads a double-quoted string at the start of `text`.
/// Returns the unescaped content and the byte offset just past the closing quote,
/// or `None` if `text` does not start with a quote or the string never closes.
pub fn read_quoted(text: &str) -> Option<(String, usize)> {
    let mut chars = text.char_indices();
    if chars.next()?.1 != '"' {
        return None;
    }
    let mut value = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, i + 1)),
            '\\' => {
                let (_, escaped_char) = chars.next()?;
                match escaped_char {
                    '"' => value.push('"'),
                    '\\' => value.push('\\'),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    _ => {
                        value.push('\\');
                        value.push(escaped_char);
                    }
                }
            }
            _ => value.push(c),
        }
    }
    None
}

/// Escapes backslashes first, then quotes, so the quote escapes stay intact.
/// Carriage returns are escaped too: the line splitter drops a raw `\r` before `\n`.
pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "\\r")
}

pub fn quote(s: &str) -> String {
    format!("\"{}\"", escape(s))
}
