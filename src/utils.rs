/// Splits the source into lines, pairing each with the byte offset where it starts.
/// Line terminators (`\n` or `\r\n`) are not part of the returned text.
pub fn line_spans(source: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for raw in source.split('\n') {
        let text = raw.strip_suffix('\r').unwrap_or(raw);
        spans.push((offset, text));
        offset += raw.len() + 1;
    }
    // A trailing newline leaves one empty remainder that is not a line.
    if source.ends_with('\n') {
        spans.pop();
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_spans_offsets() {
        let spans = line_spans("ab\r\ncd\n\nef");
        assert_eq!(spans, vec![(0, "ab"), (4, "cd"), (7, ""), (8, "ef")]);
    }

    #[test]
    fn test_line_spans_trailing_newline() {
        assert_eq!(line_spans("a\n"), vec![(0, "a")]);
        assert!(line_spans("").len() == 1);
    }
}
