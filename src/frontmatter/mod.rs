//! Frontmatter locator
//!
//! Architecture: Domain Service - A pure, line-oriented scan over document text
//! - The opening delimiter must be the very first line
//! - The first later delimiter line closes the block and the scan stops there
//! - Lines ending in `\r\n` compare equal to the delimiter without the `\r`

use crate::domain::documents::{FrontmatterScan, FrontmatterSpan};

/// The line that opens and closes a frontmatter block
pub const DELIMITER: &str = "---";

/// Locate the frontmatter content of `text`.
///
/// Returns `None` when the document does not start with a delimiter line or when
/// the opening delimiter is never closed.
pub fn locate(text: &str) -> Option<FrontmatterSpan> {
    scan(text).span()
}

/// Locate the frontmatter and return its content
pub fn extract(text: &str) -> Option<&str> {
    locate(text).map(|span| span.slice(text))
}

/// Scan `text` for a frontmatter block, distinguishing absent from unterminated
pub fn scan(text: &str) -> FrontmatterScan {
    let mut lines = LineScanner::new(text);

    match lines.next() {
        Some(line) if line.content == DELIMITER && line.terminated => {}
        _ => return FrontmatterScan::Absent,
    }

    let content_start = lines.position();

    for line in lines {
        if line.content == DELIMITER {
            let end = content_end(text, content_start, line.start);
            return FrontmatterScan::Present(FrontmatterSpan::new(content_start, end));
        }
    }

    FrontmatterScan::Unterminated
}

/// End of the content: the byte before the newline that precedes the closing line
fn content_end(text: &str, content_start: usize, closing_start: usize) -> usize {
    if closing_start <= content_start {
        return content_start;
    }

    let bytes = text.as_bytes();
    let mut end = closing_start - 1; // '\n' ending the last content line
    if end > content_start && bytes[end - 1] == b'\r' {
        end -= 1;
    }
    end
}

/// One line of the scanned text
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// Byte offset of the first character of the line
    start: usize,
    /// Line text without its line terminator
    content: &'a str,
    /// Whether the line ended with a newline rather than end of input
    terminated: bool,
}

/// Iterator over lines that keeps track of byte offsets
struct LineScanner<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> LineScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }

    /// Offset of the next line to be returned
    fn position(&self) -> usize {
        self.position
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.text.len() {
            return None;
        }

        let start = self.position;
        let rest = &self.text[start..];

        let (raw, terminated) = match rest.find('\n') {
            Some(idx) => {
                self.position = start + idx + 1;
                (&rest[..idx], true)
            }
            None => {
                self.position = self.text.len();
                (rest, false)
            }
        };

        let content = raw.strip_suffix('\r').unwrap_or(raw);
        Some(Line {
            start,
            content,
            terminated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain_text("no frontmatter here")]
    #[case::empty("")]
    #[case::leading_blank_line("\n---\nkey: value\n---\n")]
    #[case::leading_space(" ---\nkey: value\n---\n")]
    #[case::longer_rule("----\nkey: value\n----\n")]
    #[case::trailing_text_on_opening("--- yaml\nkey: value\n---\n")]
    #[case::opening_without_newline("---")]
    #[case::rule_in_body("# Title\n\n---\n\ntext\n---\n")]
    fn test_no_opening_delimiter(#[case] text: &str) {
        assert_eq!(scan(text), FrontmatterScan::Absent);
        assert!(locate(text).is_none());
    }

    #[rstest]
    #[case::no_close("---\nkey: value\n")]
    #[case::close_with_trailing_text("---\nkey: value\n--- end\n")]
    #[case::only_opening("---\n")]
    fn test_unterminated(#[case] text: &str) {
        assert_eq!(scan(text), FrontmatterScan::Unterminated);
        assert!(locate(text).is_none());
    }

    #[rstest]
    #[case::simple("---\nkey: value\n---\nbody", "key: value")]
    #[case::close_at_eof("---\nkey: value\n---", "key: value")]
    #[case::multi_line("---\na: 1\nb: [x, y]\n---\n", "a: 1\nb: [x, y]")]
    #[case::blank_content_line("---\n\n---\n", "")]
    #[case::inner_blank_lines("---\na: 1\n\nb: 2\n---\n", "a: 1\n\nb: 2")]
    #[case::crlf("---\r\nkey: value\r\n---\r\nbody", "key: value")]
    #[case::unicode("---\ntitle: Café ☕\n---\n", "title: Café ☕")]
    fn test_extracts_body(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(extract(text), Some(expected));
    }

    #[test]
    fn test_empty_block() {
        let span = locate("---\n---").expect("empty block should be located");
        assert!(span.is_empty());
        assert_eq!(span.start(), 4);
        assert_eq!(extract("---\n---\nbody"), Some(""));
    }

    #[test]
    fn test_stops_at_first_closing_delimiter() {
        let text = "---\nfirst: 1\n---\nsecond: 2\n---\n";
        assert_eq!(extract(text), Some("first: 1"));
    }

    #[test]
    fn test_body_rules_are_not_frontmatter() {
        let text = "---\ntags: [a]\n---\n# Heading\n\n---\n\n```yaml\n---\nnot: frontmatter\n```\n";
        let span = locate(text).expect("frontmatter should be located");
        assert_eq!(span.slice(text), "tags: [a]");
        assert_eq!(span.first_line(text), 2);
    }

    #[test]
    fn test_generated_documents_round_trip_body() {
        let bodies = ["a: 1", "list:\n  - x\n  - y", "text: \"--- inside\"", "k: v\n"];
        let rests = ["", "\n", "\nbody\n---\nmore"];

        for body in bodies {
            for rest in rests {
                let text = format!("---\n{body}\n---{rest}");
                assert_eq!(extract(&text), Some(body), "document: {text:?}");
            }
        }
    }
}
