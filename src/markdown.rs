//! Light markdown formatting for chat messages
//!
//! Messages are formatted one line at a time. A line is a header, a fenced
//! code line, a list item, a blockquote, or a paragraph; inside it, bold,
//! italic, underline, inline code and strikethrough spans are recognised.
//! Nothing spans multiple lines.

use colored::Colorize;
use regex::Regex;
use std::sync::OnceLock;

/// Kind of a single message line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    /// `#` to `######` followed by a space
    Header {
        /// Number of `#` characters
        level: usize,
        /// Header text
        text: &'a str,
    },
    /// Line starting with three backticks; the rest of the line is kept
    Code(&'a str),
    /// `- item` or `* item`
    ListItem(&'a str),
    /// `> quote`
    Quote(&'a str),
    /// Anything else
    Paragraph(&'a str),
}

/// Inline span within a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    /// Unformatted text
    Plain(&'a str),
    /// `**bold**`
    Bold(&'a str),
    /// `*italic*`
    Italic(&'a str),
    /// `__underline__`
    Underline(&'a str),
    /// `` `code` ``
    Code(&'a str),
    /// `~~strike~~`
    Strike(&'a str),
}

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6})\s(.+)$").expect("valid header regex"))
}

fn list_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-*]\s").expect("valid list regex"))
}

fn inline_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*\*.*?\*\*|\*.*?\*|__.*?__|`.*?`|~~.*?~~").expect("valid inline regex")
    })
}

/// Classify one line of a message
///
/// # Examples
///
/// ```
/// use chatline::markdown::{classify_line, Block};
///
/// assert_eq!(classify_line("## Title"), Block::Header { level: 2, text: "Title" });
/// assert_eq!(classify_line("- item"), Block::ListItem("item"));
/// ```
pub fn classify_line(line: &str) -> Block<'_> {
    if let Some(caps) = header_regex().captures(line) {
        if let (Some(hashes), Some(text)) = (caps.get(1), caps.get(2)) {
            return Block::Header {
                level: hashes.as_str().len(),
                text: text.as_str(),
            };
        }
    }
    if let Some(rest) = line.strip_prefix("```") {
        return Block::Code(rest);
    }
    if let Some(marker) = list_regex().find(line) {
        return Block::ListItem(&line[marker.end()..]);
    }
    if let Some(rest) = line.strip_prefix('>') {
        return Block::Quote(rest.trim());
    }
    Block::Paragraph(line)
}

/// Split a line into inline spans
///
/// A delimiter pair with nothing between it, such as `**`, is kept as
/// plain text.
pub fn parse_inline(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut last = 0;

    for m in inline_regex().find_iter(text) {
        if m.start() > last {
            spans.push(Span::Plain(&text[last..m.start()]));
        }
        spans.push(classify_span(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        spans.push(Span::Plain(&text[last..]));
    }
    spans
}

fn classify_span(part: &str) -> Span<'_> {
    let wrapped = |marker: &str| {
        part.len() > marker.len() * 2
            && part.starts_with(marker)
            && part.ends_with(marker)
    };

    if wrapped("**") {
        Span::Bold(&part[2..part.len() - 2])
    } else if wrapped("__") {
        Span::Underline(&part[2..part.len() - 2])
    } else if wrapped("~~") {
        Span::Strike(&part[2..part.len() - 2])
    } else if wrapped("*") {
        Span::Italic(&part[1..part.len() - 1])
    } else if wrapped("`") {
        Span::Code(&part[1..part.len() - 1])
    } else {
        Span::Plain(part)
    }
}

fn render_inline(text: &str) -> String {
    parse_inline(text)
        .into_iter()
        .map(|span| match span {
            Span::Plain(s) => s.to_string(),
            Span::Bold(s) => s.bold().to_string(),
            Span::Italic(s) => s.italic().to_string(),
            Span::Underline(s) => s.underline().to_string(),
            Span::Code(s) => s.on_bright_black().to_string(),
            Span::Strike(s) => s.strikethrough().to_string(),
        })
        .collect()
}

/// Render message content for the terminal
pub fn render(content: &str) -> String {
    content
        .split('\n')
        .map(|line| match classify_line(line) {
            Block::Header { level, text } => {
                let inner = render_inline(text);
                if level <= 2 {
                    inner.bold().underline().to_string()
                } else {
                    inner.bold().to_string()
                }
            }
            Block::Code(code) => format!("  {}", code.bright_white().on_black()),
            Block::ListItem(item) => format!("  • {}", render_inline(item)),
            Block::Quote(quote) => format!("  │ {}", render_inline(quote).italic()),
            Block::Paragraph(text) => render_inline(text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_headers() {
        assert_eq!(
            classify_line("# Top"),
            Block::Header {
                level: 1,
                text: "Top"
            }
        );
        assert_eq!(
            classify_line("###### Deep"),
            Block::Header {
                level: 6,
                text: "Deep"
            }
        );
        // Seven hashes or no space is not a header
        assert_eq!(
            classify_line("####### Too deep"),
            Block::Paragraph("####### Too deep")
        );
        assert_eq!(classify_line("#nospace"), Block::Paragraph("#nospace"));
    }

    #[test]
    fn test_classify_code_list_quote() {
        assert_eq!(classify_line("```rust"), Block::Code("rust"));
        assert_eq!(classify_line("* star item"), Block::ListItem("star item"));
        assert_eq!(classify_line("> quoted "), Block::Quote("quoted"));
        assert_eq!(classify_line("-not a list"), Block::Paragraph("-not a list"));
    }

    #[test]
    fn test_list_marker_with_wide_whitespace() {
        assert_eq!(classify_line("-\u{2003}item"), Block::ListItem("item"));
        assert_eq!(classify_line("*\u{a0}x"), Block::ListItem("x"));
        colored::control::set_override(false);
        assert_eq!(render("-\u{2003}item"), "  • item");
    }

    #[test]
    fn test_parse_inline_mixed() {
        let spans = parse_inline("a **b** *c* __d__ `e` ~~f~~ g");
        assert_eq!(
            spans,
            vec![
                Span::Plain("a "),
                Span::Bold("b"),
                Span::Plain(" "),
                Span::Italic("c"),
                Span::Plain(" "),
                Span::Underline("d"),
                Span::Plain(" "),
                Span::Code("e"),
                Span::Plain(" "),
                Span::Strike("f"),
                Span::Plain(" g"),
            ]
        );
    }

    #[test]
    fn test_parse_inline_plain_only() {
        assert_eq!(parse_inline("nothing here"), vec![Span::Plain("nothing here")]);
        assert!(parse_inline("").is_empty());
    }

    #[test]
    fn test_empty_delimiters_stay_plain() {
        assert_eq!(parse_inline("**"), vec![Span::Plain("**")]);
        assert_eq!(parse_inline("``"), vec![Span::Plain("``")]);
    }

    #[test]
    fn test_render_keeps_text() {
        colored::control::set_override(false);
        let out = render("# Hi\n- **one**\n> two\n```sh\nplain");
        assert_eq!(out, "Hi\n  • one\n  │ two\n  sh\nplain");
    }
}
