//! The rich-text dialect stored in chapter content and book prologues.
//!
//! Content is a small HTML subset: `<b>`, `<i>`, `<u>`, `<br />`, and
//! `<font face=".." data-point-size="N" color="#rrggbb">`, with entity-escaped
//! text in between. [`RichText`] is the parsed form: a flat list of styled
//! [`Span`]s where line breaks are kept as `'\n'` inside span text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static FACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)face="([^"]*)""#).expect("valid regex"));

static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)data-point-size="(\d+)""#).expect("valid regex"));

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r##"(?i)color="#([0-9a-f]{6})""##).expect("valid regex"));

/// Character formatting applied to a run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub face: Option<String>,
    /// Point size; `None` means the renderer's body size.
    pub size: Option<u16>,
    pub color: Option<[u8; 3]>,
}

impl SpanStyle {
    fn font_tag(&self) -> Option<String> {
        let mut attrs = Vec::new();
        if let Some(face) = &self.face {
            attrs.push(format!("face=\"{}\"", escape_text(face)));
        }
        if let Some(size) = self.size {
            attrs.push(format!("data-point-size=\"{size}\""));
        }
        if let Some([r, g, b]) = self.color {
            attrs.push(format!("color=\"#{r:02x}{g:02x}{b:02x}\""));
        }
        (!attrs.is_empty()).then(|| format!("<font {}>", attrs.join(" ")))
    }
}

/// A run of text sharing one [`SpanStyle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

/// Parsed rich text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    spans: Vec<Span>,
}

impl RichText {
    /// Parses stored markup. Unknown tags are dropped, unmatched closing tags
    /// are ignored, and the outermost style can never be popped.
    pub fn parse(html: &str) -> Self {
        let html = BR_RE.replace_all(html, "\n");
        let mut rich = Self::default();
        let mut stack = vec![SpanStyle::default()];
        let mut cursor = 0;

        for tag in TAG_RE.find_iter(&html) {
            if tag.start() > cursor {
                let style = stack.last().cloned().unwrap_or_default();
                rich.push(&unescape_entities(&html[cursor..tag.start()]), style);
            }
            cursor = tag.end();

            let inner = tag.as_str()[1..tag.as_str().len() - 1].trim();
            if let Some(closing) = inner.strip_prefix('/') {
                let name = closing.trim().to_ascii_lowercase();
                if matches!(name.as_str(), "font" | "b" | "i" | "u") && stack.len() > 1 {
                    stack.pop();
                }
                continue;
            }

            let name_end = inner
                .find(|c: char| c.is_whitespace() || c == '/')
                .unwrap_or(inner.len());
            let name = inner[..name_end].to_ascii_lowercase();
            let attrs = &inner[name_end..];
            let mut style = stack.last().cloned().unwrap_or_default();
            match name.as_str() {
                "b" => style.bold = true,
                "i" => style.italic = true,
                "u" => style.underline = true,
                "font" => {
                    if let Some(face) = FACE_RE.captures(attrs).and_then(|c| c.get(1)) {
                        if !face.as_str().is_empty() {
                            style.face = Some(unescape_entities(face.as_str()));
                        }
                    }
                    if let Some(size) = SIZE_RE.captures(attrs).and_then(|c| c.get(1)) {
                        style.size = size.as_str().parse().ok();
                    }
                    if let Some(color) = COLOR_RE.captures(attrs).and_then(|c| c.get(1)) {
                        style.color = parse_hex_color(color.as_str());
                    }
                }
                _ => continue,
            }
            stack.push(style);
        }

        if cursor < html.len() {
            let style = stack.last().cloned().unwrap_or_default();
            rich.push(&unescape_entities(&html[cursor..]), style);
        }
        rich
    }

    /// Builds unstyled rich text from plain text.
    pub fn plain(text: &str) -> Self {
        let mut rich = Self::default();
        rich.push(text, SpanStyle::default());
        rich
    }

    /// Appends text, merging into the last span when the style matches.
    pub fn push(&mut self, text: &str, style: SpanStyle) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                style,
            }),
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.is_empty())
    }

    /// The text without any formatting.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Splits at line breaks. Each line keeps its spans; empty lines are
    /// returned as empty vectors.
    pub fn lines(&self) -> Vec<Vec<Span>> {
        let mut lines = vec![Vec::new()];
        for span in &self.spans {
            for (i, piece) in span.text.split('\n').enumerate() {
                if i > 0 {
                    lines.push(Vec::new());
                }
                if !piece.is_empty() {
                    if let Some(line) = lines.last_mut() {
                        line.push(Span {
                            text: piece.to_string(),
                            style: span.style.clone(),
                        });
                    }
                }
            }
        }
        lines
    }

    /// Serialises back to the stored dialect.
    ///
    /// Styles nest as font > b > i > u around each run, and every newline
    /// becomes `<br />`.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            for (i, piece) in span.text.split('\n').enumerate() {
                if i > 0 {
                    out.push_str("<br />");
                }
                if piece.is_empty() {
                    continue;
                }
                let mut run = escape_text(piece);
                if span.style.underline {
                    run = format!("<u>{run}</u>");
                }
                if span.style.italic {
                    run = format!("<i>{run}</i>");
                }
                if span.style.bold {
                    run = format!("<b>{run}</b>");
                }
                if let Some(open) = span.style.font_tag() {
                    run = format!("{open}{run}</font>");
                }
                out.push_str(&run);
            }
        }
        out
    }
}

/// Strips markup for plain-text output: `<br>` becomes a newline, other tags
/// vanish, entities are decoded, and surrounding whitespace is trimmed.
pub fn to_plain_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let text = BR_RE.replace_all(html, "\n");
    let text = TAG_RE.replace_all(&text, "");
    unescape_entities(&text).trim().to_string()
}

/// Converts stored markup into the editor's source form, where line breaks
/// are real newlines instead of `<br />`.
pub fn html_to_source(html: &str) -> String {
    BR_RE.replace_all(html, "\n").into_owned()
}

/// Inverse of [`html_to_source`].
pub fn source_to_html(source: &str) -> String {
    source.replace("\r\n", "\n").replace('\n', "<br />")
}

/// Escapes the characters that would otherwise be read as markup.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decodes named and numeric character references. Unknown references are
/// left untouched.
pub fn unescape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&candidate[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text() {
        let rich = RichText::parse("Just words");
        assert_eq!(rich.spans().len(), 1);
        assert_eq!(rich.spans()[0].text, "Just words");
        assert_eq!(rich.spans()[0].style, SpanStyle::default());
    }

    #[test]
    fn test_parse_nested_styles() {
        let rich = RichText::parse("a <b>bold <i>both</i></b> c");
        let spans = rich.spans();
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].text, "a ");
        assert!(spans[1].style.bold && !spans[1].style.italic);
        assert_eq!(spans[2].text, "both");
        assert!(spans[2].style.bold && spans[2].style.italic);
        assert_eq!(spans[3].text, " c");
        assert!(!spans[3].style.bold);
    }

    #[test]
    fn test_parse_font_attributes() {
        let rich = RichText::parse(
            r##"<font face="Georgia" data-point-size="14" color="#FF0080">Red</font>"##,
        );
        let style = &rich.spans()[0].style;
        assert_eq!(style.face.as_deref(), Some("Georgia"));
        assert_eq!(style.size, Some(14));
        assert_eq!(style.color, Some([0xff, 0x00, 0x80]));
    }

    #[test]
    fn test_parse_line_breaks_and_entities() {
        let rich = RichText::parse("one<br />two<BR>three &amp; four&nbsp;five");
        assert_eq!(rich.plain_text(), "one\ntwo\nthree & four\u{a0}five");
    }

    #[test]
    fn test_parse_tolerates_stray_closing_tags() {
        let rich = RichText::parse("</b></font>text<u>under</u></u>after");
        assert_eq!(rich.plain_text(), "textunderafter");
        assert!(!rich.spans()[0].style.underline);
        assert!(rich.spans()[1].style.underline);
        assert!(!rich.spans()[2].style.underline);
    }

    #[test]
    fn test_unknown_tags_are_dropped() {
        let rich = RichText::parse("<p>para</p><span class=\"x\">text</span>");
        assert_eq!(rich.plain_text(), "paratext");
        assert_eq!(rich.spans().len(), 1);
    }

    #[test]
    fn test_to_html_nesting_order() {
        let mut rich = RichText::default();
        rich.push(
            "x",
            SpanStyle {
                bold: true,
                italic: true,
                underline: true,
                size: Some(16),
                ..SpanStyle::default()
            },
        );
        assert_eq!(
            rich.to_html(),
            r#"<font data-point-size="16"><b><i><u>x</u></i></b></font>"#
        );
    }

    #[test]
    fn test_to_html_escapes_and_breaks() {
        let rich = RichText::plain("a < b\nc & d");
        assert_eq!(rich.to_html(), "a &lt; b<br />c &amp; d");
    }

    #[test]
    fn test_html_survives_parse_and_serialise() {
        let html = r##"Intro <b>bold</b><br /><font color="#00ff00"><i>green</i></font> end"##;
        assert_eq!(RichText::parse(html).to_html(), html);
    }

    #[test]
    fn test_lines_split_spans() {
        let rich = RichText::parse("a<b>b<br />c</b><br /><br />d");
        let lines = rich.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(lines[1][0].text, "c");
        assert!(lines[1][0].style.bold);
        assert!(lines[2].is_empty());
        assert_eq!(lines[3][0].text, "d");
    }

    #[test]
    fn test_to_plain_text() {
        assert_eq!(to_plain_text(""), "");
        assert_eq!(
            to_plain_text("  <b>Hello</b><br/>World &lt;3&gt; &#233;&#xE9;  "),
            "Hello\nWorld <3> éé"
        );
    }

    #[test]
    fn test_unescape_leaves_unknown_references() {
        assert_eq!(unescape_entities("AT&T &bogus; &amp"), "AT&T &bogus; &amp");
    }

    #[test]
    fn test_source_round_trip() {
        let html = "<b>one</b><br />two";
        let source = html_to_source(html);
        assert_eq!(source, "<b>one</b>\ntwo");
        assert_eq!(source_to_html(&source), html);
        assert_eq!(source_to_html("a\r\nb"), "a<br />b");
    }
}
