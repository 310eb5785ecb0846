//! Pure rendering helpers shared by every page. Output depends only on the
//! input, so these are safe to snapshot in tests.

use chrono::{DateTime, NaiveDate, Utc};

pub const PREVIEW_CHARS: usize = 150;

/// Tags kept by [`sanitize_rich_text`]. Everything the editor toolbar can
/// produce, nothing that can carry script or styling.
const ALLOWED_TAGS: &[&str] = &[
    "b",
    "strong",
    "i",
    "em",
    "u",
    "s",
    "strike",
    "p",
    "div",
    "br",
    "ul",
    "ol",
    "li",
    "blockquote",
];

/// Tags whose content is dropped along with the tag.
const DROPPED_CONTENT_TAGS: &[&str] = &["script", "style"];

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Plain text of a rich-text fragment, cut to 150 characters with `...`
/// appended when it was longer.
pub fn text_preview(html: &str) -> String {
    let text = html_to_text(html);
    if text.chars().count() > PREVIEW_CHARS {
        let mut cut: String = text.chars().take(PREVIEW_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        text
    }
}

/// `Oct 19, 2026`
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y").to_string()
}

/// `02:05 PM`
pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%I:%M %p").to_string()
}

/// `Monday, October 19, 2026`
pub fn format_long_date(date: &NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Text content of an HTML fragment: tags removed, entities decoded.
pub fn html_to_text(html: &str) -> String {
    let mut raw = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(pos) = rest.find('<') {
        raw.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match parse_tag(rest) {
            Some(tag) => rest = &rest[tag.len..],
            None => {
                raw.push('<');
                rest = &rest[1..];
            }
        }
    }
    raw.push_str(rest);
    decode_entities(&raw)
}

/// Reduce editor HTML to the allow-listed formatting tags, without attributes.
/// Text outside tags is kept as written, except that a stray `<` or `>` is
/// escaped.
pub fn sanitize_rich_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while !rest.is_empty() {
        let Some(pos) = rest.find(&['<', '>'][..]) else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with('>') {
            out.push_str("&gt;");
            rest = &rest[1..];
            continue;
        }

        let Some(tag) = parse_tag(rest) else {
            out.push_str("&lt;");
            rest = &rest[1..];
            continue;
        };
        rest = &rest[tag.len..];

        let Some(name) = tag.name else {
            // comment or doctype
            continue;
        };

        if !tag.closing && DROPPED_CONTENT_TAGS.contains(&name.as_str()) {
            rest = skip_past_closing(rest, &name);
            continue;
        }

        if ALLOWED_TAGS.contains(&name.as_str()) {
            match (name.as_str(), tag.closing) {
                ("br", true) => {}
                ("br", false) => out.push_str("<br>"),
                (_, false) => {
                    out.push('<');
                    out.push_str(&name);
                    out.push('>');
                }
                (_, true) => {
                    out.push_str("</");
                    out.push_str(&name);
                    out.push('>');
                }
            }
        }
    }

    out
}

struct Tag {
    /// Lower-cased element name; `None` for comments and declarations.
    name: Option<String>,
    closing: bool,
    /// Bytes consumed, including the angle brackets.
    len: usize,
}

/// Parse the tag at the start of `input` (which begins with `<`). Returns
/// `None` when the `<` does not open a tag and should be read as text.
fn parse_tag(input: &str) -> Option<Tag> {
    debug_assert!(input.starts_with('<'));

    if let Some(body) = input.strip_prefix("<!--") {
        let len = body.find("-->").map(|end| 4 + end + 3).unwrap_or(input.len());
        return Some(Tag {
            name: None,
            closing: false,
            len,
        });
    }

    let after = &input[1..];
    let (closing, after) = match after.strip_prefix('/') {
        Some(a) => (true, a),
        None => (false, after),
    };

    let first = after.chars().next()?;
    if first == '!' || first == '?' {
        let end = input.find('>')?;
        return Some(Tag {
            name: None,
            closing: false,
            len: end + 1,
        });
    }
    if !first.is_ascii_alphabetic() {
        return None;
    }

    let name_len = after
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after.len());
    let name = after[..name_len].to_ascii_lowercase();

    // Find the closing '>' while skipping quoted attribute values.
    let offset = input.len() - after.len() + name_len;
    let mut quote: Option<char> = None;
    for (i, ch) in input[offset..].char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '>') => {
                return Some(Tag {
                    name: Some(name),
                    closing,
                    len: offset + i + 1,
                })
            }
            (None, _) => {}
        }
    }
    None
}

/// Skip everything up to and including `</name ...>`; consumes the rest of the
/// input when the element is never closed.
fn skip_past_closing<'a>(input: &'a str, name: &str) -> &'a str {
    let needle = format!("</{}", name);
    let lower = input.to_ascii_lowercase();
    match lower.find(&needle) {
        Some(start) => match input[start..].find('>') {
            Some(end) => &input[start + end + 1..],
            None => "",
        },
        None => "",
    }
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match decode_entity(rest) {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the entity at the start of `input` (which begins with `&`).
fn decode_entity(input: &str) -> Option<(char, usize)> {
    let end = input
        .char_indices()
        .take(12)
        .find(|(_, c)| *c == ';')
        .map(|(i, _)| i)?;
    let body = &input[1..end];
    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                body.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some((ch, end + 1))
}
