//! Output sanitization for bookmark free-text fields.
//!
//! Stored bookmarks are transformed into a wire-safe shape before they
//! leave the service: `title` is strictly escaped, `description` keeps an
//! allow-list of benign inline markup. Escaping rewrites angle brackets
//! only, so a sanitized string sanitizes to itself — the transform is
//! idempotent and records can be re-serialized freely.

use crate::model::Bookmark;

/// How aggressively a field gets sanitized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Escape every angle bracket; no markup survives.
    Strict,
    /// Keep allow-listed inline tags, escape everything else.
    AllowInline,
}

/// Tags that may survive under [`Policy::AllowInline`], with the
/// attributes each is allowed to keep. Event-handler attributes are
/// dropped regardless of this table.
const ALLOWED_TAGS: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "target"]),
    ("b", &[]),
    ("br", &[]),
    ("code", &[]),
    ("em", &[]),
    ("i", &[]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("small", &[]),
    ("strong", &[]),
    ("sub", &[]),
    ("sup", &[]),
    ("u", &[]),
];

/// Maps a stored bookmark to its wire-safe representation. `id`, `url`
/// and `rating` pass through unchanged.
pub fn serialize(bookmark: Bookmark) -> Bookmark {
    Bookmark {
        id: bookmark.id,
        title: sanitize(&bookmark.title, Policy::Strict),
        url: bookmark.url,
        description: sanitize(&bookmark.description, Policy::AllowInline),
        rating: bookmark.rating,
    }
}

pub fn sanitize(text: &str, policy: Policy) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(['<', '>']) {
        out.push_str(&rest[..pos]);

        if rest.as_bytes()[pos] == b'>' {
            out.push_str("&gt;");
            rest = &rest[pos + 1..];
            continue;
        }

        if policy == Policy::AllowInline {
            if let Some((tag, consumed)) = sanitize_tag(&rest[pos..]) {
                out.push_str(&tag);
                rest = &rest[pos + consumed..];
                continue;
            }
        }

        out.push_str("&lt;");
        rest = &rest[pos + 1..];
    }

    out.push_str(rest);
    out
}

struct Attr {
    name: String,
    value: String,
}

/// Tries to read one allow-listed tag at the start of `s` (which begins
/// with `<`). Returns the canonical re-serialization and the number of
/// input bytes it covers, or `None` when the candidate is not a tag the
/// policy keeps — the caller then falls back to escaping.
fn sanitize_tag(s: &str) -> Option<(String, usize)> {
    let bytes = s.as_bytes();
    let closing = bytes.get(1) == Some(&b'/');
    let name_start = if closing { 2 } else { 1 };

    let mut i = name_start;
    while i < s.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name = s[name_start..i].to_ascii_lowercase();
    let allowed = allowed_attrs(&name)?;

    if closing {
        while i < s.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'>') {
            return None;
        }
        return Some((format!("</{}>", name), i + 1));
    }

    let mut kept: Vec<Attr> = Vec::new();
    loop {
        while i < s.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i) {
            None => return None, // unterminated tag
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') => {
                if bytes.get(i + 1) == Some(&b'>') {
                    i += 2;
                    break;
                }
                return None;
            }
            Some(_) => {}
        }

        let (attr, next) = parse_attr(s, i)?;
        i = next;
        if keep_attr(&attr, allowed) {
            kept.push(attr);
        }
    }

    let mut tag = format!("<{}", name);
    for attr in &kept {
        tag.push(' ');
        tag.push_str(&attr.name);
        tag.push_str("=\"");
        tag.push_str(&attr.value.replace('"', "&quot;"));
        tag.push('"');
    }
    tag.push('>');
    Some((tag, i))
}

fn parse_attr(s: &str, start: usize) -> Option<(Attr, usize)> {
    let bytes = s.as_bytes();

    let mut i = start;
    while i < s.len()
        && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'-' | b'_' | b':'))
    {
        i += 1;
    }
    if i == start {
        return None;
    }
    let name = s[start..i].to_ascii_lowercase();

    let mut j = i;
    while j < s.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    if bytes.get(j) != Some(&b'=') {
        // Valueless attribute; only the name was consumed.
        return Some((
            Attr {
                name,
                value: String::new(),
            },
            i,
        ));
    }
    j += 1;
    while j < s.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }

    match bytes.get(j) {
        Some(&b'"') | Some(&b'\'') => {
            let quote = bytes[j] as char;
            let value_start = j + 1;
            let end = s[value_start..].find(quote)? + value_start;
            Some((
                Attr {
                    name,
                    value: s[value_start..end].to_string(),
                },
                end + 1,
            ))
        }
        Some(_) => {
            let mut k = j;
            while k < s.len()
                && !bytes[k].is_ascii_whitespace()
                && bytes[k] != b'>'
                && bytes[k] != b'/'
            {
                k += 1;
            }
            Some((
                Attr {
                    name,
                    value: s[j..k].to_string(),
                },
                k,
            ))
        }
        None => None,
    }
}

/// Schemes an `href`/`src` value may carry. Scheme-less (relative)
/// values are also kept; everything else is dropped, so obfuscated
/// `javascript:`/`data:` spellings cannot slip through a deny-list.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn keep_attr(attr: &Attr, allowed: &[&str]) -> bool {
    // Event handlers never survive, whatever the tag allows.
    if attr.name.starts_with("on") {
        return false;
    }
    if !allowed.contains(&attr.name.as_str()) {
        return false;
    }
    if attr.name == "src" || attr.name == "href" {
        return match url_scheme(&attr.value) {
            Some(scheme) => ALLOWED_SCHEMES.contains(&scheme.as_str()),
            None => true,
        };
    }
    true
}

/// Extracts the scheme of a URL value as a browser will resolve it:
/// character references decoded, ASCII tab/newline/CR stripped inside
/// the scheme. Returns `None` for scheme-less (relative) values; a
/// candidate with characters a scheme cannot contain is not a scheme.
fn url_scheme(value: &str) -> Option<String> {
    let decoded = decode_char_refs(value.trim());
    let mut scheme = String::new();
    for c in decoded.chars() {
        match c {
            '\t' | '\n' | '\r' => continue,
            ':' if !scheme.is_empty() => return Some(scheme),
            c if c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.') => {
                scheme.push(c.to_ascii_lowercase());
            }
            _ => return None,
        }
    }
    None
}

/// One decoding pass over HTML character references, matching what a
/// browser applies to an attribute value before URL parsing. Anything
/// that is not a recognized reference is copied through unchanged.
fn decode_char_refs(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match parse_char_ref(rest) {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
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

/// Reads one character reference at the start of `s` (which begins with
/// `&`). Numeric references take an optional terminating semicolon, as
/// in browsers; of the named references only the scheme-smuggling
/// vehicles are recognized.
fn parse_char_ref(s: &str) -> Option<(char, usize)> {
    let body = &s[1..];
    if let Some(num) = body.strip_prefix('#') {
        let (digits, radix, prefix) = match num.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 3),
            None => (num, 10, 2),
        };
        let len = digits
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(digits.len());
        if len == 0 {
            return None;
        }
        let code = u32::from_str_radix(&digits[..len], radix).ok()?;
        let c = char::from_u32(code)?;
        let consumed = prefix + len + digits[len..].starts_with(';') as usize;
        Some((c, consumed))
    } else {
        let end = body.find(';')?;
        let c = match body[..end].to_ascii_lowercase().as_str() {
            "colon" => ':',
            "tab" => '\t',
            "newline" => '\n',
            "sol" => '/',
            _ => return None,
        };
        Some((c, end + 2))
    }
}

fn allowed_attrs(name: &str) -> Option<&'static [&'static str]> {
    ALLOWED_TAGS
        .iter()
        .find(|(tag, _)| *tag == name)
        .map(|(_, attrs)| *attrs)
}
