//! Self-closing tag expansion
//!
//! The HTML5 tokenizer ignores the trailing slash of `<div/>`, leaving the
//! element open so it swallows its following siblings. Under the XHTML
//! policy such tags are rewritten to `<div></div>` before tokenizing.
//! Void elements are left alone, as are comments and the bodies of raw
//! text elements.

use std::borrow::Cow;

/// Elements that never have content
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose content is not parsed as markup
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes", "noscript",
    "plaintext",
];

struct StartTag {
    name: String,
    /// Index of the `/` in `/>`
    slash: Option<usize>,
    /// Index just past the tag
    end: usize,
}

/// Scan a start tag whose `<` sits at `start`
fn scan_start_tag(bytes: &[u8], start: usize) -> Option<StartTag> {
    let mut i = start + 1;
    let name_start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'/' && bytes[i] != b'>' {
        i += 1;
    }
    let name = std::str::from_utf8(&bytes[name_start..i]).ok()?.to_ascii_lowercase();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i)? {
            b'>' => {
                return Some(StartTag { name, slash: None, end: i + 1 });
            }
            b'/' => {
                if bytes.get(i + 1) == Some(&b'>') {
                    return Some(StartTag { name, slash: Some(i), end: i + 2 });
                }
                i += 1;
            }
            _ => {
                // attribute name
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && !matches!(bytes[i], b'/' | b'>' | b'=')
                {
                    i += 1;
                }
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                if bytes.get(i) != Some(&b'=') {
                    continue;
                }
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                match bytes.get(i) {
                    Some(&quote @ (b'"' | b'\'')) => {
                        i += 1;
                        while i < bytes.len() && bytes[i] != quote {
                            i += 1;
                        }
                        i += 1;
                    }
                    // unquoted values may end in `/`: `<a href=x/>` is not self-closing
                    _ => {
                        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                            i += 1;
                        }
                    }
                }
            }
        }
    }
}

/// Case-insensitive search for `</name` from `from`
fn find_end_tag(bytes: &[u8], from: usize, name: &str) -> Option<usize> {
    let needle = name.as_bytes();
    let mut i = from;
    while i + 2 + needle.len() <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1] == b'/'
            && bytes[i + 2..i + 2 + needle.len()].eq_ignore_ascii_case(needle)
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Rewrite `<tag .../>` on non-void elements to `<tag ...></tag>`
pub fn expand_self_closing(markup: &str) -> Cow<'_, str> {
    if !markup.contains("/>") {
        return Cow::Borrowed(markup);
    }
    let bytes = markup.as_bytes();
    let mut out = String::with_capacity(markup.len() + 16);
    let mut copied = 0;
    let mut i = 0;
    let mut changed = false;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if markup[i..].starts_with("<!--") {
            i = markup[i + 4..].find("-->").map_or(bytes.len(), |p| i + 4 + p + 3);
            continue;
        }
        if !bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            i += 1;
            continue;
        }
        let Some(tag) = scan_start_tag(bytes, i) else {
            break;
        };

        match tag.slash {
            Some(slash) if !VOID_ELEMENTS.contains(&tag.name.as_str()) => {
                out.push_str(&markup[copied..slash]);
                out.push_str("></");
                out.push_str(&tag.name);
                out.push('>');
                copied = tag.end;
                changed = true;
                i = tag.end;
            }
            Some(_) => i = tag.end,
            None if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) => {
                i = find_end_tag(bytes, tag.end, &tag.name).unwrap_or(bytes.len());
            }
            None => i = tag.end,
        }
    }

    if !changed {
        return Cow::Borrowed(markup);
    }
    out.push_str(&markup[copied..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expands_non_void() {
        assert_eq!(expand_self_closing("<div/>"), "<div></div>");
        assert_eq!(
            expand_self_closing("<div id='a'/><span class=\"b\" />x"),
            "<div id='a'></div><span class=\"b\" ></span>x"
        );
        assert_eq!(expand_self_closing("<UL/>"), "<UL></ul>");
    }

    #[test]
    fn test_void_untouched() {
        assert!(matches!(expand_self_closing("<br/><img src=x />"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unquoted_value_slash() {
        assert_eq!(expand_self_closing("<a href=foo/>x</a>"), "<a href=foo/>x</a>");
        assert_eq!(expand_self_closing("<a href=foo />"), "<a href=foo ></a>");
    }

    #[test]
    fn test_quoted_value_with_markup() {
        assert_eq!(
            expand_self_closing("<p title=\"<b/>\"/>"),
            "<p title=\"<b/>\"></p>"
        );
    }

    #[test]
    fn test_comments_and_raw_text_skipped() {
        let src = "<!-- <div/> --><script>var s = '<div/>';</script><p/>";
        assert_eq!(
            expand_self_closing(src),
            "<!-- <div/> --><script>var s = '<div/>';</script><p></p>"
        );
    }

    #[test]
    fn test_unterminated_input() {
        assert_eq!(expand_self_closing("<div class='x/>"), "<div class='x/>");
        assert_eq!(expand_self_closing("text />"), "text />");
    }
}
