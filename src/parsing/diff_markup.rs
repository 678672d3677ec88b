use regex::Regex;
use std::sync::LazyLock;

/// Class the revision service puts on removed words.
pub const DELETED_CLASS: &str = "line-through";
/// Class the revision service puts on added words.
pub const INSERTED_CLASS: &str = "text-green-500";

static SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<span\b[^>]*?\bclass\s*=\s*["']([^"']*)["'][^>]*>(.*?)</span\s*>"#)
        .expect("span pattern is valid")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupSegment {
    Plain(String),
    Deleted(String),
    Inserted(String),
}

impl MarkupSegment {
    pub fn text(&self) -> &str {
        match self {
            MarkupSegment::Plain(t) | MarkupSegment::Deleted(t) | MarkupSegment::Inserted(t) => t,
        }
    }
}

/// Splits a revised-sentence fragment into plain, deleted and inserted runs.
///
/// Spans carrying neither marker class, and any other tags, collapse to
/// plain text. Adjacent plain runs are merged; empty runs are dropped.
pub fn parse_markup(fragment: &str) -> Vec<MarkupSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in SPAN_RE.captures_iter(fragment) {
        let Some(whole) = caps.get(0) else { continue };
        push_plain(&mut segments, &fragment[cursor..whole.start()]);

        let classes = caps.get(1).map_or("", |m| m.as_str());
        let inner = clean_text(caps.get(2).map_or("", |m| m.as_str()));
        let has_class = |name: &str| classes.split_whitespace().any(|c| c == name);

        if has_class(DELETED_CLASS) {
            if !inner.is_empty() {
                segments.push(MarkupSegment::Deleted(inner));
            }
        } else if has_class(INSERTED_CLASS) {
            if !inner.is_empty() {
                segments.push(MarkupSegment::Inserted(inner));
            }
        } else {
            push_plain_text(&mut segments, inner);
        }
        cursor = whole.end();
    }
    push_plain(&mut segments, &fragment[cursor..]);
    segments
}

/// The sentence as it reads after applying the revision (deletions dropped).
pub fn revised_text(fragment: &str) -> String {
    parse_markup(fragment)
        .iter()
        .filter(|s| !matches!(s, MarkupSegment::Deleted(_)))
        .map(MarkupSegment::text)
        .collect()
}

fn push_plain(segments: &mut Vec<MarkupSegment>, raw: &str) {
    push_plain_text(segments, clean_text(raw));
}

fn push_plain_text(segments: &mut Vec<MarkupSegment>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(MarkupSegment::Plain(prev)) = segments.last_mut() {
        prev.push_str(&text);
    } else {
        segments.push(MarkupSegment::Plain(text));
    }
}

fn clean_text(raw: &str) -> String {
    unescape_entities(&TAG_RE.replace_all(raw, ""))
}

fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_deleted_and_inserted_spans() {
        let fragment = r#"This is a <span class="line-through">good</span> <span class="text-green-500">exceptional</span> work."#;
        assert_eq!(
            parse_markup(fragment),
            vec![
                MarkupSegment::Plain("This is a ".into()),
                MarkupSegment::Deleted("good".into()),
                MarkupSegment::Plain(" ".into()),
                MarkupSegment::Inserted("exceptional".into()),
                MarkupSegment::Plain(" work.".into()),
            ]
        );
    }

    #[test]
    fn accepts_single_quoted_classes() {
        let fragment = "hello <span class='text-green-500'>World</span>";
        assert_eq!(
            parse_markup(fragment),
            vec![
                MarkupSegment::Plain("hello ".into()),
                MarkupSegment::Inserted("World".into()),
            ]
        );
    }

    #[test]
    fn unknown_spans_and_tags_become_plain() {
        let fragment = r#"<b>Bold</b> and <span class="italic">quiet</span> text"#;
        assert_eq!(
            parse_markup(fragment),
            vec![MarkupSegment::Plain("Bold and quiet text".into())]
        );
    }

    #[test]
    fn entities_are_unescaped() {
        let fragment = r#"fish &amp; chips <span class="text-green-500">&quot;now&quot;</span>"#;
        assert_eq!(
            parse_markup(fragment),
            vec![
                MarkupSegment::Plain("fish & chips ".into()),
                MarkupSegment::Inserted("\"now\"".into()),
            ]
        );
    }

    #[test]
    fn revised_text_drops_deletions() {
        let fragment = r#"A <span class="line-through">big</span><span class="text-green-500">huge</span> dog"#;
        assert_eq!(revised_text(fragment), "A huge dog");
    }

    #[test]
    fn empty_fragment_has_no_segments() {
        assert!(parse_markup("").is_empty());
    }
}
