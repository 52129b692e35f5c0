//! Merges backend highlight fragments into message text and sanitizes the result.
//!
//! Each fragment is a piece of the message text with matched spans wrapped in
//! `<em>`. Fragments are merged by replacing the first occurrence of their
//! literal text in the working copy, strictly in the order supplied. When a
//! literal occurs more than once, the earliest occurrence is marked even if
//! the backend meant a later one; the protocol carries no offsets to do better.
//! Occurrences that overlap `<em>` markup inserted by an earlier fragment are
//! passed over.
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;

use ammonia::Builder;

pub const EMPHASIS_OPEN: &str = "<em>";
pub const EMPHASIS_CLOSE: &str = "</em>";

static EMPHASIS_ONLY: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut b = Builder::default();
    b.tags(HashSet::from(["em"]));
    b.generic_attributes(HashSet::new());
    b.tag_attributes(HashMap::new());
    b.link_rel(None);
    b
});

/// A run of display text, emphasized or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub text: String,
    pub emphasized: bool,
}

/// Sanitized message text with highlights applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightedText {
    /// Safe HTML in which `<em>` is the only element.
    pub html: String,
}

impl HighlightedText {
    /// Splits the sanitized HTML into plain-text runs.
    pub fn segments(&self) -> Vec<TextSegment> {
        let mut segments = Vec::new();
        let mut depth = 0usize;
        let mut rest = self.html.as_str();
        loop {
            let open = rest.find(EMPHASIS_OPEN);
            let close = rest.find(EMPHASIS_CLOSE);
            let (index, tag_len, delta) = match (open, close) {
                (Some(o), Some(c)) if o < c => (o, EMPHASIS_OPEN.len(), 1isize),
                (Some(o), None) => (o, EMPHASIS_OPEN.len(), 1),
                (_, Some(c)) => (c, EMPHASIS_CLOSE.len(), -1),
                (None, None) => {
                    push_segment(&mut segments, rest, depth > 0);
                    break;
                }
            };
            push_segment(&mut segments, &rest[..index], depth > 0);
            depth = depth.saturating_add_signed(delta);
            rest = &rest[index + tag_len..];
        }
        segments
    }

    /// Text with all markup removed and entities decoded.
    pub fn plain_text(&self) -> String {
        self.segments().into_iter().map(|s| s.text).collect()
    }
}

fn push_segment(segments: &mut Vec<TextSegment>, html: &str, emphasized: bool) {
    if html.is_empty() {
        return;
    }
    let text = html_escape::decode_html_entities(html).into_owned();
    match segments.last_mut() {
        Some(last) if last.emphasized == emphasized => last.text.push_str(&text),
        _ => segments.push(TextSegment { text, emphasized }),
    }
}

/// Strips the emphasis markers from a fragment.
pub fn fragment_literal(fragment: &str) -> String {
    fragment.replace(EMPHASIS_OPEN, "").replace(EMPHASIS_CLOSE, "")
}

/// Returns the working copy of `text` with each fragment merged in.
///
/// Fragments whose literal text does not occur are skipped.
pub fn merge_highlights(text: &str, highlight: Option<&[String]>) -> String {
    let mut working = text.to_string();
    for fragment in highlight.unwrap_or_default() {
        let literal = fragment_literal(fragment);
        if literal.is_empty() {
            continue;
        }
        if let Some(index) = first_outside_markup(&working, &literal) {
            working.replace_range(index..index + literal.len(), fragment);
        }
    }
    working
}

fn first_outside_markup(working: &str, literal: &str) -> Option<usize> {
    let tags: Vec<Range<usize>> = [EMPHASIS_OPEN, EMPHASIS_CLOSE]
        .iter()
        .flat_map(|tag| working.match_indices(tag))
        .map(|(start, tag)| start..start + tag.len())
        .collect();
    working
        .match_indices(literal)
        .map(|(start, _)| start)
        .find(|&start| {
            let end = start + literal.len();
            !tags.iter().any(|tag| start < tag.end && tag.start < end)
        })
}

/// Merges highlights and sanitizes the result so only emphasis survives.
pub fn render_highlighted(text: &str, highlight: Option<&[String]>) -> HighlightedText {
    let working = merge_highlights(text, highlight);
    HighlightedText {
        html: EMPHASIS_ONLY.clean(&working).to_string(),
    }
}
