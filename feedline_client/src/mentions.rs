use std::sync::OnceLock;

use regex::Regex;

fn mention_pattern() -> &'static Regex {
    static MENTION: OnceLock<Regex> = OnceLock::new();
    MENTION.get_or_init(|| Regex::new(r"@[A-Za-z0-9_]+").expect("static pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// Includes the leading `@`.
    Mention(&'a str),
}

/// Splits post content into plain text and `@name` mentions, in order.
/// Concatenating the segments gives back the input.
pub fn segments(content: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for found in mention_pattern().find_iter(content) {
        if found.start() > last {
            out.push(Segment::Text(&content[last..found.start()]));
        }
        out.push(Segment::Mention(found.as_str()));
        last = found.end();
    }
    if last < content.len() {
        out.push(Segment::Text(&content[last..]));
    }
    out
}
