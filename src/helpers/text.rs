//! Plain-text helpers shared by post creation and rendering

/// Characters that carry markdown emphasis/heading/code meaning
const MARKUP_CHARS: [char; 3] = ['#', '*', '`'];

/// Remove markdown control characters (`#`, `*`, backtick)
pub fn strip_markup(s: &str) -> String {
    s.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect()
}

/// Build an excerpt from a markdown body: control characters stripped and
/// the first `length` characters kept. The ellipsis follows the length of
/// the raw body, so a long body full of markup still reads as cut.
pub fn excerpt(body: &str, length: usize) -> String {
    let kept: String = strip_markup(body).chars().take(length).collect();
    let kept = kept.trim();

    if body.chars().count() > length {
        format!("{}...", kept)
    } else {
        kept.to_string()
    }
}

/// Estimated reading time in minutes, never less than one
pub fn read_time(body: &str, chars_per_minute: usize) -> u32 {
    let chars = strip_markup(body).trim().chars().count();
    let per_minute = chars_per_minute.max(1);
    let minutes = chars.div_ceil(per_minute);
    minutes.max(1) as u32
}

/// Anchor id for a heading: lowercased, every run of non-alphanumeric
/// characters collapsed into a single hyphen, no leading/trailing hyphen.
pub fn anchor_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !id.is_empty() {
                id.push('-');
            }
            pending_dash = false;
            id.push(c);
        } else {
            pending_dash = true;
        }
    }

    id
}
