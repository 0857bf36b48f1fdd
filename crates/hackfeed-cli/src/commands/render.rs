//! Plain-text rendering of projected stories.

use std::fmt::Write as _;

use hackfeed_core::ViewItem;

/// One numbered block per story: title line, then byline with flags.
pub fn render_items(items: &[ViewItem]) -> String {
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        let star = if item.is_favorite { "★" } else { "☆" };
        let _ = write!(out, "{:>3}. {} {}", index + 1, star, item.story.title);
        if !item.hostname.is_empty() {
            let _ = write!(out, " ({})", item.hostname);
        }
        out.push('\n');

        let _ = write!(out, "       by {} [{}]", item.story.author, item.story.story_id);
        if item.is_own_story {
            out.push_str(" (yours)");
        }
        out.push('\n');
    }
    out
}
