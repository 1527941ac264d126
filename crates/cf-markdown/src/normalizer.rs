//! List boundary normalization.
//!
//! Chat users type lists straight after a line of prose ("Todo:\n- a\n- b")
//! and carry on writing right after the last item. The renderer needs a
//! blank line around a list block to treat it as one, so this pass inserts
//! those blank lines. Original lines are never changed, dropped or
//! reordered, and lines inside fenced code are left alone.

use std::sync::LazyLock;

use regex::Regex;

use crate::fence::FenceTracker;

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\*|-|\d+\.)[ \t]").expect("invalid list item regex"));

/// Insert blank lines before and after every list block.
#[must_use]
pub fn normalize_lists(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut fence = FenceTracker::new();
    let mut in_list = false;

    for line in text.split('\n') {
        let in_code = fence.in_fence();
        let is_fence = fence.update(line);
        if in_code {
            lines.push(line);
            continue;
        }

        let is_blank = line.trim().is_empty();
        let is_item = !is_fence && LIST_ITEM.is_match(line);

        if is_blank {
            in_list = false;
        } else if is_item && !in_list {
            if lines.last().is_some_and(|prev| !prev.trim().is_empty()) {
                lines.push("");
            }
            in_list = true;
        } else if !is_item && in_list {
            lines.push("");
            in_list = false;
        }

        lines.push(line);
    }

    lines.join("\n")
}
