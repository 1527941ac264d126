//! Fenced code block tracking for line-oriented passes.

/// Open fence: marker character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

/// Tracks whether a line-by-line scan is inside a fenced code block.
///
/// Fences are three or more backticks or tildes, indented at most three
/// spaces. A fence closes on a line made of the same marker, at least as
/// long as the opener, with nothing but whitespace after it.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<Fence>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed the next line. Returns `true` if it opened or closed a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let Some(fence) = parse_fence(line) else {
            return false;
        };

        match self.open {
            Some(open) => {
                let closes = fence.marker == open.marker
                    && fence.len >= open.len
                    && line.trim_start()[fence.len..].trim().is_empty();
                if closes {
                    self.open = None;
                }
                closes
            }
            None => {
                self.open = Some(fence);
                true
            }
        }
    }
}

fn parse_fence(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }

    let marker = trimmed.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = trimmed.chars().take_while(|&c| c == marker).count();
    if len < 3 {
        return None;
    }

    // A backtick fence's info string may not contain backticks.
    if marker == '`' && trimmed[len..].contains('`') {
        return None;
    }

    Some(Fence { marker, len })
}
