//! Message body with change tracking and the pre-save emoji hook.

use cf_fragment::{Fragment, FragmentParser};

use crate::emojifier::Emojifier;
use crate::error::EmojiError;

/// Rich-text body of a chat message.
///
/// Tracks whether the content changed since it was loaded or last saved.
/// Shortcodes are only rewritten for changed bodies, so rendering a stored
/// message never pays for substitution.
#[derive(Debug, Clone, Default)]
pub struct MessageBody {
    fragment: Fragment,
    changed: bool,
}

impl MessageBody {
    /// A new body, marked as changed.
    #[must_use]
    pub fn create(fragment: Fragment) -> Self {
        Self {
            fragment,
            changed: true,
        }
    }

    /// A body read back from storage, not marked as changed.
    #[must_use]
    pub fn load(fragment: Fragment) -> Self {
        Self {
            fragment,
            changed: false,
        }
    }

    /// Replace the content (an edit). Marks the body as changed.
    pub fn replace(&mut self, fragment: Fragment) {
        self.fragment = fragment;
        self.changed = true;
    }

    /// Current content.
    #[must_use]
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// Whether the content changed since load or the last save.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Clear the change flag once the body has been persisted.
    pub fn mark_saved(&mut self) {
        self.changed = false;
    }

    /// Run shortcode substitution before the body is persisted.
    ///
    /// Does nothing for unchanged or empty bodies. Returns `true` if the
    /// content was rewritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewritten markup cannot be parsed.
    pub fn before_save(
        &mut self,
        emojifier: &Emojifier,
        parser: &FragmentParser,
    ) -> Result<bool, EmojiError> {
        if !self.changed || self.fragment.is_empty() {
            return Ok(false);
        }

        match emojifier.substitute(&self.fragment, parser)? {
            Some(fragment) => {
                tracing::debug!("Rewrote emoji shortcodes in message body");
                self.fragment = fragment;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
