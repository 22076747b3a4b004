//! The image-intent shortcut.
//!
//! A narrow, phrase-based detector that routes obvious image requests
//! straight to the image tool without a model round trip. It is the only
//! place the core does its own intent detection; everything else is the
//! model's job.

use plume_core::provider::MediaRef;
use plume_core::turn::{Role, Turn};

/// Phrases that trigger the shortcut when no custom list is configured.
pub const DEFAULT_IMAGE_PHRASES: &[&str] = &[
    "generate an image",
    "generate image",
    "create an image",
    "make an image",
    "draw a picture",
    "draw an image",
];

/// A detected image request, ready to hand to the image tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageShortcut {
    /// The full user text, used verbatim as the generation prompt.
    pub prompt: String,

    /// Attachments on the triggering turn, forwarded as reference media.
    pub references: Vec<MediaRef>,
}

/// Detects image intent in the latest user turn by case-insensitive
/// substring match against a configured phrase list.
#[derive(Debug, Clone)]
pub struct ShortcutDetector {
    phrases: Vec<String>,
}

impl ShortcutDetector {
    /// Build a detector from a custom phrase list. Phrases are matched
    /// case-insensitively; empty phrases are ignored.
    pub fn new(phrases: Vec<String>) -> Self {
        Self {
            phrases: phrases
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// Check a turn for image intent.
    ///
    /// Only user turns with non-empty text can trigger; the user's full text
    /// becomes the prompt unchanged, so detection is idempotent with respect
    /// to the prompt content.
    pub fn detect(&self, turn: &Turn) -> Option<ImageShortcut> {
        if turn.role != Role::User || turn.content.trim().is_empty() {
            return None;
        }

        let lowered = turn.content.to_lowercase();
        if self.phrases.iter().any(|p| lowered.contains(p)) {
            Some(ImageShortcut {
                prompt: turn.content.clone(),
                references: turn.attachments.clone(),
            })
        } else {
            None
        }
    }
}

impl Default for ShortcutDetector {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_PHRASES.iter().map(|p| p.to_string()).collect())
    }
}
