//! Command classifier - reduces a message's elements to one command

use crate::domain::entities::{CommandInvocation, CommandKind, Element};

/// Trim and fold the first full-width exclamation mark to ASCII
pub fn normalize(text: &str) -> String {
    text.trim().replacen('！', "!", 1)
}

/// Prefix-based classifier over the ordered elements of a message.
///
/// Text elements overwrite the pending command: a recognised prefix selects
/// its command, any other text resets it to `NoOp`. Images are captured as
/// payload wherever they appear. Only the last text element decides the
/// command, so a message carrying two commands runs the second one.
#[derive(Debug, Clone, Default)]
pub struct CommandClassifier {
    prefixes: Vec<(String, CommandKind)>,
}

impl CommandClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes are tried in the order they were added
    pub fn with_prefix(mut self, prefix: impl Into<String>, kind: CommandKind) -> Self {
        self.prefixes.push((prefix.into(), kind));
        self
    }

    /// Command selected by a single text element
    pub fn match_text(&self, text: &str) -> CommandKind {
        let cleaned = normalize(text);
        self.prefixes
            .iter()
            .find(|(prefix, _)| cleaned.starts_with(prefix.as_str()))
            .map(|(_, kind)| *kind)
            .unwrap_or(CommandKind::NoOp)
    }

    pub fn classify(&self, elements: &[Element]) -> CommandInvocation {
        elements
            .iter()
            .fold(CommandInvocation::noop(), |mut pending, element| {
                match element {
                    Element::Text(text) => pending.kind = self.match_text(text),
                    Element::Image(data) => pending.payload = Some(data.clone()),
                    Element::Other(_) => {}
                }
                pending
            })
    }
}
