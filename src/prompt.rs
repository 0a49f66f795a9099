//! Prompt construction
//!
//! A prompt is always: policy preamble, knowledge block, then the user turn.
//! Building is pure; the same inputs always produce the same text.

use std::fmt;

/// Instructions prepended to every prompt
pub const POLICY_PREAMBLE: &str = "You are the virtual travel concierge for a safari and hotel booking agency in East Africa.
Follow these rules strictly:
- Answer ONLY using the hotels, packages and contact details listed in the knowledge base below.
- If the answer is not in the knowledge base, say you don't have that information and share the contact details.
- Politely refuse questions unrelated to travel with us, and never discuss sensitive, personal, political or medical topics.
- Reply in the same language as the user: English or Swahili.
- Mention that custom itineraries are available on request when it is relevant.
- Keep answers short, friendly and accurate. Never invent prices, dates or availability.";

/// Fully rendered prompt text sent to the upstream model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Combine the policy preamble, rendered knowledge block and sanitized query
    pub fn build(knowledge: &str, query: &str) -> Self {
        Self(format!(
            "{POLICY_PREAMBLE}\n\nKnowledge base:\n{knowledge}\n\nUser: {query}\nAssistant:"
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
