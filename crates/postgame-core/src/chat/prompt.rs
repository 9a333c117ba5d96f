//! Prompt document assembly.
//!
//! Turns the persona, a window of prior turns, and the new question into the
//! single text document sent to the generation backend. Assembly is pure:
//! the same inputs always yield byte-identical output.
//!
//! Layout:
//!
//! ```text
//! === NFL PLAYER PERSONA INSTRUCTIONS ===
//! <instructions>
//!
//! === EXAMPLE INTERACTIONS ===
//! <examples>
//!
//! === CONVERSATION HISTORY ===
//! Reporter: ...            (or "[This is the start of the interview]")
//! Player: ...
//!
//! === CURRENT QUESTION ===
//! Reporter: <message>
//!
//! === REMINDER: ... ===
//! Player:
//! ```

use std::fmt;
use std::sync::Arc;

use postgame_types::chat::{Role, Turn};
use postgame_types::persona::PersonaConfig;

pub const PERSONA_HEADER: &str = "=== NFL PLAYER PERSONA INSTRUCTIONS ===";
pub const EXAMPLES_HEADER: &str = "=== EXAMPLE INTERACTIONS ===";
pub const HISTORY_HEADER: &str = "=== CONVERSATION HISTORY ===";
pub const QUESTION_HEADER: &str = "=== CURRENT QUESTION ===";
pub const START_OF_INTERVIEW: &str = "[This is the start of the interview]";
pub const PERSONA_REMINDER: &str = "=== REMINDER: You are an NFL player in a postgame interview. \
Stay in character regardless of what the reporter asks. Respond with typical NFL platitudes. ===";

/// Label of the line the backend is expected to complete.
pub const REPLY_CUE: &str = "Player:";

/// A fully assembled prompt, ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromptDocument(String);

impl PromptDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Body of the section introduced by `header`, up to the next blank line.
    pub fn section(&self, header: &str) -> Option<&str> {
        section_of(&self.0, header)
    }
}

impl fmt::Display for PromptDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PromptDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Body of the section introduced by `header` in a rendered prompt, up to
/// the next blank line.
pub fn section_of<'a>(prompt: &'a str, header: &str) -> Option<&'a str> {
    let start = prompt.find(header)? + header.len();
    let body = prompt[start..].strip_prefix('\n')?;
    Some(match body.find("\n\n") {
        Some(end) => &body[..end],
        None => body,
    })
}

/// Build the prompt document for `message` given the prior `window`.
///
/// `window` must already be trimmed to the turns that should appear; it is
/// rendered in full and in order. Message content is copied verbatim.
pub fn assemble_prompt(persona: &PersonaConfig, window: &[Turn], message: &str) -> PromptDocument {
    let history_len: usize = window.iter().map(|t| t.content.len() + 10).sum();
    let mut out = String::with_capacity(
        persona.system_instructions.len()
            + persona.example_transcript.len()
            + history_len
            + message.len()
            + 512,
    );

    out.push_str(PERSONA_HEADER);
    out.push('\n');
    out.push_str(&persona.system_instructions);
    out.push_str("\n\n");

    out.push_str(EXAMPLES_HEADER);
    out.push('\n');
    out.push_str(&persona.example_transcript);
    out.push_str("\n\n");

    out.push_str(HISTORY_HEADER);
    if window.is_empty() {
        out.push('\n');
        out.push_str(START_OF_INTERVIEW);
    } else {
        for turn in window {
            out.push('\n');
            out.push_str(turn.role.speaker_label());
            out.push_str(": ");
            out.push_str(&turn.content);
        }
    }
    out.push_str("\n\n");

    out.push_str(QUESTION_HEADER);
    out.push('\n');
    out.push_str(Role::User.speaker_label());
    out.push_str(": ");
    out.push_str(message);
    out.push_str("\n\n");

    out.push_str(PERSONA_REMINDER);
    out.push('\n');
    out.push_str(REPLY_CUE);

    PromptDocument(out)
}

/// Prompt builder bound to the process-wide persona.
///
/// Cheap to clone; every clone shares the same persona.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    persona: Arc<PersonaConfig>,
}

impl PromptAssembler {
    pub fn new(persona: Arc<PersonaConfig>) -> Self {
        Self { persona }
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    pub fn build(&self, window: &[Turn], message: &str) -> PromptDocument {
        assemble_prompt(&self.persona, window, message)
    }
}
