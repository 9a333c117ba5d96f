//! Persona configuration: the fixed character every session talks to.

use serde::{Deserialize, Serialize};

/// Static instructions and example dialogue defining the assistant's character.
///
/// Loaded once at startup and shared read-only by every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Role instructions placed at the top of every prompt.
    pub system_instructions: String,
    /// Few-shot transcript showing the expected answering style.
    pub example_transcript: String,
}

impl PersonaConfig {
    pub fn new(
        system_instructions: impl Into<String>,
        example_transcript: impl Into<String>,
    ) -> Self {
        Self {
            system_instructions: system_instructions.into(),
            example_transcript: example_transcript.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_deserialize() {
        let toml_str = r#"
system_instructions = "Stay humble."
example_transcript = """
Reporter: "How was the game?"
Player: "One game at a time."
"""
"#;
        let persona: PersonaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(persona.system_instructions, "Stay humble.");
        assert!(persona.example_transcript.contains("One game at a time."));
    }
}
