//! Persona loading.
//!
//! The built-in NFL player persona ships inside the binary. A TOML file with
//! `system_instructions` and `example_transcript` can replace it at startup.

use std::path::Path;

use postgame_types::error::ConfigError;
use postgame_types::persona::PersonaConfig;

const BUILTIN_PERSONA: &str = include_str!("../assets/nfl_persona.toml");

/// The persona compiled into the binary.
pub fn builtin_persona() -> Result<PersonaConfig, ConfigError> {
    parse_persona(BUILTIN_PERSONA, "<builtin>")
}

/// Load the persona from `path`, or the built-in one when `path` is `None`.
///
/// Unlike the gateway config, a persona file that was asked for but cannot
/// be read or parsed is an error: running with the wrong character is worse
/// than not starting.
pub async fn load_persona(path: Option<&Path>) -> Result<PersonaConfig, ConfigError> {
    let Some(path) = path else {
        return builtin_persona();
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
    let persona = parse_persona(&content, &path.display().to_string())?;
    tracing::info!(path = %path.display(), "Loaded persona");
    Ok(persona)
}

fn parse_persona(content: &str, origin: &str) -> Result<PersonaConfig, ConfigError> {
    let persona: PersonaConfig = toml::from_str(content).map_err(|err| ConfigError::Parse {
        path: origin.to_string(),
        message: err.to_string(),
    })?;

    if persona.system_instructions.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "{origin}: system_instructions is empty"
        )));
    }
    Ok(persona)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_persona_parses() {
        let persona = builtin_persona().unwrap();
        assert!(persona.system_instructions.starts_with("You are an NFL player"));
        assert!(persona.system_instructions.contains("ANTI-JAILBREAK PROTOCOL"));
        assert!(persona.example_transcript.starts_with("Example interviews:"));
        assert!(!persona.example_transcript.ends_with('\n'));
    }

    #[tokio::test]
    async fn load_persona_without_path_is_builtin() {
        let persona = load_persona(None).await.unwrap();
        assert_eq!(persona, builtin_persona().unwrap());
    }

    #[tokio::test]
    async fn load_persona_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("persona.toml");
        tokio::fs::write(
            &path,
            "system_instructions = \"Be a coach.\"\nexample_transcript = \"Reporter: hi\"\n",
        )
        .await
        .unwrap();

        let persona = load_persona(Some(&path)).await.unwrap();
        assert_eq!(persona.system_instructions, "Be a coach.");
    }

    #[tokio::test]
    async fn load_persona_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_persona(Some(&tmp.path().join("missing.toml"))).await;
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[tokio::test]
    async fn load_persona_blank_instructions_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("persona.toml");
        tokio::fs::write(&path, "system_instructions = \"  \"\nexample_transcript = \"\"\n")
            .await
            .unwrap();
        let result = load_persona(Some(&path)).await;
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
