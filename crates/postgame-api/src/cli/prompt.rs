//! `postgame prompt` -- offline preview of the assembled prompt.

use postgame_core::chat::prompt::assemble_prompt;
use postgame_infra::persona::load_persona;
use postgame_types::config::GatewayConfig;

/// Print the prompt a fresh session would send for `message`.
pub async fn preview_prompt(config: &GatewayConfig, message: &str) -> anyhow::Result<()> {
    let persona = load_persona(config.persona_path.as_deref()).await?;
    let prompt = assemble_prompt(&persona, &[], message);
    println!("{prompt}");
    Ok(())
}
