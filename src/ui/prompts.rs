//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{JarError, JarResult};

/// Prompt for confirmation, returns default if non-interactive or auto-yes
pub fn confirm(ctx: &UiContext, message: &str, default: bool) -> JarResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    cliclack::confirm(message)
        .initial_value(default)
        .interact()
        .map_err(|e| JarError::User(format!("Prompt failed: {}", e)))
}
