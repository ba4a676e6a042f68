//! Remove command - delete a single cookie

use crate::cli::args::RemoveArgs;
use crate::error::{JarError, JarResult};
use crate::jar::{Jar, JarOptions};
use crate::ui::{self, UiContext};
use chrono::Utc;
use console::style;

/// Execute the remove command
pub fn execute(args: RemoveArgs, options: JarOptions) -> JarResult<()> {
    let ctx = UiContext::detect();
    let jar = Jar::new(options);
    let loaded = jar.load()?;
    super::show_diagnostics(&ctx, &loaded.diagnostics);

    if !jar.remove(&args.domain, &args.path, &args.name, Utc::now()) {
        return Err(JarError::User(format!(
            "No cookie named '{}' for {}{}",
            args.name, args.domain, args.path
        )));
    }

    jar.save()?;
    ui::step_ok(
        &ctx,
        &format!(
            "Removed {} from {}{}",
            style(&args.name).cyan(),
            args.domain,
            args.path
        ),
    );
    Ok(())
}
