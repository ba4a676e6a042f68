//! Clear command - delete every cookie

use crate::cli::args::ClearArgs;
use crate::error::JarResult;
use crate::jar::{Jar, JarOptions};
use crate::ui::{self, UiContext};
use chrono::Utc;

/// Execute the clear command
pub fn execute(args: ClearArgs, options: JarOptions) -> JarResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let jar = Jar::new(options);
    let loaded = jar.load()?;
    super::show_diagnostics(&ctx, &loaded.diagnostics);

    let now = Utc::now();
    let live = jar.entries().iter().filter(|e| !e.is_expired(now)).count();
    if live == 0 {
        ui::step_info(&ctx, "Jar is already empty");
        return Ok(());
    }

    let prompt = format!("Delete all {} cookie(s)?", live);
    if !ui::confirm(&ctx, &prompt, false)? {
        ui::step_warn_hint(&ctx, "Nothing deleted", "Use --yes to skip confirmation");
        return Ok(());
    }

    jar.remove_all(now);
    jar.save_at(now)?;
    ui::step_ok(&ctx, &format!("Deleted {} cookie(s)", live));
    Ok(())
}
