//! Purge command - drop expired cookies from the file

use crate::error::JarResult;
use crate::jar::{Jar, JarOptions};
use crate::ui::{self, UiContext};

/// Execute the purge command
///
/// A save already merges the file, purges and rewrites it, so no separate
/// load is needed.
pub fn execute(options: JarOptions) -> JarResult<()> {
    let ctx = UiContext::detect();
    let jar = Jar::new(options);
    let report = jar.save()?;
    super::show_diagnostics(&ctx, &report.diagnostics);

    ui::step_ok_detail(
        &ctx,
        &format!("Purged {} expired cookie(s)", report.purged),
        &format!("{} remaining", report.written),
    );
    Ok(())
}
