//! Merge command - fold another cookie file into the jar

use crate::cli::args::MergeArgs;
use crate::error::JarResult;
use crate::jar::{Jar, JarOptions};
use crate::ui::{self, UiContext};

/// Execute the merge command
pub fn execute(args: MergeArgs, options: JarOptions) -> JarResult<()> {
    let ctx = UiContext::detect();
    let jar = Jar::new(options);
    let imported = jar.import_from(&args.file)?;
    super::show_diagnostics(&ctx, &imported.diagnostics);

    let saved = jar.save()?;
    super::show_diagnostics(&ctx, &saved.diagnostics);

    ui::step_ok_detail(
        &ctx,
        &format!(
            "Merged {} cookie(s) from {}",
            imported.merged,
            args.file.display()
        ),
        &format!("{} in jar", saved.written),
    );
    Ok(())
}
