//! Terminal output for the `crumbjar` binary
//!
//! Uses `cliclack` for interactive output with automatic fallback to plain
//! text in CI/non-interactive environments.
//!
//! ```rust,ignore
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//! if ui::confirm(&ctx, "Delete all cookies?", false)? {
//!     ui::step_ok(&ctx, "Deleted 3 cookie(s)");
//! }
//! ```

mod context;
mod output;
mod prompts;

pub use context::UiContext;
pub use output::{intro, step_info, step_ok, step_ok_detail, step_warn, step_warn_hint};
pub use prompts::confirm;
