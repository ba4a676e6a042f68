//! CLI command implementations

pub mod clear;
pub mod config;
pub mod key;
pub mod list;
pub mod merge;
pub mod purge;
pub mod remove;

pub use clear::execute as clear;
pub use config::execute as config;
pub use key::{fingerprint, keygen};
pub use list::execute as list;
pub use merge::execute as merge;
pub use purge::execute as purge;
pub use remove::execute as remove;

use crate::jar::Diagnostic;
use crate::ui::{self, UiContext};

/// Surface non-fatal problems found in the cookie file
fn show_diagnostics(ctx: &UiContext, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        ui::step_warn(ctx, &diagnostic.to_string());
    }
}
