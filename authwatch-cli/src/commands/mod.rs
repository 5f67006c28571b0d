//! Command handlers -- one module per subcommand

pub mod analyze;
pub mod config;
pub mod watch;

use std::path::Path;

/// Render a path the way the pipeline config stores it.
pub(crate) fn path_string(path: &Path) -> String {
    path.display().to_string()
}
