//! System instruction preparation.
//!
//! The operator-supplied instruction is extended with two formatting rules so
//! the model's first line can be used as the post title.

use std::path::Path;

use tracing::{debug, instrument};

use autopress_shared::{AutopressError, Result};

/// Rules appended to every system instruction.
pub const TITLE_RULES: &str = "\n\nFormatting rules:\n\
1. The first line of your answer must be the article title on its own line: \
a short, impactful title without any punctuation.\n\
2. Write the title itself. Never prefix it with a label such as \"Title:\".";

/// Append [`TITLE_RULES`] to an operator instruction.
pub fn decorate_instruction(raw: &str) -> String {
    format!("{}{TITLE_RULES}", raw.trim_end())
}

/// Read the instruction file and decorate it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_system_instruction(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| AutopressError::io(path, e))?;
    if raw.trim().is_empty() {
        return Err(AutopressError::input(format!(
            "system prompt file {} is empty",
            path.display()
        )));
    }
    debug!(chars = raw.len(), "system instruction loaded");
    Ok(decorate_instruction(&raw))
}
