//! Style constants and emoji for terminal output.
//!
//! Trimmed to what this crate's error path actually renders: an error emoji
//! and a red-styled error line. The teacher's fuller message-kind palette
//! (success/warning/hint/progress/info, diff-addition/deletion styles,
//! section headings) has no caller here and was dropped in the trimming
//! pass — see DESIGN.md.

use color_print::cformat;

/// Error emoji: `cformat!("{ERROR_EMOJI} <red>message</>")`
pub const ERROR_EMOJI: &str = "❌";

/// Format an error message with emoji and red styling. Content can include
/// inner styling like `<bold>`.
pub fn error_message(content: impl AsRef<str>) -> String {
    cformat!("{ERROR_EMOJI} <red>{}</>", content.as_ref())
}
