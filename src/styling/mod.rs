//! Terminal output styling, trimmed to the emoji/color message helpers the
//! core and CLI layer need.
//!
//! ## stdout vs stderr principle
//!
//! - **stdout**: primary data output (table rows, `--json`)
//! - **stderr**: status messages (progress, success, errors, hints, warnings)
//!
//! This separation allows piping (`sq list | grep foo`) without status
//! messages interfering. Use `println!` for primary output, `eprintln!` for
//! status messages.

mod constants;

pub use anstream::{eprintln, println};
pub use constants::*;
