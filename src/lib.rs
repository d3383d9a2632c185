//! Speaks Go source code aloud as a stream of short English phrases.
//!
//! The crate parses a Go file into an arena-allocated syntax tree, walks it
//! depth-first and narrates each construct ("function main", "taking no
//! parameters", "range over items"), optionally restricted to one function
//! or an inclusive line range. The transcript is handed to the platform
//! `say` command, or returned as text.
//!
//! ```no_run
//! use gonarrate::{Narrator, NarratorOptions};
//!
//! let mut narrator = Narrator::new(NarratorOptions {
//!     quiet: true,
//!     ..Default::default()
//! });
//! let text = narrator.narrate_str("package main\n\nfunc main() {}\n")?;
//! assert!(text.starts_with("package main"));
//! # Ok::<(), gonarrate::NarrateError>(())
//! ```

pub mod ast;
pub mod backend;
pub mod error;
pub mod lexer;
pub mod narrator;
pub mod parser;
pub mod phonetic;
pub mod source;
pub mod speech;
pub mod window;

pub use error::{Diag, NarrateError};
pub use narrator::{Narrator, NarratorOptions};
pub use parser::parse_source;
pub use window::Window;
