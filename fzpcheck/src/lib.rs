//! fzpcheck - structural and semantic checks for Fritzing part files
//!
//! A Fritzing part is an FZP document (XML metadata, views, connectors) plus
//! one SVG per view. This library parses both, resolves the SVG asset of each
//! view, and runs named checks that report one line per violation and an
//! error count.
//!
//! # Quick Start
//!
//! ```no_run
//! use fzpcheck::{CheckOptions, CheckerRunner};
//!
//! let mut runner = CheckerRunner::new("core/led.fzp", CheckOptions::default());
//! let errors = runner
//!     .check(&["missing_tags", "connector_visibility"], &["viewbox", "ids"])
//!     .unwrap();
//! println!("{} errors", errors);
//! ```
//!
//! # Checks
//!
//! - **FZP**: `missing_tags`, `connector_terminal`, `connector_visibility`,
//!   `pcb_connector_stroke`
//! - **SVG**: `font_size`, `viewbox`, `ids`

pub mod checks;
pub mod core;
pub mod discovery;
pub mod fzp;
pub mod parser;
pub mod style;

pub use checks::{
    all_check_names, fzp_check_names, svg_check_names, Checker, Diagnostics, FzpContext,
    SvgContext, FZP_CHECKERS, SVG_CHECKERS,
};
pub use core::{CheckOptions, CheckSelection, CheckerRunner, FzpCheckError, DEFAULT_REQUIRED_TAGS};
pub use discovery::{
    find_fzp_files_referencing, list_fzp_files, read_batch_list, resolve_targets, Targets,
};
pub use fzp::{AssetLayout, ResolvedView, ViewAsset};
pub use parser::{Document, Element, LoadError, XmlError};

/// Commonly used items.
pub mod prelude {
    pub use crate::checks::{Checker, Diagnostics};
    pub use crate::core::{CheckOptions, CheckSelection, CheckerRunner, FzpCheckError};
    pub use crate::discovery::{resolve_targets, Targets};
    pub use crate::parser::{Document, Element};
}

/// Parse an FZP or SVG file (convenience wrapper).
pub fn load_document(path: &std::path::Path) -> Result<Document, LoadError> {
    Document::load(path)
}
