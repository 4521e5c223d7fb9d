//! Check registry
//!
//! Every check implements [`Checker`]: a stable name used for selection, a
//! description for help output, and `check()` returning the number of
//! violations it found while writing one line per violation to
//! [`Diagnostics`].
//!
//! Checks are built per document through the constructors in
//! [`FZP_CHECKERS`] and [`SVG_CHECKERS`]. Constructors share one signature
//! per document kind, always receiving the source path as an `Option`;
//! checks that do not need it ignore it.

pub mod fzp;
pub mod svg;

use std::path::Path;

use crate::core::CheckOptions;
use crate::parser::Document;

pub use fzp::{
    ConnectorTerminalChecker, ConnectorVisibilityChecker, MissingTagsChecker,
    PcbConnectorStrokeChecker,
};
pub use svg::{FontSizeChecker, IdsChecker, ViewBoxChecker};

/// Diagnostic lines produced by checks, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    lines: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, String> {
        self.lines.drain(..)
    }
}

pub trait Checker {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Number of violations found. Each one is also reported on `diagnostics`.
    fn check(&self, diagnostics: &mut Diagnostics) -> usize;
}

/// What an FZP check is built from.
#[derive(Clone, Copy)]
pub struct FzpContext<'a> {
    pub doc: &'a Document,
    pub path: Option<&'a Path>,
    pub options: &'a CheckOptions,
}

/// What an SVG check is built from.
#[derive(Clone, Copy)]
pub struct SvgContext<'a> {
    pub doc: &'a Document,
    pub path: Option<&'a Path>,
    /// Layer ids the FZP declares for the view this SVG draws.
    pub layer_ids: &'a [String],
    pub options: &'a CheckOptions,
}

pub type FzpConstructor = for<'a> fn(FzpContext<'a>) -> Box<dyn Checker + 'a>;
pub type SvgConstructor = for<'a> fn(SvgContext<'a>) -> Box<dyn Checker + 'a>;

pub struct CheckerEntry<C> {
    pub name: &'static str,
    pub description: &'static str,
    pub build: C,
}

pub type FzpCheckerEntry = CheckerEntry<FzpConstructor>;
pub type SvgCheckerEntry = CheckerEntry<SvgConstructor>;

fn missing_tags<'a>(ctx: FzpContext<'a>) -> Box<dyn Checker + 'a> {
    Box::new(MissingTagsChecker::new(ctx))
}

fn connector_terminal<'a>(ctx: FzpContext<'a>) -> Box<dyn Checker + 'a> {
    Box::new(ConnectorTerminalChecker::new(ctx))
}

fn connector_visibility<'a>(ctx: FzpContext<'a>) -> Box<dyn Checker + 'a> {
    Box::new(ConnectorVisibilityChecker::new(ctx))
}

fn pcb_connector_stroke<'a>(ctx: FzpContext<'a>) -> Box<dyn Checker + 'a> {
    Box::new(PcbConnectorStrokeChecker::new(ctx))
}

fn font_size<'a>(ctx: SvgContext<'a>) -> Box<dyn Checker + 'a> {
    Box::new(FontSizeChecker::new(ctx))
}

fn viewbox<'a>(ctx: SvgContext<'a>) -> Box<dyn Checker + 'a> {
    Box::new(ViewBoxChecker::new(ctx))
}

fn ids<'a>(ctx: SvgContext<'a>) -> Box<dyn Checker + 'a> {
    Box::new(IdsChecker::new(ctx))
}

pub static FZP_CHECKERS: &[FzpCheckerEntry] = &[
    CheckerEntry {
        name: MissingTagsChecker::NAME,
        description: MissingTagsChecker::DESCRIPTION,
        build: missing_tags,
    },
    CheckerEntry {
        name: ConnectorTerminalChecker::NAME,
        description: ConnectorTerminalChecker::DESCRIPTION,
        build: connector_terminal,
    },
    CheckerEntry {
        name: ConnectorVisibilityChecker::NAME,
        description: ConnectorVisibilityChecker::DESCRIPTION,
        build: connector_visibility,
    },
    CheckerEntry {
        name: PcbConnectorStrokeChecker::NAME,
        description: PcbConnectorStrokeChecker::DESCRIPTION,
        build: pcb_connector_stroke,
    },
];

pub static SVG_CHECKERS: &[SvgCheckerEntry] = &[
    CheckerEntry {
        name: FontSizeChecker::NAME,
        description: FontSizeChecker::DESCRIPTION,
        build: font_size,
    },
    CheckerEntry {
        name: ViewBoxChecker::NAME,
        description: ViewBoxChecker::DESCRIPTION,
        build: viewbox,
    },
    CheckerEntry {
        name: IdsChecker::NAME,
        description: IdsChecker::DESCRIPTION,
        build: ids,
    },
];

pub fn fzp_checker(name: &str) -> Option<&'static FzpCheckerEntry> {
    FZP_CHECKERS.iter().find(|c| c.name == name)
}

pub fn svg_checker(name: &str) -> Option<&'static SvgCheckerEntry> {
    SVG_CHECKERS.iter().find(|c| c.name == name)
}

pub fn fzp_check_names() -> Vec<&'static str> {
    FZP_CHECKERS.iter().map(|c| c.name).collect()
}

pub fn svg_check_names() -> Vec<&'static str> {
    SVG_CHECKERS.iter().map(|c| c.name).collect()
}

/// FZP checks followed by SVG checks, in registry order.
pub fn all_check_names() -> Vec<&'static str> {
    let mut names = fzp_check_names();
    names.extend(svg_check_names());
    names
}

/// `'<path>'`, or `'<unknown>'` when the source path is not known.
pub(crate) fn display_path(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("'{}'", p.display()),
        None => "'<unknown>'".to_string(),
    }
}
