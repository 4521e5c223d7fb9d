//! Core checking logic shared by the CLI and library users.
//!
//! [`CheckerRunner`] drives one part file at a time:
//!
//! ```text
//! Idle -> Parsing -> RuleExecution -> [SvgResolution -> SvgRuleExecution] -> Reporting -> Idle
//! ```
//!
//! Document problems (malformed XML, missing SVG assets, views without
//! layers) become error counts plus a printed line, and never stop a batch.
//! Configuration problems (unknown check names) are returned as
//! [`FzpCheckError`].

use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checks::{
    fzp_checker, svg_checker, Diagnostics, FzpCheckerEntry, FzpContext, SvgCheckerEntry,
    SvgContext,
};
use crate::discovery::find_fzp_files_referencing;
use crate::fzp::{resolve_views, AssetLayout, ViewAsset};
use crate::parser::{Document, LoadError};

#[derive(Debug, thiserror::Error)]
pub enum FzpCheckError {
    #[error("Invalid check type: {name}")]
    UnknownCheck { name: String },
    #[error("No valid check types specified.")]
    NoChecksSelected,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid file list {path}: {message}")]
    BatchList { path: PathBuf, message: String },
}

/// Tags a part must declare, looked up anywhere below the `module` root.
pub const DEFAULT_REQUIRED_TAGS: &[&str] = &[
    "version",
    "author",
    "title",
    "label",
    "date",
    "tags",
    "properties",
    "description",
    "views",
    "connectors",
];

/// Options for check runs (CLI or library).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    pub verbose: bool,
    pub layout: AssetLayout,
    /// Stroke-only copper connectors must be drawn with a stroke wider than this.
    pub min_pcb_stroke_width: f64,
    pub required_tags: Vec<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            layout: AssetLayout::default(),
            min_pcb_stroke_width: 0.0,
            required_tags: DEFAULT_REQUIRED_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Checks selected for a run, split by document kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSelection {
    pub fzp: Vec<String>,
    pub svg: Vec<String>,
}

impl CheckSelection {
    /// Split requested names into FZP and SVG checks. `all` selects every
    /// registered check; names that match neither registry are dropped.
    /// Fails when nothing valid remains.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, FzpCheckError> {
        let all = names.iter().any(|n| n.as_ref() == "all");
        let mut selection = Self::default();
        for entry in crate::checks::FZP_CHECKERS {
            if all || names.iter().any(|n| n.as_ref() == entry.name) {
                selection.fzp.push(entry.name.to_string());
            }
        }
        for entry in crate::checks::SVG_CHECKERS {
            if all || names.iter().any(|n| n.as_ref() == entry.name) {
                selection.svg.push(entry.name.to_string());
            }
        }
        if selection.fzp.is_empty() && selection.svg.is_empty() {
            return Err(FzpCheckError::NoChecksSelected);
        }
        Ok(selection)
    }
}

fn lookup_fzp<S: AsRef<str>>(
    names: &[S],
) -> Result<Vec<&'static FzpCheckerEntry>, FzpCheckError> {
    names
        .iter()
        .map(|n| {
            fzp_checker(n.as_ref()).ok_or_else(|| FzpCheckError::UnknownCheck {
                name: n.as_ref().to_string(),
            })
        })
        .collect()
}

fn lookup_svg<S: AsRef<str>>(
    names: &[S],
) -> Result<Vec<&'static SvgCheckerEntry>, FzpCheckError> {
    names
        .iter()
        .map(|n| {
            svg_checker(n.as_ref()).ok_or_else(|| FzpCheckError::UnknownCheck {
                name: n.as_ref().to_string(),
            })
        })
        .collect()
}

/// Runs checks over part files and accumulates the error count.
///
/// Diagnostics go to `out` (stdout unless built with
/// [`CheckerRunner::with_writer`]).
pub struct CheckerRunner<W: Write = Stdout> {
    path: PathBuf,
    options: CheckOptions,
    total_errors: usize,
    out: W,
}

impl CheckerRunner<Stdout> {
    pub fn new(path: impl Into<PathBuf>, options: CheckOptions) -> Self {
        Self::with_writer(path, options, io::stdout())
    }
}

impl<W: Write> CheckerRunner<W> {
    pub fn with_writer(path: impl Into<PathBuf>, options: CheckOptions, out: W) -> Self {
        Self {
            path: path.into(),
            options,
            total_errors: 0,
            out,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Errors found by the last `check()` call.
    pub fn total_errors(&self) -> usize {
        self.total_errors
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) -> Result<(), FzpCheckError> {
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    fn flush_diagnostics(&mut self, diagnostics: &mut Diagnostics) -> Result<(), FzpCheckError> {
        for line in diagnostics.drain() {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    /// Check the current path with the given FZP and SVG checks. Returns the
    /// number of errors found, also available from
    /// [`total_errors`](Self::total_errors).
    pub fn check<S: AsRef<str>, T: AsRef<str>>(
        &mut self,
        fzp_checks: &[S],
        svg_checks: &[T],
    ) -> Result<usize, FzpCheckError> {
        self.total_errors = 0;
        let fzp_entries = lookup_fzp(fzp_checks)?;
        let svg_entries = lookup_svg(svg_checks)?;

        tracing::debug!(path = %self.path.display(), "parsing part");
        let fzp_doc = match Document::load(&self.path) {
            Ok(doc) => doc,
            Err(LoadError::Xml(e)) => {
                self.emit(&format!("Invalid XML: {}", e))?;
                self.total_errors += 1;
                return Ok(self.total_errors);
            }
            Err(LoadError::Io(e)) => {
                self.emit(&format!(
                    "Invalid XML: unable to read '{}': {}",
                    self.path.display(),
                    e
                ))?;
                self.total_errors += 1;
                return Ok(self.total_errors);
            }
        };

        if self.options.verbose {
            self.emit(&format!("Scanning file: {}", self.path.display()))?;
        }

        let path = self.path.clone();
        let options = self.options.clone();
        let mut diagnostics = Diagnostics::new();
        for entry in fzp_entries {
            let checker = (entry.build)(FzpContext {
                doc: &fzp_doc,
                path: Some(&path),
                options: &options,
            });
            if options.verbose {
                self.emit(&format!("Running check: {}", checker.name()))?;
            }
            let errors = checker.check(&mut diagnostics);
            tracing::debug!(check = checker.name(), errors, "check finished");
            self.flush_diagnostics(&mut diagnostics)?;
            self.total_errors += errors;
        }

        if !svg_entries.is_empty() {
            self.run_svg_checks(&fzp_doc, &svg_entries)?;
        }

        if self.options.verbose || self.total_errors > 0 {
            self.emit(&format!(
                "Total errors in {}: {}",
                self.path.display(),
                self.total_errors
            ))?;
        }
        Ok(self.total_errors)
    }

    fn run_svg_checks(
        &mut self,
        fzp_doc: &Document,
        svg_entries: &[&'static SvgCheckerEntry],
    ) -> Result<(), FzpCheckError> {
        let path = self.path.clone();
        let options = self.options.clone();

        for view in resolve_views(fzp_doc, &path, &options.layout) {
            let svg_path = match &view.asset {
                ViewAsset::MissingLayers => {
                    self.emit(&format!(
                        "Warning: No 'layers' element found in view '{}' of file '{}'",
                        view.view,
                        path.display()
                    ))?;
                    self.total_errors += 1;
                    continue;
                }
                ViewAsset::NoImage | ViewAsset::Template(_) => continue,
                ViewAsset::Svg(svg_path) => svg_path,
            };

            if !svg_path.is_file() {
                self.emit(&format!(
                    "Warning: SVG '{}' for view '{}' of file '{}' not found.",
                    svg_path.display(),
                    view.view,
                    path.display()
                ))?;
                self.total_errors += 1;
                continue;
            }

            // The SVG tree lives until the end of this iteration, whichever
            // way the iteration ends.
            let svg_doc = match Document::load(svg_path) {
                Ok(doc) => doc,
                Err(e) => {
                    self.emit(&format!("Invalid XML in SVG: {}", e))?;
                    self.total_errors += 1;
                    continue;
                }
            };

            let mut diagnostics = Diagnostics::new();
            for entry in svg_entries {
                let checker = (entry.build)(SvgContext {
                    doc: &svg_doc,
                    path: Some(svg_path.as_path()),
                    layer_ids: &view.layer_ids,
                    options: &options,
                });
                if options.verbose {
                    self.emit(&format!(
                        "Running SVG check: {} on {} for {}",
                        checker.name(),
                        svg_path.display(),
                        view.view
                    ))?;
                }
                let errors = checker.check(&mut diagnostics);
                self.flush_diagnostics(&mut diagnostics)?;
                self.total_errors += errors;
            }
        }
        Ok(())
    }

    /// Check every part file under `fzp_dir` that mentions the file name of
    /// `svg_file`. Returns the summed error count.
    pub fn search_and_check_fzp_files<S: AsRef<str>, T: AsRef<str>>(
        &mut self,
        svg_file: &Path,
        fzp_dir: &Path,
        fzp_checks: &[S],
        svg_checks: &[T],
    ) -> Result<usize, FzpCheckError> {
        let mut errors = 0;
        for fzp_file in find_fzp_files_referencing(svg_file, fzp_dir) {
            self.set_path(fzp_file);
            errors += self.check(fzp_checks, svg_checks)?;
        }
        Ok(errors)
    }

    /// Check each file in turn and return the summed error count.
    pub fn check_files<S: AsRef<str>, T: AsRef<str>>(
        &mut self,
        files: &[PathBuf],
        fzp_checks: &[S],
        svg_checks: &[T],
    ) -> Result<usize, FzpCheckError> {
        let mut errors = 0;
        for file in files {
            self.set_path(file.clone());
            errors += self.check(fzp_checks, svg_checks)?;
        }
        Ok(errors)
    }
}
