//! Checks run against the FZP document of a part.
//!
//! `missing_tags` looks at the FZP alone. The connector checks also open the
//! SVG of each view, which is why they need the part's path.

use std::path::Path;

use crate::checks::{display_path, Checker, Diagnostics, FzpContext};
use crate::core::CheckOptions;
use crate::fzp::{connector_refs, for_each_view_svg, locate_in_layer};
use crate::parser::Document;
use crate::style::visibility::is_degenerate;
use crate::style::{
    connector_visibility, displayed_shapes, fold_ancestors, StyleResolver, Visibility,
};

pub struct MissingTagsChecker<'a> {
    doc: &'a Document,
    path: Option<&'a Path>,
    options: &'a CheckOptions,
}

impl<'a> MissingTagsChecker<'a> {
    pub const NAME: &'static str = "missing_tags";
    pub const DESCRIPTION: &'static str =
        "Check that the part declares every required tag (module, title, version, views, connectors, ...)";

    pub fn new(ctx: FzpContext<'a>) -> Self {
        Self {
            doc: ctx.doc,
            path: ctx.path,
            options: ctx.options,
        }
    }
}

impl Checker for MissingTagsChecker<'_> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn check(&self, diagnostics: &mut Diagnostics) -> usize {
        let root = self.doc.root();
        let file = display_path(self.path);
        let mut errors = 0;

        if root.name != "module" {
            diagnostics.emit(format!(
                "Missing required tag 'module' (root element is <{}>) in file {}",
                root.name, file
            ));
            errors += 1;
        }

        for tag in &self.options.required_tags {
            if !root.descendants().skip(1).any(|e| e.name == *tag) {
                diagnostics.emit(format!("Missing required tag '{}' in file {}", tag, file));
                errors += 1;
            }
        }
        errors
    }
}

pub struct ConnectorTerminalChecker<'a> {
    doc: &'a Document,
    path: Option<&'a Path>,
    options: &'a CheckOptions,
}

impl<'a> ConnectorTerminalChecker<'a> {
    pub const NAME: &'static str = "connector_terminal";
    pub const DESCRIPTION: &'static str =
        "Check that every connector's svgId and terminalId exist in the SVG layer of each view it declares";

    pub fn new(ctx: FzpContext<'a>) -> Self {
        Self {
            doc: ctx.doc,
            path: ctx.path,
            options: ctx.options,
        }
    }
}

impl Checker for ConnectorTerminalChecker<'_> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn check(&self, diagnostics: &mut Diagnostics) -> usize {
        let Some(fzp_path) = self.path else {
            tracing::debug!("{} needs the part path, skipping", Self::NAME);
            return 0;
        };
        let mut errors = 0;

        for_each_view_svg(self.doc, fzp_path, &self.options.layout, |view, svg| {
            for connector in connector_refs(self.doc, &view.view) {
                if connector.hybrid {
                    continue;
                }
                let references = [
                    ("graphic", connector.svg_id),
                    ("terminal", connector.terminal_id),
                ];
                for (kind, id) in references {
                    let Some(id) = id else {
                        continue;
                    };
                    if locate_in_layer(svg, connector.layer, id).is_none() {
                        diagnostics.emit(format!(
                            "Connector '{}' references missing {} '{}' in layer '{}' of view '{}' of file '{}'",
                            connector.connector_id,
                            kind,
                            id,
                            connector.layer,
                            view.view,
                            fzp_path.display()
                        ));
                        errors += 1;
                    }
                }
            }
        });
        errors
    }
}

pub struct ConnectorVisibilityChecker<'a> {
    doc: &'a Document,
    path: Option<&'a Path>,
    options: &'a CheckOptions,
}

impl<'a> ConnectorVisibilityChecker<'a> {
    pub const NAME: &'static str = "connector_visibility";
    pub const DESCRIPTION: &'static str =
        "Check that every connector graphic is actually rendered (not hidden by styling, an ancestor, or empty geometry)";

    pub fn new(ctx: FzpContext<'a>) -> Self {
        Self {
            doc: ctx.doc,
            path: ctx.path,
            options: ctx.options,
        }
    }
}

impl Checker for ConnectorVisibilityChecker<'_> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn check(&self, diagnostics: &mut Diagnostics) -> usize {
        let Some(fzp_path) = self.path else {
            tracing::debug!("{} needs the part path, skipping", Self::NAME);
            return 0;
        };
        let mut errors = 0;

        for_each_view_svg(self.doc, fzp_path, &self.options.layout, |view, svg| {
            let resolver = StyleResolver::for_document(svg);
            for connector in connector_refs(self.doc, &view.view) {
                if connector.hybrid {
                    continue;
                }
                let Some(svg_id) = connector.svg_id else {
                    continue;
                };
                // Unresolved ids belong to connector_terminal.
                let Some(path) = locate_in_layer(svg, connector.layer, svg_id) else {
                    continue;
                };
                if let Visibility::Hidden(reason) = connector_visibility(&resolver, &path) {
                    tracing::trace!(connector = svg_id, ?reason, "connector not rendered");
                    diagnostics.emit(format!(
                        "Invisible connector '{}' in layer '{}' of file '{}'",
                        svg_id,
                        connector.layer,
                        fzp_path.display()
                    ));
                    errors += 1;
                }
            }
        });
        errors
    }
}

pub struct PcbConnectorStrokeChecker<'a> {
    doc: &'a Document,
    path: Option<&'a Path>,
    options: &'a CheckOptions,
}

impl<'a> PcbConnectorStrokeChecker<'a> {
    pub const NAME: &'static str = "pcb_connector_stroke";
    pub const DESCRIPTION: &'static str =
        "Check that copper connectors drawn only by their outline use a stroke wide enough to solder";

    pub fn new(ctx: FzpContext<'a>) -> Self {
        Self {
            doc: ctx.doc,
            path: ctx.path,
            options: ctx.options,
        }
    }
}

impl Checker for PcbConnectorStrokeChecker<'_> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn check(&self, diagnostics: &mut Diagnostics) -> usize {
        let Some(fzp_path) = self.path else {
            tracing::debug!("{} needs the part path, skipping", Self::NAME);
            return 0;
        };
        let min_width = self.options.min_pcb_stroke_width;
        let mut errors = 0;

        for_each_view_svg(self.doc, fzp_path, &self.options.layout, |view, svg| {
            if view.view != "pcbView" {
                return;
            }
            let resolver = StyleResolver::for_document(svg);
            for connector in connector_refs(self.doc, &view.view) {
                if connector.hybrid || !connector.layer.starts_with("copper") {
                    continue;
                }
                let Some(svg_id) = connector.svg_id else {
                    continue;
                };
                let Some(path) = locate_in_layer(svg, connector.layer, svg_id) else {
                    continue;
                };
                // Hidden connectors are connector_visibility's concern.
                let Ok(style) = fold_ancestors(&resolver, &path) else {
                    continue;
                };

                let thinnest = displayed_shapes(&resolver, &path, &style)
                    .iter()
                    .filter(|s| !s.style.visibility_hidden && !is_degenerate(s.element))
                    .filter(|s| !s.style.fill_visible() && !s.style.stroke.is_none())
                    .map(|s| s.style.stroke_width)
                    .filter(|w| *w <= min_width)
                    .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |a| a.min(w))));

                if let Some(width) = thinnest {
                    diagnostics.emit(format!(
                        "Connector '{}' in layer '{}' of file '{}' is drawn with stroke-width {} (must be greater than {})",
                        svg_id,
                        connector.layer,
                        fzp_path.display(),
                        width,
                        min_width
                    ));
                    errors += 1;
                }
            }
        });
        errors
    }
}
