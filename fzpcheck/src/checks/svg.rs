//! Checks run against one SVG asset of a part view.

use std::collections::HashMap;
use std::path::Path;

use crate::checks::{display_path, Checker, Diagnostics, SvgContext};
use crate::fzp::enclosing_layer;
use crate::parser::{Document, Element};
use crate::style::css::parse_declarations;
use crate::style::StyleSheet;

const ABSOLUTE_UNITS: &[&str] = &["px", "pt", "pc", "mm", "cm", "in", "q"];

/// `font-size` with an absolute unit, e.g. `12px` or `3.5pt`.
pub fn is_absolute_font_size(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    ABSOLUTE_UNITS.iter().any(|unit| {
        value
            .strip_suffix(unit)
            .is_some_and(|number| number.trim_end().parse::<f64>().is_ok())
    })
}

fn describe(element: &Element) -> String {
    match element.id() {
        Some(id) => format!("'{}'", id),
        None => format!("<{}>", element.name),
    }
}

fn layer_suffix(path: &[&Element], layer_ids: &[String]) -> String {
    match enclosing_layer(path, layer_ids) {
        Some(layer) => format!(" in layer '{}'", layer),
        None => String::new(),
    }
}

pub struct FontSizeChecker<'a> {
    doc: &'a Document,
    path: Option<&'a Path>,
    layer_ids: &'a [String],
}

impl<'a> FontSizeChecker<'a> {
    pub const NAME: &'static str = "font_size";
    pub const DESCRIPTION: &'static str =
        "Check that font-size values are unitless or relative (no px, pt, mm, ...)";

    pub fn new(ctx: SvgContext<'a>) -> Self {
        Self {
            doc: ctx.doc,
            path: ctx.path,
            layer_ids: ctx.layer_ids,
        }
    }
}

impl Checker for FontSizeChecker<'_> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn check(&self, diagnostics: &mut Diagnostics) -> usize {
        let file = display_path(self.path);
        let mut errors = 0;

        self.doc.root().walk(&mut |path| {
            let Some(&element) = path.last() else {
                return;
            };
            let mut values: Vec<&str> = element.attr("font-size").into_iter().collect();
            let inline = element
                .attr("style")
                .map(parse_declarations)
                .unwrap_or_default();
            values.extend(
                inline
                    .iter()
                    .filter(|d| d.property == "font-size")
                    .map(|d| d.value.as_str()),
            );

            for value in values.into_iter().filter(|v| is_absolute_font_size(v)) {
                diagnostics.emit(format!(
                    "Invalid font-size '{}' on element {}{} of SVG {}",
                    value,
                    describe(element),
                    layer_suffix(path, self.layer_ids),
                    file
                ));
                errors += 1;
            }
        });

        let sheet = StyleSheet::from_document(self.doc);
        for rule in sheet.rules() {
            for decl in &rule.declarations {
                if decl.property == "font-size" && is_absolute_font_size(&decl.value) {
                    diagnostics.emit(format!(
                        "Invalid font-size '{}' in stylesheet rule of SVG {}",
                        decl.value, file
                    ));
                    errors += 1;
                }
            }
        }
        errors
    }
}

pub struct ViewBoxChecker<'a> {
    doc: &'a Document,
    path: Option<&'a Path>,
}

impl<'a> ViewBoxChecker<'a> {
    pub const NAME: &'static str = "viewbox";
    pub const DESCRIPTION: &'static str =
        "Check that the root <svg> element has a valid viewBox (four numbers, positive width and height)";

    pub fn new(ctx: SvgContext<'a>) -> Self {
        Self {
            doc: ctx.doc,
            path: ctx.path,
        }
    }
}

/// `min-x min-y width height`, separated by whitespace and/or commas.
pub fn parse_viewbox(value: &str) -> Option<[f64; 4]> {
    let numbers: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok().filter(|n| n.is_finite()))
        .collect::<Option<_>>()?;
    match numbers.as_slice() {
        &[x, y, w, h] if w > 0.0 && h > 0.0 => Some([x, y, w, h]),
        _ => None,
    }
}

impl Checker for ViewBoxChecker<'_> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn check(&self, diagnostics: &mut Diagnostics) -> usize {
        let root = self.doc.root();
        let file = display_path(self.path);
        match root.attr("viewBox") {
            None => {
                diagnostics.emit(format!("Missing viewBox attribute on <{}> of SVG {}", root.name, file));
                1
            }
            Some(value) if parse_viewbox(value).is_none() => {
                diagnostics.emit(format!("Invalid viewBox '{}' on <{}> of SVG {}", value, root.name, file));
                1
            }
            Some(_) => 0,
        }
    }
}

pub struct IdsChecker<'a> {
    doc: &'a Document,
    path: Option<&'a Path>,
    layer_ids: &'a [String],
}

impl<'a> IdsChecker<'a> {
    pub const NAME: &'static str = "ids";
    pub const DESCRIPTION: &'static str = "Check that every id in the SVG is unique";

    pub fn new(ctx: SvgContext<'a>) -> Self {
        Self {
            doc: ctx.doc,
            path: ctx.path,
            layer_ids: ctx.layer_ids,
        }
    }
}

impl Checker for IdsChecker<'_> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    /// Every occurrence after the first of an id counts once.
    fn check(&self, diagnostics: &mut Diagnostics) -> usize {
        let file = display_path(self.path);
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut errors = 0;

        self.doc.root().walk(&mut |path| {
            let Some(id) = path.last().and_then(|e| e.id()) else {
                return;
            };
            let count = seen.entry(id).or_insert(0);
            *count += 1;
            if *count > 1 {
                diagnostics.emit(format!(
                    "Duplicate id '{}' (occurrence {}){} of SVG {}",
                    id,
                    count,
                    layer_suffix(path, self.layer_ids),
                    file
                ));
                errors += 1;
            }
        });
        errors
    }
}
