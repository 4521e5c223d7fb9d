//! Computed style for the handful of properties that decide whether SVG
//! geometry is painted.
//!
//! Cascade order, lowest first: presentation attribute, stylesheet rule
//! (specificity, then source order), inline `style` attribute. Important
//! declarations sit above all normal ones, with inline important on top.

use std::collections::HashMap;

use crate::parser::{Document, Element};
use crate::style::css::{parse_declarations, StyleSheet};

const PROPERTIES: &[&str] = &[
    "display",
    "visibility",
    "opacity",
    "fill",
    "fill-opacity",
    "stroke",
    "stroke-opacity",
    "stroke-width",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    None,
    Color(String),
}

impl Paint {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "transparent" => Paint::None,
            _ => Paint::Color(value.trim().to_string()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Paint::None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display_none: bool,
    pub opacity: f64,
    pub visibility_hidden: bool,
    pub fill: Paint,
    pub fill_opacity: f64,
    pub stroke: Paint,
    pub stroke_opacity: f64,
    pub stroke_width: f64,
}

impl ComputedStyle {
    /// Initial values per SVG: black fill, no stroke, 1 unit stroke width.
    pub fn initial() -> Self {
        Self {
            display_none: false,
            opacity: 1.0,
            visibility_hidden: false,
            fill: Paint::Color("black".to_string()),
            fill_opacity: 1.0,
            stroke: Paint::None,
            stroke_opacity: 1.0,
            stroke_width: 1.0,
        }
    }

    /// Starting point for a child: inherited properties carried over,
    /// `display` and `opacity` reset.
    fn inherit(&self) -> Self {
        Self {
            display_none: false,
            opacity: 1.0,
            ..self.clone()
        }
    }

    pub fn fill_visible(&self) -> bool {
        !self.fill.is_none() && self.fill_opacity > 0.0
    }

    pub fn stroke_visible(&self) -> bool {
        !self.stroke.is_none() && self.stroke_opacity > 0.0 && self.stroke_width > 0.0
    }

    fn apply(&mut self, parent: &ComputedStyle, property: &str, value: &str) {
        let inherit = value.trim().eq_ignore_ascii_case("inherit");
        match property {
            "display" => {
                self.display_none = if inherit {
                    parent.display_none
                } else {
                    value.trim().eq_ignore_ascii_case("none")
                }
            }
            "visibility" => {
                self.visibility_hidden = if inherit {
                    parent.visibility_hidden
                } else {
                    matches!(
                        value.trim().to_ascii_lowercase().as_str(),
                        "hidden" | "collapse"
                    )
                }
            }
            "opacity" => {
                self.opacity = if inherit {
                    parent.opacity
                } else {
                    parse_opacity(value).unwrap_or(self.opacity)
                }
            }
            "fill" => {
                self.fill = if inherit { parent.fill.clone() } else { Paint::parse(value) }
            }
            "stroke" => {
                self.stroke = if inherit { parent.stroke.clone() } else { Paint::parse(value) }
            }
            "fill-opacity" => {
                self.fill_opacity = if inherit {
                    parent.fill_opacity
                } else {
                    parse_opacity(value).unwrap_or(self.fill_opacity)
                }
            }
            "stroke-opacity" => {
                self.stroke_opacity = if inherit {
                    parent.stroke_opacity
                } else {
                    parse_opacity(value).unwrap_or(self.stroke_opacity)
                }
            }
            "stroke-width" => {
                self.stroke_width = if inherit {
                    parent.stroke_width
                } else {
                    parse_length(value).unwrap_or(self.stroke_width)
                }
            }
            _ => {}
        }
    }
}

/// Leading number of a length or number value, ignoring any unit suffix.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    (1..=end)
        .rev()
        .find_map(|n| value[..n].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_opacity(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = parse_length(value)?;
    let number = if value.ends_with('%') { number / 100.0 } else { number };
    Some(number.clamp(0.0, 1.0))
}

/// Resolves computed styles for elements of one SVG document.
#[derive(Debug, Clone, Default)]
pub struct StyleResolver {
    sheet: StyleSheet,
}

impl StyleResolver {
    pub fn new(sheet: StyleSheet) -> Self {
        Self { sheet }
    }

    pub fn for_document(doc: &Document) -> Self {
        Self::new(StyleSheet::from_document(doc))
    }

    /// Computed style of the last element of `path`, given its parent's
    /// computed style. `path` runs from the document root.
    pub fn cascade(&self, parent: &ComputedStyle, path: &[&Element]) -> ComputedStyle {
        let mut style = parent.inherit();
        let Some(element) = path.last() else {
            return style;
        };
        for (property, value) in self.declared(element, path) {
            style.apply(parent, &property, &value);
        }
        style
    }

    /// Full fold from the root down to the last element of `path`.
    pub fn compute(&self, path: &[&Element]) -> ComputedStyle {
        (1..=path.len()).fold(ComputedStyle::initial(), |parent, n| {
            self.cascade(&parent, &path[..n])
        })
    }

    fn declared(&self, element: &Element, path: &[&Element]) -> HashMap<String, String> {
        // (important, origin, specificity, order, property, value)
        let mut entries = Vec::new();

        for (key, value) in &element.attributes {
            if PROPERTIES.contains(&key.as_str()) {
                entries.push((false, 0u8, Default::default(), 0usize, key.clone(), value.clone()));
            }
        }
        for matched in self.sheet.matching(path) {
            let decl = matched.declaration;
            if PROPERTIES.contains(&decl.property.as_str()) {
                entries.push((
                    decl.important,
                    1,
                    matched.specificity,
                    matched.order,
                    decl.property.clone(),
                    decl.value.clone(),
                ));
            }
        }
        if let Some(inline) = element.attr("style") {
            for (order, decl) in parse_declarations(inline).into_iter().enumerate() {
                if PROPERTIES.contains(&decl.property.as_str()) {
                    entries.push((
                        decl.important,
                        2,
                        Default::default(),
                        order,
                        decl.property,
                        decl.value,
                    ));
                }
            }
        }

        entries.sort_by(|a, b| (a.0, a.1, a.2, a.3).cmp(&(b.0, b.1, b.2, b.3)));
        entries
            .into_iter()
            .map(|(_, _, _, _, property, value)| (property, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_of(svg: &str, id: &str) -> ComputedStyle {
        let doc = Document::parse(svg).unwrap();
        let path = doc.root().path_to(&|e| e.id() == Some(id)).unwrap();
        StyleResolver::for_document(&doc).compute(&path)
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("2"), Some(2.0));
        assert_eq!(parse_length(" 0.5px "), Some(0.5));
        assert_eq!(parse_length("1em"), Some(1.0));
        assert_eq!(parse_length("-3.2mm"), Some(-3.2));
        assert_eq!(parse_length("1e2"), Some(100.0));
        assert_eq!(parse_length("auto"), None);
    }

    #[test]
    fn test_initial_values() {
        let style = style_of(r#"<svg><rect id="r"/></svg>"#, "r");
        assert!(style.fill_visible());
        assert!(!style.stroke_visible());
        assert_eq!(style.stroke_width, 1.0);
    }

    #[test]
    fn test_fill_inherits_from_group() {
        let style = style_of(r#"<svg><g fill="none"><rect id="r"/></g></svg>"#, "r");
        assert!(!style.fill_visible());
    }

    #[test]
    fn test_display_is_not_inherited() {
        let doc = Document::parse(r#"<svg><g style="display:none"><rect id="r"/></g></svg>"#).unwrap();
        let path = doc.root().path_to(&|e| e.id() == Some("r")).unwrap();
        let resolver = StyleResolver::for_document(&doc);
        let group = resolver.compute(&path[..2]);
        let rect = resolver.compute(&path);
        assert!(group.display_none);
        assert!(!rect.display_none);
    }

    #[test]
    fn test_stylesheet_overrides_presentation_attribute() {
        let style = style_of(
            r#"<svg><style>.pin { fill: #9a916c; }</style><rect id="r" class="pin" fill="none"/></svg>"#,
            "r",
        );
        assert!(style.fill_visible());
    }

    #[test]
    fn test_inline_style_overrides_stylesheet() {
        let style = style_of(
            r#"<svg><style>#r { stroke: red; stroke-width: 2 }</style><rect id="r" style="stroke-width:0"/></svg>"#,
            "r",
        );
        assert_eq!(style.stroke_width, 0.0);
        assert!(!style.stroke_visible());
    }

    #[test]
    fn test_important_beats_inline() {
        let style = style_of(
            r#"<svg><style>rect { fill: none !important }</style><rect id="r" style="fill:red"/></svg>"#,
            "r",
        );
        assert!(!style.fill_visible());
    }

    #[test]
    fn test_specificity_then_order() {
        let style = style_of(
            r#"<svg><style>#r { fill: red } .pin { fill: none } rect.pin { stroke: blue } .pin { stroke: none }</style><rect id="r" class="pin"/></svg>"#,
            "r",
        );
        assert!(style.fill_visible());
        assert_eq!(style.stroke, Paint::Color("blue".to_string()));
    }

    #[test]
    fn test_percentage_opacity() {
        let style = style_of(r#"<svg><rect id="r" style="fill-opacity:0%"/></svg>"#, "r");
        assert_eq!(style.fill_opacity, 0.0);
        assert!(!style.fill_visible());
    }
}
