//! Renderability of connector graphics
//!
//! Visibility is decided in two passes over an immutable tree:
//!
//! 1. A fold along the ancestor path, from the document root down to the
//!    connector element, computing styles as it goes. The first element that
//!    forces its subtree hidden (`display:none`, `opacity:0`) ends the fold:
//!    nothing below it can be made visible again.
//! 2. A walk of the connector's own subtree collecting the shapes that are
//!    still displayed. The connector is visible when at least one of those
//!    shapes has non-degenerate geometry and a visible fill or stroke.
//!
//! `visibility:hidden` is inherited but, unlike `display:none`, a descendant
//! may set `visibility:visible` and show itself again.

use crate::parser::Element;
use crate::style::cascade::{parse_length, ComputedStyle, StyleResolver};

/// Elements whose content never renders in place.
const NON_RENDERING: &[&str] = &[
    "defs",
    "title",
    "desc",
    "metadata",
    "style",
    "script",
    "clipPath",
    "mask",
    "marker",
    "pattern",
    "symbol",
    "linearGradient",
    "radialGradient",
    "filter",
];

const SHAPES: &[&str] = &[
    "rect", "circle", "ellipse", "line", "polyline", "polygon", "path", "text", "use", "image",
];

#[derive(Debug, Clone, PartialEq)]
pub enum HiddenReason {
    /// `display:none` on the named element (the connector or an ancestor).
    DisplayNone(String),
    /// `opacity:0` on the named element.
    ZeroOpacity(String),
    /// Nothing inside the connector paints any pixels.
    NoPaint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Visibility {
    Visible,
    Hidden(HiddenReason),
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// A displayed shape together with its computed style.
#[derive(Debug, Clone)]
pub struct StyledShape<'a> {
    pub element: &'a Element,
    pub style: ComputedStyle,
}

impl StyledShape<'_> {
    /// Non-degenerate and painted with a visible fill or stroke.
    pub fn paints(&self) -> bool {
        if self.style.visibility_hidden || is_degenerate(self.element) {
            return false;
        }
        match self.element.name.as_str() {
            "line" => self.style.stroke_visible(),
            "text" => {
                has_text(self.element) && (self.style.fill_visible() || self.style.stroke_visible())
            }
            "use" | "image" => true,
            _ => self.style.fill_visible() || self.style.stroke_visible(),
        }
    }
}

/// Computed style at the end of `path`, or the reason the fold stopped early.
pub fn fold_ancestors(
    resolver: &StyleResolver,
    path: &[&Element],
) -> Result<ComputedStyle, HiddenReason> {
    let mut style = ComputedStyle::initial();
    for n in 1..=path.len() {
        style = resolver.cascade(&style, &path[..n]);
        let element = path[n - 1];
        if style.display_none {
            return Err(HiddenReason::DisplayNone(element.to_string()));
        }
        if style.opacity <= 0.0 {
            return Err(HiddenReason::ZeroOpacity(element.to_string()));
        }
    }
    Ok(style)
}

/// Every displayed shape at or below the last element of `path`. `style` is
/// that element's computed style.
pub fn displayed_shapes<'a>(
    resolver: &StyleResolver,
    path: &[&'a Element],
    style: &ComputedStyle,
) -> Vec<StyledShape<'a>> {
    let mut shapes = Vec::new();
    let mut path = path.to_vec();
    collect_shapes(resolver, &mut path, style, &mut shapes);
    shapes
}

fn collect_shapes<'a>(
    resolver: &StyleResolver,
    path: &mut Vec<&'a Element>,
    style: &ComputedStyle,
    shapes: &mut Vec<StyledShape<'a>>,
) {
    let Some(&element) = path.last() else {
        return;
    };
    if NON_RENDERING.contains(&element.name.as_str()) {
        return;
    }
    if SHAPES.contains(&element.name.as_str()) {
        shapes.push(StyledShape {
            element,
            style: style.clone(),
        });
        // Only text has rendered children (tspan, textPath).
        if element.name != "text" {
            return;
        }
    }
    for child in &element.children {
        path.push(child);
        let child_style = resolver.cascade(style, path);
        if !child_style.display_none && child_style.opacity > 0.0 {
            collect_shapes(resolver, path, &child_style, shapes);
        }
        path.pop();
    }
}

/// Whether the connector at the end of `path` paints anything.
pub fn connector_visibility(resolver: &StyleResolver, path: &[&Element]) -> Visibility {
    let style = match fold_ancestors(resolver, path) {
        Ok(style) => style,
        Err(reason) => return Visibility::Hidden(reason),
    };
    if displayed_shapes(resolver, path, &style)
        .iter()
        .any(StyledShape::paints)
    {
        Visibility::Visible
    } else {
        Visibility::Hidden(HiddenReason::NoPaint)
    }
}

/// Missing dimensions count as zero; unparseable ones are given the benefit
/// of the doubt.
fn dimension(element: &Element, name: &str) -> Option<f64> {
    match element.attr(name) {
        None => Some(0.0),
        Some(value) => parse_length(value),
    }
}

fn non_positive(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v <= 0.0)
}

pub fn is_degenerate(element: &Element) -> bool {
    match element.name.as_str() {
        "rect" | "image" => {
            non_positive(dimension(element, "width")) || non_positive(dimension(element, "height"))
        }
        "circle" => non_positive(dimension(element, "r")),
        "ellipse" => {
            let rx = element.attr("rx").or(element.attr("ry"));
            let ry = element.attr("ry").or(element.attr("rx"));
            let rx = rx.map_or(Some(0.0), parse_length);
            let ry = ry.map_or(Some(0.0), parse_length);
            non_positive(rx) || non_positive(ry)
        }
        "line" => {
            let coord = |name: &str| element.attr(name).map_or(Some(0.0), parse_length);
            match (coord("x1"), coord("y1"), coord("x2"), coord("y2")) {
                (Some(x1), Some(y1), Some(x2), Some(y2)) => x1 == x2 && y1 == y2,
                _ => false,
            }
        }
        "path" => element.attr("d").map_or(true, |d| d.trim().is_empty()),
        "polyline" | "polygon" => element.attr("points").map_or(true, |p| p.trim().is_empty()),
        _ => false,
    }
}

fn has_text(element: &Element) -> bool {
    element
        .descendants()
        .any(|e| e.text.as_deref().is_some_and(|t| !t.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Document;

    fn visibility_of(svg: &str, id: &str) -> Visibility {
        let doc = Document::parse(svg).unwrap();
        let path = doc.root().path_to(&|e| e.id() == Some(id)).unwrap();
        connector_visibility(&StyleResolver::for_document(&doc), &path)
    }

    #[test]
    fn test_plain_rect_is_visible() {
        let v = visibility_of(r#"<svg><rect id="c" width="2" height="2"/></svg>"#, "c");
        assert_eq!(v, Visibility::Visible);
    }

    #[test]
    fn test_unpainted_rect_is_hidden() {
        let v = visibility_of(
            r#"<svg><rect id="c" width="2" height="2" fill="none" stroke="none"/></svg>"#,
            "c",
        );
        assert_eq!(v, Visibility::Hidden(HiddenReason::NoPaint));
    }

    #[test]
    fn test_stroke_only_circle_is_visible() {
        let v = visibility_of(
            r##"<svg><circle id="c" r="3" fill="none" stroke="#f7bd13" stroke-width="1.2"/></svg>"##,
            "c",
        );
        assert!(v.is_visible());
    }

    #[test]
    fn test_zero_width_stroke_is_hidden() {
        let v = visibility_of(
            r#"<svg><circle id="c" r="3" fill="none" stroke="black" stroke-width="0"/></svg>"#,
            "c",
        );
        assert!(!v.is_visible());
    }

    #[test]
    fn test_display_none_ancestor_cannot_be_overridden() {
        let v = visibility_of(
            r#"<svg><g id="copper1" style="display:none"><g style="display:inline"><rect id="c" width="1" height="1" style="display:block"/></g></g></svg>"#,
            "c",
        );
        assert!(matches!(v, Visibility::Hidden(HiddenReason::DisplayNone(ref at)) if at.contains("copper1")));
    }

    #[test]
    fn test_visibility_hidden_can_be_overridden() {
        let v = visibility_of(
            r#"<svg><g visibility="hidden"><g id="c"><rect width="1" height="1" visibility="visible"/></g></g></svg>"#,
            "c",
        );
        assert!(v.is_visible());

        let v = visibility_of(
            r#"<svg><g visibility="hidden"><g id="c"><rect width="1" height="1"/></g></g></svg>"#,
            "c",
        );
        assert!(!v.is_visible());
    }

    #[test]
    fn test_zero_opacity_group() {
        let v = visibility_of(
            r#"<svg><g opacity="0"><rect id="c" width="1" height="1"/></g></svg>"#,
            "c",
        );
        assert!(matches!(v, Visibility::Hidden(HiddenReason::ZeroOpacity(_))));
    }

    #[test]
    fn test_degenerate_geometry() {
        let v = visibility_of(r#"<svg><rect id="c" width="0" height="5"/></svg>"#, "c");
        assert!(!v.is_visible());
        let v = visibility_of(r#"<svg><rect id="c" width="1"/></svg>"#, "c");
        assert!(!v.is_visible());
        let v = visibility_of(
            r#"<svg><line id="c" x1="1" y1="1" x2="1" y2="1" stroke="black"/></svg>"#,
            "c",
        );
        assert!(!v.is_visible());
        let v = visibility_of(r#"<svg><path id="c" d=""/></svg>"#, "c");
        assert!(!v.is_visible());
        let v = visibility_of(r#"<svg><ellipse id="c" rx="2"/></svg>"#, "c");
        assert!(v.is_visible());
    }

    #[test]
    fn test_group_with_one_painted_child() {
        let v = visibility_of(
            r##"<svg><g id="c" fill="none"><rect width="1" height="1"/><circle r="1" fill="#000"/></g></svg>"##,
            "c",
        );
        assert!(v.is_visible());
    }

    #[test]
    fn test_empty_group_and_defs_only() {
        let v = visibility_of(r#"<svg><g id="c"/></svg>"#, "c");
        assert_eq!(v, Visibility::Hidden(HiddenReason::NoPaint));
        let v = visibility_of(
            r#"<svg><g id="c"><defs><rect width="1" height="1"/></defs></g></svg>"#,
            "c",
        );
        assert!(!v.is_visible());
    }

    #[test]
    fn test_stylesheet_driven_visibility() {
        let svg = r#"<svg>
            <style type="text/css"><![CDATA[
                .pin { fill: #8c8c8c; stroke: none; }
                .hidden rect { display: none; }
            ]]></style>
            <rect id="a" class="pin" fill="none" width="1" height="1"/>
            <g class="hidden"><rect id="b" class="pin" width="1" height="1"/></g>
        </svg>"#;
        assert!(visibility_of(svg, "a").is_visible());
        assert!(!visibility_of(svg, "b").is_visible());
    }
}
