//! Connector terminal references
//!
//! A connector lists, per view, the SVG elements that draw it:
//!
//! ```xml
//! <connector id="connector0" name="Pin 1" type="male">
//!   <views>
//!     <breadboardView>
//!       <p layer="breadboard" svgId="connector0pin" terminalId="connector0terminal"/>
//!     </breadboardView>
//!   </views>
//! </connector>
//! ```

use crate::parser::{Document, Element};

/// One `p` entry of a connector for a given view.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorRef<'a> {
    pub connector_id: &'a str,
    pub layer: &'a str,
    pub svg_id: Option<&'a str>,
    pub terminal_id: Option<&'a str>,
    /// Hybrid connectors have no graphic in this view.
    pub hybrid: bool,
}

/// Every connector entry declared for `view`, in document order.
pub fn connector_refs<'a>(doc: &'a Document, view: &str) -> Vec<ConnectorRef<'a>> {
    let Some(connectors) = doc.root().child("connectors") else {
        return Vec::new();
    };

    let mut refs = Vec::new();
    for connector in connectors.children_named("connector") {
        let connector_id = connector.attr("id").unwrap_or("");
        let Some(view_element) = connector.child("views").and_then(|v| v.child(view)) else {
            continue;
        };
        for p in view_element.children_named("p") {
            refs.push(ConnectorRef {
                connector_id,
                layer: p.attr("layer").unwrap_or(""),
                svg_id: p.attr("svgId").filter(|s| !s.is_empty()),
                terminal_id: p.attr("terminalId").filter(|s| !s.is_empty()),
                hybrid: p
                    .attr("hybrid")
                    .is_some_and(|h| h.eq_ignore_ascii_case("yes") || h == "true"),
            });
        }
    }
    refs
}

/// Path from the SVG root to the element with `id`, searching only inside the
/// layer group named `layer` when the document has one.
pub fn locate_in_layer<'a>(svg: &'a Document, layer: &str, id: &str) -> Option<Vec<&'a Element>> {
    let root = svg.root();
    let layer_path = if layer.is_empty() {
        None
    } else {
        root.path_to(&|e| e.id() == Some(layer))
    };

    match layer_path {
        Some(mut path) => {
            let group = path.pop()?;
            let below = group.path_to(&|e| e.id() == Some(id))?;
            path.extend(below);
            Some(path)
        }
        None => root.path_to(&|e| e.id() == Some(id)),
    }
}

/// Id of the nearest ancestor-or-self in `path` whose id is one of `layer_ids`.
pub fn enclosing_layer<'a>(path: &[&'a Element], layer_ids: &[String]) -> Option<&'a str> {
    path.iter()
        .rev()
        .filter_map(|e| e.id())
        .find(|id| layer_ids.iter().any(|l| l.as_str() == *id))
}
