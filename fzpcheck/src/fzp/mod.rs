//! FZP part documents: declared views, their SVG assets, and connector
//! terminal references.

pub mod connectors;
pub mod views;

use std::path::Path;

use crate::parser::Document;

pub use connectors::{connector_refs, enclosing_layer, locate_in_layer, ConnectorRef};
pub use views::{
    resolve_views, view_folder, views_element, AssetLayout, ResolvedView, ViewAsset, DEFAULT_UNITS,
};

/// Load the SVG of every resolvable view of a part and hand it to `f`, one at
/// a time. Each SVG is dropped before the next one is read.
///
/// Views whose SVG is missing or malformed are skipped here; those conditions
/// are counted when the runner resolves SVG assets.
pub fn for_each_view_svg<F>(doc: &Document, fzp_path: &Path, layout: &AssetLayout, mut f: F)
where
    F: FnMut(&ResolvedView, &Document),
{
    for view in resolve_views(doc, fzp_path, layout) {
        let Some(svg_path) = view.svg_path() else {
            continue;
        };
        match Document::load(svg_path) {
            Ok(svg) => f(&view, &svg),
            Err(e) => tracing::debug!(
                view = %view.view,
                svg = %svg_path.display(),
                "skipping view: {}",
                e
            ),
        }
    }
}
