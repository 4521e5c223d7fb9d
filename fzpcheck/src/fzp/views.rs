//! View/layer resolution
//!
//! Maps each view an FZP declares to the SVG file that draws it. Fritzing
//! part libraries keep part files and graphics side by side:
//!
//! ```text
//! parts/
//! ├── core/resistor.fzp              image="breadboard/resistor.svg"
//! ├── obsolete/old_resistor.fzp
//! └── svg/
//!     ├── core/breadboard/resistor.svg
//!     └── obsolete/breadboard/old_resistor.svg
//! ```
//!
//! so an image path resolves against `<fzp dir>/../svg/<fzp dir name>/`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::parser::{Document, Element};

/// Legacy pseudo-view that carries no graphics.
pub const DEFAULT_UNITS: &str = "defaultUnits";

/// Where SVG assets live relative to part files, and which image names are
/// template placeholders rather than real assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLayout {
    /// Directory holding the SVG tree, a sibling of the part directories.
    pub svg_dir: String,
    /// Subdirectory used when the part file has no parent directory name.
    pub fallback_subdir: String,
    /// Case-insensitive substrings marking a template image file name.
    pub template_markers: Vec<String>,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            svg_dir: "svg".to_string(),
            fallback_subdir: "core".to_string(),
            template_markers: vec!["template".to_string()],
        }
    }
}

impl AssetLayout {
    pub fn is_template(&self, image: &str) -> bool {
        let file_name = image
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(image)
            .to_lowercase();
        self.template_markers
            .iter()
            .filter(|m| !m.is_empty())
            .any(|m| file_name.contains(&m.to_lowercase()))
    }

    /// Filesystem path of `image` for the given view of the part at
    /// `fzp_path`, or `None` for template placeholders.
    pub fn svg_path(&self, fzp_path: &Path, image: &str, view: &str) -> Option<PathBuf> {
        if self.is_template(image) {
            return None;
        }
        let part_dir = fzp_path.parent().unwrap_or_else(|| Path::new(""));
        let subdir = part_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.fallback_subdir.as_str());
        let svg_root = part_dir.join("..").join(&self.svg_dir).join(subdir);

        let image = image.replace('\\', "/");
        let relative = if image.contains('/') {
            PathBuf::from(image)
        } else {
            Path::new(view_folder(view)).join(image)
        };
        Some(svg_root.join(relative))
    }
}

/// Folder name for a view tag: `breadboardView` -> `breadboard`.
pub fn view_folder(view: &str) -> &str {
    view.strip_suffix("View").unwrap_or(view)
}

/// Outcome of resolving one view's image.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAsset {
    /// The view has no `layers` element.
    MissingLayers,
    /// `layers` has no `image` attribute.
    NoImage,
    /// The image is a template placeholder and is skipped.
    Template(String),
    /// Path of the SVG file. It may not exist.
    Svg(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedView {
    pub view: String,
    pub asset: ViewAsset,
    pub layer_ids: Vec<String>,
}

impl ResolvedView {
    pub fn svg_path(&self) -> Option<&Path> {
        match &self.asset {
            ViewAsset::Svg(path) => Some(path),
            _ => None,
        }
    }
}

/// The module-level `views` element.
pub fn views_element(doc: &Document) -> Option<&Element> {
    doc.root().child("views")
}

/// Every declared view except `defaultUnits`, in document order.
pub fn resolve_views(doc: &Document, fzp_path: &Path, layout: &AssetLayout) -> Vec<ResolvedView> {
    let Some(views) = views_element(doc) else {
        tracing::debug!("{} declares no views", fzp_path.display());
        return Vec::new();
    };

    views
        .children
        .iter()
        .filter(|view| view.name != DEFAULT_UNITS)
        .map(|view| resolve_view(view, fzp_path, layout))
        .collect()
}

fn resolve_view(view: &Element, fzp_path: &Path, layout: &AssetLayout) -> ResolvedView {
    let Some(layers) = view.child("layers") else {
        return ResolvedView {
            view: view.name.clone(),
            asset: ViewAsset::MissingLayers,
            layer_ids: Vec::new(),
        };
    };

    let mut layer_ids: Vec<String> = Vec::new();
    for layer_id in layers.children_named("layer").filter_map(|l| l.attr("layerId")) {
        if !layer_id.is_empty() && !layer_ids.iter().any(|l| l == layer_id) {
            layer_ids.push(layer_id.to_string());
        }
    }

    let asset = match layers.attr("image").filter(|i| !i.trim().is_empty()) {
        None => ViewAsset::NoImage,
        Some(image) => match layout.svg_path(fzp_path, image, &view.name) {
            Some(path) => ViewAsset::Svg(path),
            None => ViewAsset::Template(image.to_string()),
        },
    };
    tracing::debug!(view = %view.name, asset = ?asset, "resolved view");

    ResolvedView {
        view: view.name.clone(),
        asset,
        layer_ids,
    }
}
