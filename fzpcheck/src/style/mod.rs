//! SVG styling: stylesheet parsing, the cascade, and renderability of
//! connector graphics.

pub mod cascade;
pub mod css;
pub mod visibility;

pub use cascade::{parse_length, ComputedStyle, Paint, StyleResolver};
pub use css::{Declaration, Selector, Specificity, StyleSheet};
pub use visibility::{
    connector_visibility, displayed_shapes, fold_ancestors, HiddenReason, StyledShape, Visibility,
};
