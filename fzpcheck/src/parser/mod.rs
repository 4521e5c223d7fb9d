pub mod xml;

// Re-export for convenience
pub use xml::{Descendants, Document, Element, LoadError, XmlError, XmlParser, MAX_DEPTH};
