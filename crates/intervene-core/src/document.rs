//! Configuration documents
//!
//! Every definition in this crate is read from a generic, owned document
//! tree of objects, arrays, strings, numbers, booleans and null.

/// An owned, immutable configuration document
pub type Document = serde_json::Value;

/// Compact single-line rendering of a document for log messages
pub(crate) fn describe(doc: &Document) -> String {
    serde_json::to_string(doc).unwrap_or_else(|_| "<unprintable>".to_string())
}

/// Read an optional string member of an object
pub(crate) fn get_str<'a>(doc: &'a Document, key: &str) -> Option<&'a str> {
    doc.get(key).and_then(Document::as_str)
}
