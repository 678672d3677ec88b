pub mod diff_markup;

// Re-export the main parsing function for convenience
pub use diff_markup::{parse_markup, revised_text, MarkupSegment};
