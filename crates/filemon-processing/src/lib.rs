//! Filemon Processing Library
//!
//! Pure transformations applied to an uploaded settlement file: the fixed-width
//! layout validator and parser, and the content hasher used for deduplication.
//! Nothing in this crate performs I/O.

pub mod error;
pub mod hash;
pub mod layout;

pub use error::ParseError;
pub use hash::content_hash;
pub use layout::{normalize_line, parse, parse_file, validate, Layout, LayoutViolation};
