//! Document Rewriters.
//!
//! Both variants take the selector's decisions (computed up front) and apply
//! them right to left, highest offset first, so each splice leaves the
//! offsets of the remaining decisions valid.
//!
//! - [`text`]: splices markdown link syntax into the raw body.
//! - [`ast`]: splits mdast text nodes and inserts link nodes.

pub mod ast;
pub mod text;
