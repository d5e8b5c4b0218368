//! Canonical document model handed to downstream exporters.
//!
//! # Responsibility
//! - Define the schema-stable `Document`/`Sheet`/`Topic` tree.
//! - Hide which archive generation a document was loaded from.
//!
//! # Invariants
//! - Every `Topic` has a non-empty id.
//! - A `Document` is never mutated after construction.

pub mod document;
