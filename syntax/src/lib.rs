//! Syntax tree for block-structured Go-family sources
//!
//! The tree is produced by an external parser (or deserialized from JSON);
//! this crate only defines the node shapes and a builder used by tests and
//! benchmarks to assemble trees with realistic, monotonically increasing spans.

pub mod ast;
pub mod builder;

pub use ast::*;
pub use builder::AstBuilder;
