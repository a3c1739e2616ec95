pub mod error;
pub mod node;
pub mod parser;

pub use node::Node;

/// A parsed script: exactly one top-level expression.
pub type Program = Node;
