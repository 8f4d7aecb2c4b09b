//! Core pipeline — fact schema, extraction, workflow compilation, rendering.
//!
//! Pure in-memory transformation: the only function here that touches the
//! filesystem is `facts::parse_facts_file`.

pub mod compiler;
pub mod extract;
pub mod facts;
pub mod render;
pub mod types;
