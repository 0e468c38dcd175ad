//! Text helpers
//!
//! Excerpts, reading time and heading anchors are derived the same way
//! whether a post is created over HTTP or from the command line.

mod text;

pub use text::*;
