//! Directive-driven response synthesis
//!
//! Turns a parsed request and its directives into a framed response:
//! conditional matching, generated content, gzip and echo rendering all
//! live here. Nothing in this module performs I/O.

pub mod builder;
pub mod compression;
pub mod config;
pub mod content;
pub mod matcher;
pub mod trace;

pub use builder::{EchoFormat, ResponseBuilder, SynthesisError};
pub use config::SynthesisConfig;
