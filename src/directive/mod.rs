//! Query-string directives
//!
//! A request's query string is parsed eagerly into an ordered list of
//! [`Directive`] values. Parsing never fails: a malformed directive is
//! dropped on its own and the rest of the query string still applies.

pub mod grammar;
pub mod types;

pub use grammar::parse;
pub use types::{ContentArgs, Directive, Encoding, MatchCondition, StatusArgs};
