use std::fmt;
use std::time::Duration;

/// Forced body encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Identity,
    Gzip,
}

impl Encoding {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "identity" => Some(Encoding::Identity),
            "gzip" => Some(Encoding::Gzip),
            _ => None,
        }
    }
}

/// Status line override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusArgs {
    pub code: u16,
    pub reason: Option<String>,
}

/// Generated body request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentArgs {
    pub length: usize,
    pub fill: Option<String>,
}

/// Gate of a conditional group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchCondition {
    /// Effective client address (`Forwarded: for=` or the transport peer)
    Addr(String),
    /// `Host` request header
    Host(String),
}

impl fmt::Display for MatchCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchCondition::Addr(addr) => write!(f, "addr:{addr}"),
            MatchCondition::Host(host) => write!(f, "host:{host}"),
        }
    }
}

/// A single instruction altering the response in progress
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Set a header; an empty value removes it
    SetHeader { name: String, value: String },
    /// Suspend before transmitting. `raw` is the value as written in the
    /// query string and is what `X-Delay` echoes.
    Delay { duration: Duration, raw: String },
    Status(StatusArgs),
    Content(ContentArgs),
    Encoding(Encoding),
    ConditionalGroup {
        condition: MatchCondition,
        directives: Vec<Directive>,
    },
    Debug,
    Quiet,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::SetHeader { name, value } => write!(f, "header {name}:{value}"),
            Directive::Delay { raw, .. } => write!(f, "delay {raw}"),
            Directive::Status(StatusArgs { code, reason: Some(reason) }) => {
                write!(f, "status {code} {reason}")
            }
            Directive::Status(StatusArgs { code, reason: None }) => write!(f, "status {code}"),
            Directive::Content(ContentArgs { length, fill: Some(fill) }) => {
                write!(f, "content {length} fill {fill}")
            }
            Directive::Content(ContentArgs { length, fill: None }) => write!(f, "content {length}"),
            Directive::Encoding(Encoding::Identity) => f.write_str("encoding identity"),
            Directive::Encoding(Encoding::Gzip) => f.write_str("encoding gzip"),
            Directive::ConditionalGroup { condition, directives } => {
                write!(f, "set {condition} [")?;
                for (i, directive) in directives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{directive}")?;
                }
                f.write_str("]")
            }
            Directive::Debug => f.write_str("debug"),
            Directive::Quiet => f.write_str("quiet"),
        }
    }
}
