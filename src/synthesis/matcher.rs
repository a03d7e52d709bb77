//! Conditional match evaluation for `set=` groups.
//!
//! - `addr` compares against the first `for=` token of a `Forwarded` header,
//!   falling back to the transport peer address
//! - `host` compares against the `Host` header
//! - Both comparisons are exact and case-insensitive

use crate::directive::MatchCondition;
use crate::http::ParsedRequest;

/// Decides whether a conditional group applies to `request`
pub fn evaluate(condition: &MatchCondition, request: &ParsedRequest) -> bool {
    match condition {
        MatchCondition::Addr(expected) => effective_addr(request).eq_ignore_ascii_case(expected),
        MatchCondition::Host(expected) => request
            .headers
            .get("Host")
            .map(|host| host.trim().eq_ignore_ascii_case(expected))
            .unwrap_or(false),
    }
}

/// The client address as seen through any `Forwarded` header
pub fn effective_addr(request: &ParsedRequest) -> &str {
    request
        .headers
        .get("Forwarded")
        .and_then(forwarded_for)
        .unwrap_or(request.peer_addr.as_str())
}

/// Extracts the node of the first `for=` parameter in a `Forwarded` value
///
/// Quotes are removed, and a bracketed IPv6 node loses its brackets and port.
fn forwarded_for(value: &str) -> Option<&str> {
    let first_element = value.split(',').next()?;
    let node = first_element.split(';').find_map(|pair| {
        let (name, node) = pair.split_once('=')?;
        name.trim().eq_ignore_ascii_case("for").then(|| node.trim())
    })?;

    let node = node.trim_matches('"');
    let node = match node.strip_prefix('[') {
        Some(bracketed) => bracketed.split(']').next().unwrap_or(bracketed),
        None => node,
    };
    (!node.is_empty()).then_some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    fn request() -> ParsedRequest {
        ParsedRequest::new(Method::Get, "/", "127.0.0.1")
    }

    #[test]
    fn test_addr_uses_peer_without_forwarded() {
        let condition = MatchCondition::Addr("127.0.0.1".to_string());
        assert!(evaluate(&condition, &request()));
        assert!(!evaluate(&MatchCondition::Addr("4.3.2.1".to_string()), &request()));
    }

    #[test]
    fn test_addr_prefers_forwarded() {
        let proxied = request().with_header("Forwarded", "for=4.3.2.1");
        assert!(evaluate(&MatchCondition::Addr("4.3.2.1".to_string()), &proxied));
        assert!(!evaluate(&MatchCondition::Addr("127.0.0.1".to_string()), &proxied));

        let other = request().with_header("Forwarded", "for=8.7.6.5");
        assert!(!evaluate(&MatchCondition::Addr("4.3.2.1".to_string()), &other));
    }

    #[test]
    fn test_forwarded_first_element_only() {
        let chained = request().with_header(
            "Forwarded",
            "proto=http;For=\"[2001:DB8::1]:4711\";by=203.0.113.43, for=198.51.100.17",
        );
        assert_eq!(effective_addr(&chained), "2001:DB8::1");
        assert!(evaluate(&MatchCondition::Addr("2001:db8::1".to_string()), &chained));
    }

    #[test]
    fn test_forwarded_without_for_falls_back() {
        let no_for = request().with_header("Forwarded", "proto=https;by=10.0.0.1");
        assert_eq!(effective_addr(&no_for), "127.0.0.1");
    }

    #[test]
    fn test_host_is_case_insensitive_and_exact() {
        let condition = MatchCondition::Host("test".to_string());
        assert!(evaluate(&condition, &request().with_header("Host", "Test")));
        assert!(!evaluate(&condition, &request().with_header("Host", "Another-Test")));
        assert!(!evaluate(&condition, &request().with_header("Host", "test:8080")));
        assert!(!evaluate(&condition, &request()));
    }
}
