use super::types::{ContentArgs, Directive, Encoding, MatchCondition, StatusArgs};
use crate::http::headers;
use std::time::Duration;
use tracing::debug;
use url::form_urlencoded;

/// Parses a raw query string (without the leading `?`) into directives
///
/// Keys are applied in the order they appear. `reason` and `fill` are
/// modifiers: they attach to the `status` and `content` directives
/// respectively wherever they appear, and are ignored on their own.
/// Unknown keys and malformed values are dropped individually.
pub fn parse(query: &str) -> Vec<Directive> {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    let reason = last_value(&pairs, "reason");
    let fill = last_value(&pairs, "fill");

    let mut directives = Vec::with_capacity(pairs.len());
    for (key, value) in &pairs {
        let parsed = match key.as_str() {
            "header" => parse_header(value),
            "delay" => parse_delay(value),
            "status" => parse_status(value, reason),
            "content" => parse_content(value, fill),
            "encoding" => Encoding::from_token(value).map(Directive::Encoding),
            "set" => parse_group(value),
            "debug" => Some(Directive::Debug),
            "quiet" => Some(Directive::Quiet),
            "reason" | "fill" => continue,
            _ => {
                debug!(key = %key, "Ignoring unknown query key");
                continue;
            }
        };

        match parsed {
            Some(directive) => directives.push(directive),
            None => debug!(key = %key, value = %value, "Dropping malformed directive"),
        }
    }
    directives
}

fn last_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn parse_header(value: &str) -> Option<Directive> {
    let (name, value) = value.split_once(':')?;
    let (name, value) = (name.trim(), value.trim());
    if !headers::is_valid_name(name) || !headers::is_valid_value(value) {
        return None;
    }
    Some(Directive::SetHeader {
        name: headers::canonical_name(name),
        value: value.to_string(),
    })
}

fn parse_delay(value: &str) -> Option<Directive> {
    let raw = value.trim();
    let seconds: f64 = raw.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let duration = Duration::try_from_secs_f64(seconds).ok()?;
    Some(Directive::Delay {
        duration,
        raw: raw.to_string(),
    })
}

fn parse_status(value: &str, reason: Option<&str>) -> Option<Directive> {
    let code: u16 = value.trim().parse().ok()?;
    // Anything with three digits can be put on a status line
    if !(100..=999).contains(&code) {
        return None;
    }
    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty() && headers::is_valid_value(r))
        .map(str::to_string);
    Some(Directive::Status(StatusArgs { code, reason }))
}

fn parse_content(value: &str, fill: Option<&str>) -> Option<Directive> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let length: usize = value.parse().ok()?;
    let fill = fill.filter(|f| !f.is_empty()).map(str::to_string);
    Some(Directive::Content(ContentArgs { length, fill }))
}

/// `set=key:value,key:value,...` with exactly one `addr` or `host` gate
fn parse_group(value: &str) -> Option<Directive> {
    let items: Vec<(String, &str)> = value
        .split(',')
        .filter_map(|item| item.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim()))
        .collect();

    let mut conditions = items.iter().filter_map(|(key, value)| match key.as_str() {
        "addr" if !value.is_empty() => Some(MatchCondition::Addr(value.to_string())),
        "host" if !value.is_empty() => Some(MatchCondition::Host(value.to_string())),
        _ => None,
    });
    let condition = conditions.next()?;
    if conditions.next().is_some() {
        return None;
    }

    let reason = items.iter().rev().find(|(k, _)| k == "reason").map(|(_, v)| *v);
    let fill = items.iter().rev().find(|(k, _)| k == "fill").map(|(_, v)| *v);

    let mut directives = Vec::new();
    for (key, value) in &items {
        let parsed = match key.as_str() {
            "header" => parse_header(value),
            "delay" => parse_delay(value),
            "status" => parse_status(value, reason),
            "content" => parse_content(value, fill),
            "encoding" => Encoding::from_token(value).map(Directive::Encoding),
            "addr" | "host" | "reason" | "fill" => continue,
            _ => None,
        };
        match parsed {
            Some(directive) => directives.push(directive),
            None => debug!(key = %key, value = %value, "Dropping malformed item in set group"),
        }
    }

    Some(Directive::ConditionalGroup {
        condition,
        directives,
    })
}
