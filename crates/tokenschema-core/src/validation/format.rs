//! Validators for the `format` keyword
//!
//! Each check is a pass/fail predicate over the string value. Unknown
//! formats always pass.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::OnceLock;
use url::Url;

/// Whether `value` is valid for `format`
pub fn validate_format(format: &str, value: &str) -> bool {
    match format {
        "date-time" => DateTime::parse_from_rfc3339(value).is_ok(),
        "date" => value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        "time" => is_time(value),
        "email" => is_email(value),
        "hostname" => is_hostname(value),
        "ipv4" | "ip-address" => is_ipv4(value),
        "ipv6" => Ipv6Addr::from_str(value).is_ok(),
        "uri" => Url::parse(value).is_ok(),
        "uri-reference" => is_uri_reference(value),
        "uuid" => value.len() == 36 && uuid::Uuid::parse_str(value).is_ok(),
        "regex" => Regex::new(value).is_ok(),
        "json-pointer" => is_json_pointer(value),
        "duration" => is_duration(value),
        _ => true,
    }
}

fn is_time(value: &str) -> bool {
    // RFC 3339 full-time: partial time plus an offset
    let (time, offset) = match value.find(['Z', 'z', '+', '-']) {
        Some(index) => value.split_at(index),
        None => return false,
    };
    let offset_ok = matches!(offset, "Z" | "z")
        || (offset.len() == 6 && NaiveTime::parse_from_str(&offset[1..], "%H:%M").is_ok());
    offset_ok && NaiveTime::parse_from_str(time, "%H:%M:%S%.f").is_ok()
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && !local.chars().any(|c| c.is_whitespace() || c == '@')
        && is_hostname(domain)
}

fn is_hostname(value: &str) -> bool {
    let value = value.strip_suffix('.').unwrap_or(value);
    !value.is_empty()
        && value.len() <= 253
        && value.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn is_ipv4(value: &str) -> bool {
    // Leading zeros are ambiguous (octal) and rejected
    Ipv4Addr::from_str(value).is_ok()
        && value
            .split('.')
            .all(|octet| octet == "0" || !octet.starts_with('0'))
}

fn is_uri_reference(value: &str) -> bool {
    static BASE: OnceLock<Option<Url>> = OnceLock::new();
    if value.chars().any(|c| c.is_whitespace() || c == '\\') {
        return false;
    }
    match BASE.get_or_init(|| Url::parse("http://example.invalid/").ok()) {
        Some(base) => base.join(value).is_ok(),
        None => false,
    }
}

fn is_json_pointer(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if !value.starts_with('/') {
        return false;
    }
    let bytes = value.as_bytes();
    bytes.iter().enumerate().all(|(i, b)| {
        *b != b'~' || matches!(bytes.get(i + 1), Some(b'0') | Some(b'1'))
    })
}

fn is_duration(value: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(
            r"^P(?:\d+W|(?:\d+Y(?:\d+M)?(?:\d+D)?|\d+M(?:\d+D)?|\d+D)(?:T(?:\d+H(?:\d+M)?(?:\d+S)?|\d+M(?:\d+S)?|\d+S))?|T(?:\d+H(?:\d+M)?(?:\d+S)?|\d+M(?:\d+S)?|\d+S))$",
        )
        .ok()
    });
    pattern.as_ref().is_some_and(|p| p.is_match(value))
}
