//! Blocked delivery addresses

use shared::models::{BlockedAddress, MatchType};

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Whether one rule blocks an already normalised address
fn rule_matches(rule: &BlockedAddress, address: &str) -> bool {
    if !rule.active {
        return false;
    }
    let pattern = normalize(&rule.pattern);
    if pattern.is_empty() {
        return false;
    }
    match MatchType::parse(&rule.match_type) {
        Some(MatchType::Exact) => address == pattern,
        Some(MatchType::Prefix) => address.starts_with(&pattern),
        Some(MatchType::Contains) => address.contains(&pattern),
        None => false,
    }
}

/// First rule blocking `address`; comparison is trimmed and case-insensitive
pub fn blocking_rule<'a>(address: &str, rules: &'a [BlockedAddress]) -> Option<&'a BlockedAddress> {
    let address = normalize(address);
    rules.iter().find(|rule| rule_matches(rule, &address))
}

pub fn is_address_blocked(address: &str, rules: &[BlockedAddress]) -> bool {
    blocking_rule(address, rules).is_some()
}
