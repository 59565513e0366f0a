//! Profile attributes collected during the new-password challenge.
//!
//! When the pool forces a password change it may also demand profile
//! attributes the account lacks. [`backfill`] fills the common ones from
//! what the caller already knows so the user is only prompted when nothing
//! sensible is available.

use std::collections::{BTreeMap, BTreeSet};

/// Attribute name/value pairs, ordered for stable payloads.
pub type Attributes = BTreeMap<String, String>;

/// Full name.
pub const NAME: &str = "name";
/// Given (first) name.
pub const GIVEN_NAME: &str = "given_name";
/// Family (last) name.
pub const FAMILY_NAME: &str = "family_name";
/// Email address.
pub const EMAIL: &str = "email";
/// Preferred username.
pub const PREFERRED_USERNAME: &str = "preferred_username";

/// Prefix the provider puts in front of attribute names in challenges.
pub const CHALLENGE_ATTRIBUTE_PREFIX: &str = "userAttributes.";

/// Strips the challenge prefix from an attribute name.
#[must_use]
pub fn normalize(name: &str) -> &str {
    name.strip_prefix(CHALLENGE_ATTRIBUTE_PREFIX).unwrap_or(name)
}

fn value<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

/// Fills required attributes the caller did not supply.
///
/// Rules, applied only to attributes in `required`:
///
/// - `email`: the login identifier, when it contains `@`.
/// - `name`: the login identifier.
/// - `given_name`, `family_name`: the caller's `name`, else the identifier.
///
/// Blank values count as absent. Supplied attributes are always kept, even
/// when not required. Other required attributes are left for validation.
#[must_use]
pub fn backfill(required: &BTreeSet<String>, identifier: &str, supplied: &Attributes) -> Attributes {
    let mut resolved: Attributes = supplied
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let shared_name = value(supplied, NAME);

    for attribute in required {
        if value(&resolved, attribute).is_some() {
            continue;
        }
        let fill = match attribute.as_str() {
            EMAIL if identifier.contains('@') => Some(identifier),
            NAME => Some(identifier),
            GIVEN_NAME | FAMILY_NAME => Some(shared_name.unwrap_or(identifier)),
            _ => None,
        };
        if let Some(fill) = fill {
            resolved.insert(attribute.clone(), fill.to_string());
        }
    }

    resolved
}

/// Seeds `supplied` with values the account already holds.
///
/// Only required attributes are taken from `existing`, and caller values
/// win. Apply before [`backfill`] so account data outranks the identifier.
#[must_use]
pub fn adopt_existing(required: &BTreeSet<String>, existing: &Attributes, supplied: &Attributes) -> Attributes {
    let mut seeded = supplied.clone();
    for attribute in required {
        if value(supplied, attribute).is_some() {
            continue;
        }
        if let Some(current) = value(existing, attribute) {
            seeded.insert(attribute.clone(), current.to_string());
        }
    }
    seeded
}

/// Lists required attributes that still have no value.
#[must_use]
pub fn missing_attributes(required: &BTreeSet<String>, attributes: &Attributes) -> Vec<String> {
    required
        .iter()
        .filter(|name| value(attributes, name).is_none())
        .cloned()
        .collect()
}
