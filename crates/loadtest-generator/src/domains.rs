//! Closed categorical domains for the events use case and uniform selection
//! helpers over them.

use crate::error::GeneratorError;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

pub const URL_PROPERTY: &str = "url";
pub const EMAIL_PROPERTY: &str = "email";
pub const NAME_PROPERTY: &str = "name";
pub const PHONE_PROPERTY: &str = "phone";

pub const NAVIGATION_EVENT: &str = "navigation";
pub const CLICK_EVENT: &str = "click";
pub const CHECKOUT_EVENT: &str = "cart_checkout";
pub const TYPING_EVENT: &str = "typing";

pub const AVAILABLE_EVENTS: &[&str] = &[NAVIGATION_EVENT, CLICK_EVENT, CHECKOUT_EVENT, TYPING_EVENT];

pub const AVAILABLE_STR_PROPERTIES: &[&str] =
    &[URL_PROPERTY, EMAIL_PROPERTY, NAME_PROPERTY, PHONE_PROPERTY];

/// Example values for a string property key. Unknown keys have none.
pub fn property_values(key: &str) -> &'static [&'static str] {
    match key {
        URL_PROPERTY => &["https://www.seznam.cz"],
        EMAIL_PROPERTY => &["hello@world.com"],
        NAME_PROPERTY => &["john doe"],
        PHONE_PROPERTY => &["+420602303222"],
        _ => &[],
    }
}

/// Select `n` distinct items from `pool`, without replacement.
///
/// Fails with [`GeneratorError::Cardinality`] unless `1 <= n <= pool.len()`.
pub fn get_random_properties<'a, R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    pool: &[&'a str],
) -> Result<Vec<&'a str>, GeneratorError> {
    if n < 1 || n > pool.len() {
        return Err(GeneratorError::Cardinality {
            requested: n,
            available: pool.len(),
        });
    }
    Ok(rand::seq::index::sample(rng, pool.len(), n)
        .into_iter()
        .map(|i| pool[i])
        .collect())
}

/// Uniform choice among the example values of `key`.
pub fn get_random_property_value<R: Rng + ?Sized>(
    rng: &mut R,
    key: &str,
) -> Result<&'static str, GeneratorError> {
    property_values(key)
        .choose(rng)
        .copied()
        .ok_or_else(|| GeneratorError::NoValues(key.to_string()))
}

/// Uniform choice among [`AVAILABLE_EVENTS`].
pub fn get_random_event<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    AVAILABLE_EVENTS[rng.gen_range(0..AVAILABLE_EVENTS.len())]
}

/// A property map holding every string property with one of its example values.
pub fn random_property_map<R: Rng + ?Sized>(rng: &mut R) -> BTreeMap<String, String> {
    AVAILABLE_STR_PROPERTIES
        .iter()
        .filter_map(|key| {
            property_values(key)
                .choose(rng)
                .map(|value| (key.to_string(), value.to_string()))
        })
        .collect()
}
