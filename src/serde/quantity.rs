//! Serde helper for numeric subgraph scalars.
//!
//! Subgraphs serialize `BigInt` fields as decimal strings, while plain `Int`
//! fields arrive as bare numbers. This module accepts either form.
use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serializer, de};
use std::borrow::Cow;

/// Deserializes a [`U256`] from a decimal string or a bare number.
pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity<'a> {
        Number(u64),
        String(Cow<'a, str>),
    }

    match Quantity::deserialize(deserializer)? {
        Quantity::Number(value) => Ok(U256::from(value)),
        Quantity::String(value) => value.parse::<U256>().map_err(de::Error::custom),
    }
}

/// Serializes a [`U256`] as the decimal string form subgraphs emit.
pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}
