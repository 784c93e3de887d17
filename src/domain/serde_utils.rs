//! Serde helpers for backend payloads.
//!
//! The marketplace API is loose about scalar types: identifiers arrive as
//! strings or integers, prices as decimal strings or floats, and optional
//! collections as `null`. These modules normalize all of that at the edge.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serializer};
use std::fmt;

/// Identifiers that may be encoded as a string or an integer.
pub mod flexible_id {
    use super::{Deserializer, Serializer, Visitor, de, fmt};

    /// Serializes an id as an integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(*value)
    }

    /// Deserializes an id from a string or a non-negative integer.
    ///
    /// # Errors
    ///
    /// Returns an error for negative numbers or non-numeric strings.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = u64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer id")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value).map_err(|_| E::custom(format!("negative id: {value}")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.trim().parse::<u64>().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }

    /// Optional variant of [`flexible_id`](super::flexible_id).
    pub mod option {
        use super::{Deserializer, Serializer, Visitor, de, fmt};

        /// Serializes an optional id.
        ///
        /// # Errors
        ///
        /// Returns an error if the serializer fails.
        pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes an optional id; `null` and empty strings become `None`.
        ///
        /// # Errors
        ///
        /// Returns an error if a present value is not a valid id.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
        where
            D: Deserializer<'de>,
        {
            struct OptionVisitor;

            impl<'de> Visitor<'de> for OptionVisitor {
                type Value = Option<u64>;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("an optional id")
                }

                fn visit_none<E>(self) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(None)
                }

                fn visit_unit<E>(self) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(None)
                }

                fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserializer.deserialize_any(InnerVisitor)
                }
            }

            struct InnerVisitor;

            impl Visitor<'_> for InnerVisitor {
                type Value = Option<u64>;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("a string or integer id")
                }

                fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(Some(value))
                }

                fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    u64::try_from(value)
                        .map(Some)
                        .map_err(|_| E::custom(format!("negative id: {value}")))
                }

                fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    let trimmed = value.trim();
                    if trimmed.is_empty() {
                        return Ok(None);
                    }
                    trimmed.parse::<u64>().map(Some).map_err(de::Error::custom)
                }
            }

            deserializer.deserialize_option(OptionVisitor)
        }
    }
}

/// Decimal amounts that may arrive as `"12.50"`, `12.5` or `12`.
///
/// Deserializes into integer minor units (cents).
pub mod decimal_cents {
    use super::{Deserializer, Serializer, Visitor, de, fmt};
    use crate::domain::entities::Money;

    /// Serializes cents back into a decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&Money::format_cents(*value))
    }

    /// Deserializes a decimal amount into cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a number or decimal string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CentsVisitor;

        impl Visitor<'_> for CentsVisitor {
            type Value = i64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a decimal amount")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .ok()
                    .and_then(|v| v.checked_mul(100))
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .checked_mul(100)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            #[allow(clippy::cast_possible_truncation)]
            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if !value.is_finite() {
                    return Err(E::custom("amount is not finite"));
                }
                Ok((value * 100.0).round() as i64)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Money::parse_cents(value).ok_or_else(|| E::custom(format!("invalid amount: {value}")))
            }
        }

        deserializer.deserialize_any(CentsVisitor)
    }
}

/// Treats an explicit `null` as `T::default()`.
///
/// # Errors
///
/// Returns an error if a present value fails to deserialize.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
