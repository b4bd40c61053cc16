use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Visitor};
use serde::Deserializer;

/// When reading from the environment, all values are strings. This accepts
/// valid number strings as well as numbers so that e.g.
/// `PROXYFLARE_CONCURRENCY=3` works the same as `concurrency = 3` in a file.
///
/// https://serde.rs/string-or-struct.html
pub(super) fn string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber(PhantomData<fn() -> u64>);

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative integer")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v).map_err(|_| de::Error::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }
    }

    deserializer.deserialize_any(StringOrNumber(PhantomData))
}
