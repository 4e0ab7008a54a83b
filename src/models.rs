use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One currency candidate as returned by the country source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyDescriptor {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl CurrencyDescriptor {
    pub fn with_code(code: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            ..Default::default()
        }
    }
}

/// Raw country entry from the country source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Some mirrors encode `population` as a string, others as a number.
    /// Accept both and normalize to `u64`.
    #[serde(default, deserialize_with = "de_opt_u64_from_string_or_number")]
    pub population: Option<u64>,
    #[serde(default)]
    pub flag: Option<String>,
    /// Ordered; only the first entry is used.
    #[serde(default, deserialize_with = "de_null_as_empty")]
    pub currencies: Vec<CurrencyDescriptor>,
}

impl CountryDescriptor {
    /// Code of the first listed currency, if it has one.
    pub fn primary_currency(&self) -> Option<&str> {
        self.currencies
            .first()
            .and_then(|c| c.code.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Payload of the exchange rate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesPayload {
    #[serde(default)]
    pub base_code: Option<String>,
    #[serde(default)]
    pub time_last_update_utc: Option<String>,
    #[serde(default)]
    pub rates: Option<HashMap<String, f64>>,
}

/// Base currency plus code -> rate map. Missing codes mean "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
    pub base_code: String,
    pub time_last_update_utc: Option<String>,
    pub rates: HashMap<String, f64>,
}

impl ExchangeRateSnapshot {
    pub fn new(base_code: &str, rates: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            base_code: base_code.to_string(),
            time_last_update_utc: None,
            rates: rates.into_iter().collect(),
        }
    }

    /// Usable rate for `code`: present, finite and strictly positive.
    pub fn rate_for(&self, code: &str) -> Option<f64> {
        self.rates
            .get(code)
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
    }
}

/// The persisted, merged per-country record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    /// Assigned by the store; preserved across refreshes of the same name.
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

impl CountryRecord {
    /// Case-insensitive identity check on the natural key.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// GDP used for ordering: unknown counts as zero.
    pub fn gdp_or_zero(&self) -> f64 {
        self.estimated_gdp.unwrap_or(0.0)
    }
}

/// Aggregate state of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub total_countries: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// One line of the top-N ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCountry {
    pub rank: usize,
    pub name: String,
    pub estimated_gdp: f64,
}

/// Outcome of a successful refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshResult {
    pub refreshed: usize,
    pub total_countries: usize,
    pub refreshed_at: DateTime<Utc>,
    pub top: Vec<RankedCountry>,
}

/// Serde helper: parse an optional `u64` from either a JSON number or a string.
fn de_opt_u64_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct U64Visitor;

    impl<'de> Visitor<'de> for U64Visitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "null, a string or integer representing a non-negative number")
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

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("negative value for population"));
            }
            Ok(Some(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v < 0.0 {
                return Err(E::custom("invalid value for population"));
            }
            Ok(Some(v.round() as u64))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.trim().parse::<u64>().map(Some).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U64Visitor)
}

/// Serde helper: treat an explicit `null` list as empty.
fn de_null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
