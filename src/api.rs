//! Synchronous clients for the two upstreams: the country listing and the
//! exchange rate table.
//!
//! Both perform exactly one GET per call. There is no retry: a failed request,
//! a non-2xx status, an undecodable body or an empty payload all surface as
//! [`Error::UpstreamUnavailable`] naming the source.
//!
//! Typical usage:
//! ```no_run
//! # use country_atlas::api::{CountryClient, CountrySource, ExchangeRateClient, RateSource};
//! let countries = CountryClient::default().fetch_countries()?;
//! let rates = ExchangeRateClient::default().fetch_rates()?;
//! # Ok::<(), country_atlas::Error>(())
//! ```
use crate::error::{Error, Result, Upstream};
use crate::models::{CountryDescriptor, ExchangeRateSnapshot, RatesPayload};
use log::debug;
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of country descriptors.
pub trait CountrySource: Send + Sync {
    fn fetch_countries(&self) -> Result<Vec<CountryDescriptor>>;
}

/// Source of exchange rates.
pub trait RateSource: Send + Sync {
    fn fetch_rates(&self) -> Result<ExchangeRateSnapshot>;
}

fn build_http(timeout: Duration) -> Result<HttpClient> {
    HttpClient::builder()
        .timeout(timeout) // total request timeout
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(5))
        .user_agent(concat!("country_atlas/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::internal(format!("http client build: {e}")))
}

/// Single attempt GET + JSON decode; every failure is attributed to `upstream`.
fn get_json<T: DeserializeOwned>(http: &HttpClient, url: &str, upstream: Upstream) -> Result<T> {
    let resp = http
        .get(url)
        .send()
        .map_err(|e| Error::upstream_unavailable(upstream, format!("GET {url}: {e}")))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::upstream_unavailable(
            upstream,
            format!("GET {url}: HTTP {status}"),
        ));
    }
    resp.json::<T>()
        .map_err(|e| Error::upstream_unavailable(upstream, format!("decode json: {e}")))
}

#[derive(Debug, Clone)]
pub struct CountryClient {
    pub url: String,
    http: HttpClient,
}

impl CountryClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            http: build_http(timeout)?,
        })
    }
}

impl Default for CountryClient {
    fn default() -> Self {
        Self {
            url: DEFAULT_COUNTRIES_URL.into(),
            http: build_http(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .expect("reqwest client build"),
        }
    }
}

impl CountrySource for CountryClient {
    fn fetch_countries(&self) -> Result<Vec<CountryDescriptor>> {
        let body: Option<Vec<CountryDescriptor>> =
            get_json(&self.http, &self.url, Upstream::Countries)?;
        let countries = parse_countries(body)?;
        debug!("fetched {} country descriptors", countries.len());
        Ok(countries)
    }
}

/// Reject `null` and `[]` payloads.
pub fn parse_countries(body: Option<Vec<CountryDescriptor>>) -> Result<Vec<CountryDescriptor>> {
    match body {
        Some(list) if !list.is_empty() => Ok(list),
        _ => Err(Error::upstream_unavailable(
            Upstream::Countries,
            "empty country list",
        )),
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    pub url: String,
    http: HttpClient,
}

impl ExchangeRateClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            http: build_http(timeout)?,
        })
    }
}

impl Default for ExchangeRateClient {
    fn default() -> Self {
        Self {
            url: DEFAULT_RATES_URL.into(),
            http: build_http(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .expect("reqwest client build"),
        }
    }
}

impl RateSource for ExchangeRateClient {
    fn fetch_rates(&self) -> Result<ExchangeRateSnapshot> {
        let body: Option<RatesPayload> = get_json(&self.http, &self.url, Upstream::ExchangeRates)?;
        let snapshot = parse_rates(body)?;
        debug!(
            "fetched {} exchange rates (base {})",
            snapshot.rates.len(),
            snapshot.base_code
        );
        Ok(snapshot)
    }
}

/// Shape a rates payload into a snapshot; a missing or empty rate map is an error.
pub fn parse_rates(body: Option<RatesPayload>) -> Result<ExchangeRateSnapshot> {
    let payload = body.ok_or_else(|| {
        Error::upstream_unavailable(Upstream::ExchangeRates, "empty response body")
    })?;
    let rates = match payload.rates {
        Some(r) if !r.is_empty() => r,
        _ => {
            return Err(Error::upstream_unavailable(
                Upstream::ExchangeRates,
                "missing rate table",
            ));
        }
    };
    Ok(ExchangeRateSnapshot {
        base_code: payload.base_code.unwrap_or_else(|| "USD".to_string()),
        time_last_update_utc: payload.time_last_update_utc,
        rates,
    })
}
