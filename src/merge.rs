//! Correlate country descriptors with the rate snapshot into storable records.

use crate::error::{Error, FieldError, Result};
use crate::estimate::GdpEstimator;
use crate::models::{CountryDescriptor, CountryRecord, ExchangeRateSnapshot};
use chrono::{DateTime, Utc};
use log::warn;

/// Check the fields a record cannot exist without.
pub fn validate(descriptor: &CountryDescriptor) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if descriptor
        .name
        .as_deref()
        .map(|n| n.trim().is_empty())
        .unwrap_or(true)
    {
        errors.push(FieldError::new("name", "is required"));
    }
    if descriptor.population.is_none() {
        let label = descriptor.name.as_deref().unwrap_or("<unnamed>");
        errors.push(FieldError::new(
            "population",
            format!("is required (country {label})"),
        ));
    }
    errors
}

/// Build one record. `id` is left at 0; the store assigns or reuses it.
pub fn build_record<R: rand::Rng + ?Sized>(
    descriptor: &CountryDescriptor,
    snapshot: &ExchangeRateSnapshot,
    refreshed_at: DateTime<Utc>,
    estimator: &GdpEstimator,
    rng: &mut R,
) -> Result<CountryRecord> {
    let errors = validate(descriptor);
    if !errors.is_empty() {
        return Err(Error::ValidationFailed(errors));
    }
    let name = descriptor.name.as_deref().unwrap_or_default().trim().to_string();
    let population = descriptor.population.unwrap_or_default();

    let (currency_code, exchange_rate, estimated_gdp) = match descriptor.primary_currency() {
        Some(code) => match snapshot.rate_for(code) {
            Some(rate) => {
                let gdp = estimator.estimate(population, rate, rng);
                if gdp.is_finite() {
                    (Some(code.to_string()), Some(rate), Some(gdp))
                } else {
                    // Overflow from a vanishing rate: same as an unknown rate.
                    warn!("estimate for {name} overflowed (rate {rate} {code}); leaving it unknown");
                    (Some(code.to_string()), None, None)
                }
            }
            None => (Some(code.to_string()), None, None),
        },
        // No currency at all: zero, not unknown.
        None => (None, None, Some(0.0)),
    };

    Ok(CountryRecord {
        id: 0,
        name,
        capital: descriptor.capital.clone(),
        region: descriptor.region.clone(),
        population,
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: descriptor.flag.clone(),
        last_refreshed_at: refreshed_at,
    })
}

/// Build the whole batch, collecting every validation problem before failing.
pub fn build_records<R: rand::Rng + ?Sized>(
    descriptors: &[CountryDescriptor],
    snapshot: &ExchangeRateSnapshot,
    refreshed_at: DateTime<Utc>,
    estimator: &GdpEstimator,
    rng: &mut R,
) -> Result<Vec<CountryRecord>> {
    let errors: Vec<FieldError> = descriptors.iter().flat_map(validate).collect();
    if !errors.is_empty() {
        return Err(Error::ValidationFailed(errors));
    }
    descriptors
        .iter()
        .map(|d| build_record(d, snapshot, refreshed_at, estimator, rng))
        .collect()
}
