//! The refresh pipeline (fetch → correlate → derive → upsert → summarize) and
//! the read/delete operations over stored countries.

use crate::api::{CountryClient, CountrySource, ExchangeRateClient, RateSource};
use crate::artifact::{ArtifactStore, FsArtifactStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::estimate::GdpEstimator;
use crate::merge;
use crate::models::{CountryDescriptor, CountryRecord, ExchangeRateSnapshot, RefreshResult, Status};
use crate::query::{CountryFilter, ListQuery, apply_sort};
use crate::stats::{TOP_N, top_by_estimated_gdp};
use crate::store::{CountryStore, JsonFileStore};
use crate::viz::{PngSummaryRenderer, SummaryRenderer};
use chrono::Utc;
use log::{debug, error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use std::thread;

pub struct CountryService {
    store: Arc<dyn CountryStore>,
    countries: Arc<dyn CountrySource>,
    rates: Arc<dyn RateSource>,
    artifacts: Arc<dyn ArtifactStore>,
    renderer: Arc<dyn SummaryRenderer>,
    estimator: GdpEstimator,
    seed: Option<u64>,
    /// Single-flight guard: one refresh cycle at a time.
    refresh_lock: Mutex<()>,
}

impl CountryService {
    /// Wire a service; the summary is rendered as PNG into `artifacts`.
    pub fn new(
        store: Arc<dyn CountryStore>,
        countries: Arc<dyn CountrySource>,
        rates: Arc<dyn RateSource>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        let renderer = Arc::new(PngSummaryRenderer::new(artifacts.clone()));
        Self {
            store,
            countries,
            rates,
            artifacts,
            renderer,
            estimator: GdpEstimator::default(),
            seed: None,
            refresh_lock: Mutex::new(()),
        }
    }

    /// JSON file store, filesystem artifact and HTTP clients, all from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(JsonFileStore::open(config.store_path())?);
        let artifacts = Arc::new(FsArtifactStore::in_cache_dir(config.cache_dir()));
        let countries = Arc::new(CountryClient::new(&config.countries_url, config.timeout())?);
        let rates = Arc::new(ExchangeRateClient::new(&config.rates_url, config.timeout())?);
        Ok(Self::new(store, countries, rates, artifacts)
            .with_estimator(GdpEstimator::new(config.gdp_multiplier)?)
            .with_seed(config.seed))
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn SummaryRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_estimator(mut self, estimator: GdpEstimator) -> Self {
        debug!("gdp multiplier: {:?}", estimator.multiplier());
        self.estimator = estimator;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Run one refresh cycle with a generator scoped to this cycle.
    pub fn refresh_all(&self) -> Result<RefreshResult> {
        let mut rng: StdRng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => rand::make_rng(),
        };
        self.refresh_all_with_rng(&mut rng)
    }

    /// Run one refresh cycle drawing GDP multipliers from `rng`.
    ///
    /// Any failure is reported as [`Error::RefreshFailed`]. Fetch and
    /// validation failures happen before anything is written; a render failure
    /// leaves the upserted batch in place.
    pub fn refresh_all_with_rng<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<RefreshResult> {
        let _guard = self
            .refresh_lock
            .lock()
            .map_err(|_| Error::refresh_failed(Error::internal("refresh lock poisoned")))?;
        match self.run_cycle(rng) {
            Ok(result) => {
                info!(
                    "refreshed {} countries ({} stored)",
                    result.refreshed, result.total_countries
                );
                Ok(result)
            }
            Err(e) => {
                error!("error refreshing countries: {e:?}");
                Err(Error::refresh_failed(e))
            }
        }
    }

    fn run_cycle<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<RefreshResult> {
        let (snapshot, descriptors) = self.fetch_upstreams()?;
        let refreshed_at = Utc::now();

        let records =
            merge::build_records(&descriptors, &snapshot, refreshed_at, &self.estimator, rng)?;
        let stored = self.store.upsert_all(records)?;
        debug!("upserted {} records", stored.len());

        let all = self.store.find_all()?;
        let top = top_by_estimated_gdp(&all, TOP_N);
        self.renderer.render(all.len(), &top, refreshed_at)?;

        Ok(RefreshResult {
            refreshed: stored.len(),
            total_countries: all.len(),
            refreshed_at,
            top,
        })
    }

    /// Both upstreams are fetched concurrently; the country source's failure is
    /// reported first when both fail.
    fn fetch_upstreams(&self) -> Result<(ExchangeRateSnapshot, Vec<CountryDescriptor>)> {
        let countries_src = &self.countries;
        let rates_src = &self.rates;
        let (countries, rates) = thread::scope(|s| {
            let countries = s.spawn(|| countries_src.fetch_countries());
            let rates = s.spawn(|| rates_src.fetch_rates());
            (
                countries
                    .join()
                    .unwrap_or_else(|_| Err(Error::internal("country fetch panicked"))),
                rates
                    .join()
                    .unwrap_or_else(|_| Err(Error::internal("rate fetch panicked"))),
            )
        });
        let countries = countries?;
        let rates = rates?;
        Ok((rates, countries))
    }

    pub fn list_countries(&self, query: &ListQuery) -> Result<Vec<CountryRecord>> {
        let mut rows = match &query.filter {
            CountryFilter::None => self.store.find_all()?,
            CountryFilter::ByRegion(region) => self.store.find_by_region(region)?,
            CountryFilter::ByCurrency(code) => self.store.find_by_currency(code)?,
        };
        apply_sort(&mut rows, query.sort);
        Ok(rows)
    }

    pub fn get_country(&self, name: &str) -> Result<CountryRecord> {
        self.store
            .find_by_name(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn delete_country(&self, name: &str) -> Result<()> {
        if !self.store.exists_by_name(name)? {
            return Err(Error::NotFound(name.to_string()));
        }
        self.store.delete_by_name(name)?;
        info!("deleted country {name}");
        Ok(())
    }

    pub fn status(&self) -> Result<Status> {
        Ok(Status {
            total_countries: self.store.count()?,
            last_refreshed_at: self.store.latest_refresh()?,
        })
    }

    /// PNG bytes of the last rendered summary.
    pub fn summary_image(&self) -> Result<Vec<u8>> {
        self.artifacts
            .read()?
            .ok_or_else(|| Error::NotFound("summary image".to_string()))
    }
}
