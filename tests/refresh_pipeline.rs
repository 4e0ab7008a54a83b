use chrono::{DateTime, Utc};
use country_atlas::api::{CountrySource, RateSource, parse_countries};
use country_atlas::artifact::{ArtifactStore, MemoryArtifactStore};
use country_atlas::estimate::{GdpEstimator, Multiplier};
use country_atlas::models::{CurrencyDescriptor, RankedCountry};
use country_atlas::store::{CountryStore, JsonFileStore, MemoryStore};
use country_atlas::viz::SummaryRenderer;
use country_atlas::{
    CountryDescriptor, CountryRecord, CountryService, Error, ExchangeRateSnapshot, ListQuery,
    Result, Upstream,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

struct FixedCountries(Vec<CountryDescriptor>);

impl CountrySource for FixedCountries {
    fn fetch_countries(&self) -> Result<Vec<CountryDescriptor>> {
        parse_countries(Some(self.0.clone()))
    }
}

struct FixedRates(ExchangeRateSnapshot);

impl RateSource for FixedRates {
    fn fetch_rates(&self) -> Result<ExchangeRateSnapshot> {
        Ok(self.0.clone())
    }
}

struct DownRates;

impl RateSource for DownRates {
    fn fetch_rates(&self) -> Result<ExchangeRateSnapshot> {
        Err(Error::upstream_unavailable(
            Upstream::ExchangeRates,
            "connection refused",
        ))
    }
}

struct BrokenRenderer;

impl SummaryRenderer for BrokenRenderer {
    fn render(&self, _: usize, _: &[RankedCountry], _: DateTime<Utc>) -> Result<()> {
        Err(Error::RenderFailure("read-only filesystem".into()))
    }
}

fn country(name: &str, population: u64, codes: &[&str]) -> CountryDescriptor {
    CountryDescriptor {
        name: Some(name.into()),
        capital: None,
        region: Some("Testland".into()),
        population: Some(population),
        flag: Some(format!("https://flags.example/{name}.svg")),
        currencies: codes.iter().map(|c| CurrencyDescriptor::with_code(c)).collect(),
    }
}

fn rates(pairs: &[(&str, f64)]) -> ExchangeRateSnapshot {
    ExchangeRateSnapshot::new("USD", pairs.iter().map(|(c, r)| (c.to_string(), *r)))
}

struct Harness {
    service: CountryService,
    store: Arc<MemoryStore>,
    artifacts: Arc<MemoryArtifactStore>,
}

fn harness(countries: Vec<CountryDescriptor>, snapshot: ExchangeRateSnapshot) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let artifacts = Arc::new(MemoryArtifactStore::default());
    let service = CountryService::new(
        store.clone(),
        Arc::new(FixedCountries(countries)),
        Arc::new(FixedRates(snapshot)),
        artifacts.clone(),
    );
    Harness {
        service,
        store,
        artifacts,
    }
}

fn seeded() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[test]
fn currency_and_no_currency_scenarios() {
    let h = harness(
        vec![country("Test", 1000, &["USD"]), country("NoCur", 500, &[])],
        rates(&[("USD", 2.0)]),
    );
    let result = h.service.refresh_all_with_rng(&mut seeded()).unwrap();
    assert_eq!(result.refreshed, 2);
    assert_eq!(result.total_countries, 2);

    let test = h.service.get_country("Test").unwrap();
    assert_eq!(test.currency_code.as_deref(), Some("USD"));
    assert_eq!(test.exchange_rate, Some(2.0));
    let gdp = test.estimated_gdp.unwrap();
    assert!((500_000.0..1_000_000.0).contains(&gdp), "gdp {gdp}");

    let nocur = h.service.get_country("NoCur").unwrap();
    assert_eq!(nocur.currency_code, None);
    assert_eq!(nocur.exchange_rate, None);
    assert_eq!(nocur.estimated_gdp, Some(0.0));
}

#[test]
fn unknown_or_non_positive_rate_leaves_gdp_unknown() {
    let h = harness(
        vec![country("Gone", 10, &["XXX"]), country("Zero", 10, &["ZZZ"])],
        rates(&[("USD", 1.0), ("ZZZ", 0.0)]),
    );
    h.service.refresh_all_with_rng(&mut seeded()).unwrap();
    for name in ["Gone", "Zero"] {
        let r = h.service.get_country(name).unwrap();
        assert!(r.currency_code.is_some());
        assert_eq!(r.exchange_rate, None);
        assert_eq!(r.estimated_gdp, None);
    }
}

#[test]
fn fixed_multiplier_gives_exact_estimate() {
    let h = harness(vec![country("Exact", 300, &["EUR"])], rates(&[("EUR", 0.5)]));
    let service = h
        .service
        .with_estimator(GdpEstimator::new(Multiplier::Fixed { value: 1500.0 }).unwrap());
    service.refresh_all_with_rng(&mut seeded()).unwrap();
    let r = service.get_country("exact").unwrap();
    assert_eq!(r.estimated_gdp, Some(300.0 * 1500.0 / 0.5));
}

#[test]
fn refreshing_twice_keeps_one_record_per_name() {
    let h = harness(
        vec![country("France", 67, &["EUR"]), country("Chad", 17, &["XAF"])],
        rates(&[("EUR", 0.9), ("XAF", 600.0)]),
    );
    h.service.refresh_all_with_rng(&mut seeded()).unwrap();
    let first = h.store.find_all().unwrap();
    h.service.refresh_all_with_rng(&mut seeded()).unwrap();
    let second = h.store.find_all().unwrap();

    assert_eq!(second.len(), 2);
    let ids = |rows: &[CountryRecord]| rows.iter().map(|r| (r.name.clone(), r.id)).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    assert!(second[0].last_refreshed_at >= first[0].last_refreshed_at);
}

#[test]
fn lookups_ignore_case() {
    let h = harness(vec![country("France", 67, &["EUR"])], rates(&[("EUR", 0.9)]));
    h.service.refresh_all_with_rng(&mut seeded()).unwrap();
    assert_eq!(
        h.service.get_country("france").unwrap(),
        h.service.get_country("FRANCE").unwrap()
    );
    assert!(h.service.get_country("Spain").unwrap_err().is_not_found());
}

#[test]
fn delete_removes_or_reports_missing() {
    let h = harness(
        vec![country("France", 67, &["EUR"]), country("Chad", 17, &["XAF"])],
        rates(&[("EUR", 0.9), ("XAF", 600.0)]),
    );
    h.service.refresh_all_with_rng(&mut seeded()).unwrap();

    h.service.delete_country("CHAD").unwrap();
    assert!(h.service.get_country("Chad").unwrap_err().is_not_found());
    assert_eq!(h.service.status().unwrap().total_countries, 1);

    let err = h.service.delete_country("Chad").unwrap_err();
    assert!(matches!(err, Error::NotFound(ref n) if n == "Chad"));
}

#[test]
fn empty_country_list_changes_nothing() {
    let h = harness(vec![], rates(&[("USD", 1.0)]));
    let mut existing = CountryRecord {
        id: 0,
        name: "Keep".into(),
        capital: None,
        region: None,
        population: 1,
        currency_code: None,
        exchange_rate: None,
        estimated_gdp: Some(0.0),
        flag_url: None,
        last_refreshed_at: Utc::now(),
    };
    existing = h.store.upsert(existing).unwrap();

    let err = h.service.refresh_all_with_rng(&mut seeded()).unwrap_err();
    assert!(matches!(err, Error::RefreshFailed { .. }));
    assert_eq!(err.upstream(), Some(Upstream::Countries));
    assert!(err.is_retryable());
    assert_eq!(h.store.find_all().unwrap(), vec![existing]);
    assert!(h.artifacts.read().unwrap().is_none());
}

#[test]
fn rate_outage_aborts_before_writing() {
    let store = Arc::new(MemoryStore::new());
    let service = CountryService::new(
        store.clone(),
        Arc::new(FixedCountries(vec![country("France", 67, &["EUR"])])),
        Arc::new(DownRates),
        Arc::new(MemoryArtifactStore::default()),
    );
    let err = service.refresh_all_with_rng(&mut seeded()).unwrap_err();
    assert_eq!(err.upstream(), Some(Upstream::ExchangeRates));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn invalid_descriptor_rejects_whole_batch() {
    let mut nameless = country("", 5, &["EUR"]);
    nameless.name = None;
    let mut unknown_pop = country("Ghost", 0, &["EUR"]);
    unknown_pop.population = None;
    let h = harness(
        vec![country("France", 67, &["EUR"]), nameless, unknown_pop],
        rates(&[("EUR", 0.9)]),
    );

    let err = h.service.refresh_all_with_rng(&mut seeded()).unwrap_err();
    match err.root_cause() {
        Error::ValidationFailed(fields) => {
            let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
            assert!(names.contains(&"name"));
            assert!(names.contains(&"population"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.store.count().unwrap(), 0);
}

#[test]
fn status_tracks_batch_time() {
    let h = harness(
        vec![country("A", 1, &["USD"]), country("B", 2, &["USD"]), country("C", 3, &[])],
        rates(&[("USD", 1.0)]),
    );
    let before = h.service.status().unwrap();
    assert_eq!(before.total_countries, 0);
    assert_eq!(before.last_refreshed_at, None);

    let result = h.service.refresh_all_with_rng(&mut seeded()).unwrap();
    let after = h.service.status().unwrap();
    assert_eq!(after.total_countries, 3);
    assert_eq!(after.last_refreshed_at, Some(result.refreshed_at));
    assert!(
        h.store
            .find_all()
            .unwrap()
            .iter()
            .all(|r| r.last_refreshed_at == result.refreshed_at)
    );
}

#[test]
fn top_five_is_descending_and_stable() {
    let h = harness(
        vec![
            country("Small", 100, &["USD"]),
            country("TieFirst", 500, &["USD"]),
            country("Huge", 900, &["USD"]),
            country("NoRate", 10_000, &["XXX"]),
            country("TieSecond", 500, &["USD"]),
            country("Mid", 300, &["USD"]),
            country("Tiny", 50, &["USD"]),
            country("NoCur", 10_000, &[]),
        ],
        rates(&[("USD", 1.0)]),
    );
    let service = h
        .service
        .with_estimator(GdpEstimator::new(Multiplier::Fixed { value: 1000.0 }).unwrap());
    let result = service.refresh_all_with_rng(&mut seeded()).unwrap();

    let names: Vec<&str> = result.top.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Huge", "TieFirst", "TieSecond", "Mid", "Small"]);
    let ranks: Vec<usize> = result.top.iter().map(|t| t.rank).collect();
    assert_eq!(ranks, [1, 2, 3, 4, 5]);
    assert_eq!(result.top[0].estimated_gdp, 900_000.0);
}

#[test]
fn summary_image_available_after_refresh() {
    let h = harness(vec![country("France", 67, &["EUR"])], rates(&[("EUR", 0.9)]));
    assert!(h.service.summary_image().unwrap_err().is_not_found());

    h.service.refresh_all_with_rng(&mut seeded()).unwrap();
    let png = h.service.summary_image().unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn render_failure_keeps_written_batch() {
    let h = harness(
        vec![country("France", 67, &["EUR"]), country("Chad", 17, &["XAF"])],
        rates(&[("EUR", 0.9), ("XAF", 600.0)]),
    );
    let service = h.service.with_renderer(Arc::new(BrokenRenderer));
    let err = service.refresh_all_with_rng(&mut seeded()).unwrap_err();
    assert!(matches!(err.root_cause(), Error::RenderFailure(_)));
    assert!(!err.is_retryable());
    assert_eq!(h.store.count().unwrap(), 2);
}

#[test]
fn concurrent_refreshes_do_not_duplicate() {
    let names = ["Alpha", "Beta", "Gamma", "Delta"];
    let h = harness(
        names.iter().map(|n| country(n, 10, &["USD"])).collect(),
        rates(&[("USD", 1.0)]),
    );
    let service = Arc::new(h.service);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let s = Arc::clone(&service);
            thread::spawn(move || s.refresh_all())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let rows = h.store.find_all().unwrap();
    assert_eq!(rows.len(), names.len());
    let ids: HashSet<u64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), names.len());
    let stored: HashSet<String> = rows.iter().map(|r| r.name.to_lowercase()).collect();
    assert_eq!(stored.len(), names.len());
}

#[test]
fn seeded_service_is_reproducible() {
    let descriptors = vec![country("A", 1000, &["USD"]), country("B", 2000, &["USD"])];
    let snapshot = rates(&[("USD", 3.0)]);

    let run = || {
        let h = harness(descriptors.clone(), snapshot.clone());
        let service = h.service.with_seed(Some(7));
        service.refresh_all().unwrap();
        service
            .list_countries(&ListQuery::default())
            .unwrap()
            .into_iter()
            .map(|r| r.estimated_gdp)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn list_filters_and_sorts() {
    let mut asia = country("Japan", 125, &["JPY"]);
    asia.region = Some("Asia".into());
    let h = harness(
        vec![
            country("France", 67, &["EUR"]),
            asia,
            country("Germany", 83, &["EUR"]),
            country("Nowhere", 5, &[]),
        ],
        rates(&[("EUR", 1.0), ("JPY", 1.0)]),
    );
    let service = h
        .service
        .with_estimator(GdpEstimator::new(Multiplier::Fixed { value: 1000.0 }).unwrap());
    service.refresh_all_with_rng(&mut seeded()).unwrap();

    let q = ListQuery::from_params(None, Some("eur"), Some("gdp_desc")).unwrap();
    let names: Vec<String> = service
        .list_countries(&q)
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, ["Germany", "France"]);

    let q = ListQuery::from_params(Some("ASIA"), Some("EUR"), None).unwrap();
    let rows = service.list_countries(&q).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Japan");

    let q = ListQuery::from_params(None, None, Some("gdp_asc")).unwrap();
    let rows = service.list_countries(&q).unwrap();
    assert_eq!(rows[0].name, "Nowhere");

    assert!(matches!(
        ListQuery::from_params(None, None, Some("population")),
        Err(Error::ValidationFailed(_))
    ));
}

#[test]
fn overflowing_estimate_survives_json_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("countries.json");
    let service = CountryService::new(
        Arc::new(JsonFileStore::open(&path).unwrap()),
        Arc::new(FixedCountries(vec![
            country("Tiny", 1_000_000_000, &["TNY"]),
            country("Normal", 1_000, &["USD"]),
        ])),
        Arc::new(FixedRates(rates(&[("TNY", 1e-305), ("USD", 1.0)]))),
        Arc::new(MemoryArtifactStore::default()),
    );
    let result = service.refresh_all_with_rng(&mut seeded()).unwrap();
    assert_eq!(result.top.len(), 1);
    assert_eq!(result.top[0].name, "Normal");

    let reopened = JsonFileStore::open(&path).unwrap();
    let tiny = reopened.find_by_name("tiny").unwrap().unwrap();
    assert_eq!(tiny.currency_code.as_deref(), Some("TNY"));
    assert_eq!(tiny.exchange_rate, None);
    assert_eq!(tiny.estimated_gdp, None);
}
