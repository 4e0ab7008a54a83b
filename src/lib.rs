//! country_atlas
//!
//! A small Rust library for pulling country reference data and currency
//! exchange rates from two public APIs, merging them into one record per
//! country with a derived GDP estimate, storing the result, and rendering a
//! PNG summary. Pairs with the `country-atlas` CLI.
//!
//! ### Features
//! - Fetch countries and exchange rates (one attempt each, concurrently)
//! - Derive a stochastic GDP estimate with an injectable random source
//! - Idempotent upsert keyed by case-insensitive country name
//! - Top-5 ranking and an 800×600 PNG summary
//! - List / get / delete / status queries and CSV or JSON export
//!
//! ### Example
//! ```no_run
//! use country_atlas::{Config, CountryService, ListQuery};
//!
//! let service = CountryService::from_config(&Config::default())?;
//! let result = service.refresh_all()?;
//! println!("{} countries stored", result.total_countries);
//! let europe = service.list_countries(&ListQuery::from_params(Some("Europe"), None, Some("gdp_desc"))?)?;
//! country_atlas::storage::save_csv(&europe, "europe.csv")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod artifact;
pub mod config;
pub mod error;
pub mod estimate;
pub mod merge;
pub mod models;
pub mod query;
pub mod service;
pub mod stats;
pub mod storage;
pub mod store;
pub mod viz;

pub use config::Config;
pub use error::{Error, FieldError, Result, Upstream};
pub use models::{CountryDescriptor, CountryRecord, ExchangeRateSnapshot, RefreshResult, Status};
pub use query::{CountryFilter, ListQuery, SortOrder};
pub use service::CountryService;
