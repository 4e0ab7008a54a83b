//! Closed filter/sort options for listing countries.

use crate::error::{Error, FieldError, Result};
use crate::models::CountryRecord;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CountryFilter {
    #[default]
    None,
    ByRegion(String),
    ByCurrency(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Store order.
    #[default]
    Default,
    GdpDesc,
    GdpAsc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(SortOrder::Default),
            "gdp_desc" => Ok(SortOrder::GdpDesc),
            "gdp_asc" => Ok(SortOrder::GdpAsc),
            other => Err(Error::ValidationFailed(vec![FieldError::new(
                "sort",
                format!("unknown sort key '{other}' (expected gdp_desc or gdp_asc)"),
            )])),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: CountryFilter,
    pub sort: SortOrder,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

impl ListQuery {
    /// Validate raw request parameters. Region wins when both filters are given.
    pub fn from_params(
        region: Option<&str>,
        currency: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Self> {
        let filter = match (non_blank(region), non_blank(currency)) {
            (Some(r), _) => CountryFilter::ByRegion(r.to_string()),
            (None, Some(c)) => CountryFilter::ByCurrency(c.to_string()),
            (None, None) => CountryFilter::None,
        };
        let sort = match sort {
            Some(s) => s.parse()?,
            None => SortOrder::Default,
        };
        Ok(Self { filter, sort })
    }
}

/// Sort in place; unknown GDP compares as zero. Stable for equal keys.
pub fn apply_sort(records: &mut [CountryRecord], sort: SortOrder) {
    match sort {
        SortOrder::Default => {}
        SortOrder::GdpDesc => {
            records.sort_by(|a, b| b.gdp_or_zero().total_cmp(&a.gdp_or_zero()))
        }
        SortOrder::GdpAsc => {
            records.sort_by(|a, b| a.gdp_or_zero().total_cmp(&b.gdp_or_zero()))
        }
    }
}
