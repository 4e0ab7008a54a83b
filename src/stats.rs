use crate::models::{CountryRecord, RankedCountry};

/// How many countries the summary ranks.
pub const TOP_N: usize = 5;

/// Rank records by estimated GDP, highest first.
///
/// Unknown and non-positive estimates are left out. The sort is stable, so
/// equal estimates keep their store order.
pub fn top_by_estimated_gdp(records: &[CountryRecord], n: usize) -> Vec<RankedCountry> {
    let mut ranked: Vec<(&str, f64)> = records
        .iter()
        .filter_map(|r| match r.estimated_gdp {
            Some(g) if g.is_finite() && g > 0.0 => Some((r.name.as_str(), g)),
            _ => None,
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (name, gdp))| RankedCountry {
            rank: i + 1,
            name: name.to_string(),
            estimated_gdp: gdp,
        })
        .collect()
}
