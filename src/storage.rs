use crate::models::CountryRecord;
use anyhow::Result;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that spreadsheet apps would treat as formulas.
fn safe_cell(s: &str) -> String {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{s}"),
        _ => s.to_string(),
    }
}

fn safe_opt(s: &Option<String>) -> String {
    s.as_deref().map(safe_cell).unwrap_or_default()
}

/// Save stored countries as CSV with header.
pub fn save_csv<P: AsRef<Path>>(records: &[CountryRecord], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize((
        "id",
        "name",
        "capital",
        "region",
        "population",
        "currency_code",
        "exchange_rate",
        "estimated_gdp",
        "flag_url",
        "last_refreshed_at",
    ))?;
    for r in records {
        wtr.serialize((
            r.id,
            safe_cell(&r.name),
            safe_opt(&r.capital),
            safe_opt(&r.region),
            r.population,
            safe_opt(&r.currency_code),
            r.exchange_rate,
            r.estimated_gdp,
            safe_opt(&r.flag_url),
            r.last_refreshed_at.to_rfc3339(),
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save stored countries as pretty JSON array.
pub fn save_json<P: AsRef<Path>>(records: &[CountryRecord], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(records)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
