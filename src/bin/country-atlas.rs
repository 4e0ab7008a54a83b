use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use country_atlas::{Config, CountryService, ListQuery, SortOrder, storage};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "country-atlas",
    version,
    about = "Fetch, merge, store & summarize country data with exchange rates"
)]
struct Cli {
    /// JSON config file (all fields optional).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the country store and the summary image cache.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Fix the random seed used for GDP estimates.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Debug logging (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch both upstreams, merge, store, and render the summary image.
    Refresh,
    /// List stored countries.
    List(ListArgs),
    /// Show one country (case-insensitive name).
    Get { name: String },
    /// Delete one country (case-insensitive name).
    Delete { name: String },
    /// Count and last refresh time.
    Status,
    /// Copy the summary image to a file.
    Image {
        #[arg(long)]
        out: PathBuf,
    },
    /// Export stored countries (format inferred by --format or extension).
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only countries in this region.
    #[arg(long)]
    region: Option<String>,
    /// Only countries using this currency code (ignored when --region is set).
    #[arg(long)]
    currency: Option<String>,
    /// Order by estimated GDP; store order when omitted.
    #[arg(long, value_enum)]
    sort: Option<SortKey>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortKey {
    #[value(name = "gdp_desc")]
    GdpDesc,
    #[value(name = "gdp_asc")]
    GdpAsc,
}

impl From<SortKey> for SortOrder {
    fn from(k: SortKey) -> Self {
        match k {
            SortKey::GdpDesc => SortOrder::GdpDesc,
            SortKey::GdpAsc => SortOrder::GdpAsc,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;
    let service = CountryService::from_config(&config)?;

    match cli.cmd {
        Command::Refresh => {
            let result = service.refresh_all()?;
            print_json(&result)?;
        }
        Command::List(args) => {
            let mut query =
                ListQuery::from_params(args.region.as_deref(), args.currency.as_deref(), None)?;
            query.sort = args.sort.map(SortOrder::from).unwrap_or_default();
            print_json(&service.list_countries(&query)?)?;
        }
        Command::Get { name } => print_json(&service.get_country(&name)?)?,
        Command::Delete { name } => {
            service.delete_country(&name)?;
            eprintln!("Deleted {name}");
        }
        Command::Status => print_json(&service.status()?)?,
        Command::Image { out } => {
            let bytes = service.summary_image()?;
            std::fs::write(&out, bytes)
                .with_context(|| format!("write {}", out.display()))?;
            eprintln!("Wrote summary image to {}", out.display());
        }
        Command::Export(args) => cmd_export(&service, args)?,
    }
    Ok(())
}

fn cmd_export(service: &CountryService, args: ExportArgs) -> Result<()> {
    let records = service.list_countries(&ListQuery::default())?;
    let fmt = match args.format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => args.out.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    match fmt.as_str() {
        "csv" => storage::save_csv(&records, &args.out)?,
        "json" => storage::save_json(&records, &args.out)?,
        other => anyhow::bail!("unsupported format: {}", other),
    }
    eprintln!("Saved {} rows to {}", records.len(), args.out.display());
    Ok(())
}
