use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shelf_app::books::{
    self,
    query::{parse_threshold, CatalogQuery, Combinator, FieldFilter, SortField},
    stats::compute_statistics,
    validation::{validate_for_create, validate_rating},
};
use shelf_kernel::settings::Settings;

/// Book catalog service and command-line tools
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    /// Catalog document to use instead of the configured `storage.data_path`
    #[arg(long, global = true, value_name = "PATH")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    #[command(flatten)]
    Catalog(CatalogCommand),
}

/// Commands that run directly against the catalog document
#[derive(Debug, Subcommand)]
enum CatalogCommand {
    /// List books, optionally filtered and sorted
    List {
        /// Case-insensitive genre match
        #[arg(long)]
        genre: Option<String>,
        /// Keep books rated at least this high
        #[arg(long, value_parser = parse_min_rating)]
        min_rating: Option<f64>,
        /// Field to sort ascending by, e.g. `title` or `publicationYear`
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show one book
    Show { id: String },
    /// Filter by numeric field thresholds (`field > threshold`)
    Search {
        /// Condition in the form `field=threshold`; repeatable
        #[arg(long = "where", value_name = "FIELD=THRESHOLD", value_parser = parse_condition)]
        conditions: Vec<(String, f64)>,
        #[arg(long, value_enum, default_value_t = Operator::And)]
        operator: Operator,
        #[arg(long)]
        sort: Option<String>,
    },
    /// Print catalog statistics
    Stats,
    /// Add a book from a JSON object
    Add {
        #[arg(long, value_name = "OBJECT")]
        json: String,
    },
    /// Set the rating of a book
    Rate { id: String, rating: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Operator {
    And,
    Or,
}

impl From<Operator> for Combinator {
    fn from(op: Operator) -> Self {
        match op {
            Operator::And => Combinator::And,
            Operator::Or => Combinator::Or,
        }
    }
}

fn parse_condition(raw: &str) -> Result<(String, f64), String> {
    let (field, threshold) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=THRESHOLD, got '{raw}'"))?;
    let field = field.trim();
    let threshold = parse_threshold(field, threshold).map_err(|e| e.to_string())?;
    Ok((field.to_string(), threshold))
}

fn parse_min_rating(raw: &str) -> Result<f64, String> {
    parse_threshold("min-rating", raw).map_err(|e| e.to_string())
}

fn parse_sort(sort: Option<String>) -> anyhow::Result<Option<SortField>> {
    Ok(sort.map(|s| s.parse::<SortField>()).transpose()?)
}

fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load Shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    if let Some(data) = cli.data {
        settings.storage.data_path = data;
    }

    tracing::debug!(
        env = ?settings.environment,
        data = %settings.storage.data_path.display(),
        "shelf cli starting"
    );

    match cli.command {
        Command::Serve => shelf_app::run(settings).await,
        Command::Catalog(command) => {
            let store = books::open_store(&settings.storage.data_path).with_context(|| {
                format!(
                    "failed to open catalog at {}",
                    settings.storage.data_path.display()
                )
            })?;
            run_catalog(&store, command)
        }
    }
}

fn run_catalog(store: &books::Store, command: CatalogCommand) -> anyhow::Result<()> {
    match command {
        CatalogCommand::List {
            genre,
            min_rating,
            sort,
        } => {
            let query = CatalogQuery {
                genre,
                min_rating,
                fields: None,
                sort: parse_sort(sort)?,
            };
            emit(&query.run(&store.all()))
        }
        CatalogCommand::Show { id } => emit(&store.get(&id)?),
        CatalogCommand::Search {
            conditions,
            operator,
            sort,
        } => {
            let query = CatalogQuery {
                fields: Some(FieldFilter::new(conditions, operator.into())?),
                sort: parse_sort(sort)?,
                ..CatalogQuery::default()
            };
            emit(&query.run(&store.all()))
        }
        CatalogCommand::Stats => emit(&compute_statistics(&store.all())),
        CatalogCommand::Add { json } => {
            let input: serde_json::Value =
                serde_json::from_str(&json).map_err(|e| anyhow!("--json is not valid JSON: {e}"))?;
            let validated = validate_for_create(&input)?;
            emit(&store.insert(validated)?)
        }
        CatalogCommand::Rate { id, rating } => {
            let rating = validate_rating(&serde_json::Value::String(rating))?;
            emit(&store.update_rating(&id, rating)?)
        }
    }
}
