//! oxide-query CLI
//!
//! Compiles filter-DSL queries to SQL and runs them against SQLite.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_query::sqlite::connect_options;
use oxide_query::{ConnectionSettings, FilterValue, Query, Relation, SqliteSession};

/// Fluent query builder with a `table.column__operator` filter DSL.
#[derive(Parser)]
#[command(name = "oxide-query")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Connection settings file (JSON). Takes precedence over --database.
    #[arg(short, long, env = "OXIDE_QUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Named connection from the settings file (default connection if not
    /// specified).
    #[arg(long)]
    connection: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the subcommands that build a query.
#[derive(Args)]
struct QueryArgs {
    /// Base table.
    #[arg(short, long)]
    table: String,

    /// Filters as `table.column__op=value`; values are parsed as JSON and
    /// fall back to plain text.
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Combine the filters with OR instead of AND.
    #[arg(long)]
    or: bool,

    /// Order by a column; prefix with `-` for descending.
    #[arg(short, long)]
    order: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the SQL for a query without executing it.
    Sql {
        #[command(flatten)]
        query: QueryArgs,

        /// Columns of the table (comma separated).
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Primary key column.
        #[arg(long)]
        pk: Option<String>,

        /// Target dialect (postgresql, mysql, sqlite).
        #[arg(long, default_value = "postgresql")]
        dialect: String,

        /// Inline parameter values into the SQL.
        #[arg(long)]
        show_params: bool,

        /// Print one clause per line, continuations indented by this many spaces.
        #[arg(long, value_name = "INDENT", num_args = 0..=1, default_missing_value = "2")]
        pretty: Option<usize>,

        /// Maximum number of rows.
        #[arg(short, long)]
        limit: Option<i64>,

        /// Rows to skip.
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Run a query and print one page of rows as JSON.
    Query {
        #[command(flatten)]
        query: QueryArgs,

        /// Page number, starting at 1.
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        /// Rows per page.
        #[arg(long, default_value_t = 10)]
        per_page: i64,
    },

    /// Count the rows matching a query.
    Count {
        #[command(flatten)]
        query: QueryArgs,
    },
}

fn parse_filter(raw: &str) -> anyhow::Result<(String, FilterValue)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("filter '{raw}' is not of the form key=value"))?;
    let value = serde_json::from_str::<serde_json::Value>(value)
        .unwrap_or_else(|_| serde_json::Value::String(String::from(value)));
    Ok((String::from(key), FilterValue::from(value)))
}

fn build_query(args: &QueryArgs, relation: Relation) -> anyhow::Result<Query> {
    let filters = args
        .filters
        .iter()
        .map(|raw| parse_filter(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let mut query = Query::new().table(relation.clone());
    if !filters.is_empty() {
        query = query.apply_filters(filters, args.or)?;
    }
    for key in &args.order {
        let order = match key.strip_prefix('-') {
            Some(name) => relation.column(name)?.desc(),
            None => relation.column(key)?.asc(),
        };
        query = query.order_by([order]);
    }
    Ok(query)
}

async fn connect(cli: &Cli) -> anyhow::Result<(SqlitePool, bool)> {
    if let Some(path) = &cli.config {
        let settings = ConnectionSettings::from_file(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = settings.get(cli.connection.as_deref())?;
        return Ok((config.connect_sqlite().await?, config.echo));
    }
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options(&cli.database)?)
        .await?;
    Ok((pool, false))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::Sql {
            query,
            columns,
            pk,
            dialect,
            show_params,
            pretty,
            limit,
            offset,
        } => {
            let mut relation =
                Relation::table(&query.table).with_columns(columns.iter().cloned());
            if let Some(pk) = pk {
                relation = relation.with_primary_key(pk);
            }
            let mut built = build_query(query, relation)?;
            if let Some(n) = limit {
                built = built.limit(*n)?;
            }
            if let Some(n) = offset {
                built = built.offset(*n)?;
            }
            let sql = match pretty {
                Some(indent) => built.format_sql(dialect, *show_params, *indent)?,
                None => built.to_sql(dialect, *show_params)?,
            };
            println!("{sql}");
        }

        Commands::Query {
            query,
            page,
            per_page,
        } => {
            let (pool, echo) = connect(&cli).await?;
            let session = SqliteSession::acquire(&pool).await?.with_echo(echo);
            let relation = session.describe(&query.table).await?;
            let result = build_query(query, relation)?
                .paginate(&session, *page, *per_page)
                .await?;
            info!(
                total = result.pagination.total_records,
                page = result.pagination.current_page,
                "Fetched page"
            );
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Count { query } => {
            let (pool, echo) = connect(&cli).await?;
            let session = SqliteSession::acquire(&pool).await?.with_echo(echo);
            let relation = session.describe(&query.table).await?;
            let total = build_query(query, relation)?.count(&session).await?;
            println!("{total}");
        }
    }

    Ok(())
}
