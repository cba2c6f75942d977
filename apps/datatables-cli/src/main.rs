use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use datatables_core::DatatableRequest;
use datatables_db::{Datatable, TableSource};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, TableConfig};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use std::io::Read;
use std::path::{Path, PathBuf};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if create_dirs {
        if let Some(dir) = p.parent() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Server-side processing for DataTables-style grids over a SQL database
#[derive(Parser)]
#[command(name = "datatables-cli")]
#[command(about = "Server-side processing for DataTables-style grids over a SQL database")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one grid request against a configured table and print the page
    Query {
        /// Table definition name from the `tables` section
        #[arg(short, long)]
        table: String,

        /// JSON request payload; read from stdin when omitted
        #[arg(short, long)]
        request: Option<PathBuf>,
    },
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.home_dir));
    tracing::info!("datatables-cli starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Query { table, request } => run_query(&config, &table, request.as_deref()).await,
        Commands::Check => check_config(&config),
    }
}

fn read_request(path: Option<&Path>) -> Result<DatatableRequest> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };
    let params: serde_json::Value =
        serde_json::from_str(&raw).context("Request payload is not valid JSON")?;
    Ok(DatatableRequest::from_params(&params))
}

async fn connect(config: &AppConfig) -> Result<DatabaseConnection> {
    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("Database URL not configured"))?;

    let mut dsn = db_config.url.trim().to_owned();
    if dsn.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    // Absolutize sqlite DSNs to avoid cwd issues
    if dsn.starts_with("sqlite://") {
        dsn = absolutize_sqlite_dsn(&dsn, Path::new(&config.home_dir), true)?;
    }

    tracing::info!("Connecting to database: {}", dsn);
    let db = Database::connect(dsn.as_str())
        .await
        .with_context(|| format!("Failed to connect to {dsn}"))?;
    tracing::info!("Connected DB backend: {:?}", db.get_database_backend());
    Ok(db)
}

fn build_table<C>(
    config: &AppConfig,
    conn: C,
    table: &TableConfig,
) -> Result<Datatable<TableSource<C>>>
where
    C: ConnectionTrait + Send + Sync,
{
    if table.columns.is_empty() {
        return Err(anyhow!("table '{}' lists no result columns", table.table));
    }
    let source = TableSource::new(conn, table.table.as_str(), table.columns.iter().cloned());
    let dt = Datatable::builder()
        .source(source)
        .view_columns(table.view_columns.iter().cloned())
        .registry(table.registry())
        .config(config.datatables.clone())
        .build()?;
    Ok(dt)
}

async fn run_query(config: &AppConfig, name: &str, request: Option<&Path>) -> Result<()> {
    let table = config.table(name)?;
    let req = read_request(request)?;
    let conn = connect(config).await?;

    let dt = build_table(config, conn, table).with_context(|| format!("table '{name}'"))?;
    let page = dt.run(&req).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Nothing below issues a query, so a disconnected handle is enough.
    for (name, table) in &config.tables {
        build_table(config, DatabaseConnection::default(), table)
            .with_context(|| format!("table '{name}'"))?;
        tracing::debug!(table = %name, "table definition is valid");
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!(
        "db_adapter: {}, tables: {}",
        config.datatables.db_adapter,
        config.tables.len()
    );
    Ok(())
}
