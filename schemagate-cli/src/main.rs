//! Schema catalog export and gated query tool.
//!
//! This binary exports a MariaDB/MySQL schema catalog as grounding context
//! for a SQL generator, and exposes the gateway's table listing and gated
//! query operations for operators.
//!
//! # Security Guarantees
//! - Read-only database sessions only
//! - Generated SQL is gated before it reaches the database
//! - Connection strings are redacted in every log line
//! - Catalog output is validated and checked for leaked credentials

mod output;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use schemagate_core::adapters::config::allow_list;
use schemagate_core::error::redact_database_url;
use schemagate_core::logging::init_logging;
use schemagate_core::{
    CatalogOptions, Gateway, GatewayConfig, MySqlInspector, PoolConfig, build_catalog,
    initialize_catalog_validator,
};
use std::path::PathBuf;
use tracing::{error, info};

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "schemagate")]
#[command(about = "Schema catalog export and SQL safety gateway for MariaDB/MySQL")]
#[command(version)]
#[command(long_about = "
schemagate - Read-only schema catalog export and gated SQL execution

Without a subcommand the catalog is exported. The catalog describes tables,
columns, primary and foreign keys, indexes, comments and optional sample rows,
as JSON and optionally as a Markdown summary.

SECURITY FEATURES:
- Read-only sessions only
- Generated SQL must be a single SELECT over allow-listed tables
- Row cap appended to every query without LIMIT
- PII masking for sampled rows (--mask-pii)

EXAMPLES:
  schemagate --database-url mysql://reader@localhost/hr --out-json hr.json
  schemagate --sample-rows 3 --mask-pii --out-md hr.md
  schemagate tables --allowed-tables candidates,interviews
  schemagate query 'SELECT * FROM candidates'
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub export: ExportArgs,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export the schema catalog (default)
    Export(ExportArgs),
    /// List the tables queries may use
    Tables,
    /// Run a generated SELECT through the gatekeeper
    Query(QueryArgs),
    /// Test database connection
    Test,
}

#[derive(Args, Clone)]
pub struct ExportArgs {
    /// JSON output path
    #[arg(long, help = "JSON output path (default: stdout)")]
    pub out_json: Option<PathBuf>,

    /// Markdown output path
    #[arg(long, help = "Markdown summary output path (optional)")]
    pub out_md: Option<PathBuf>,

    /// Include views
    #[arg(long, help = "Include views alongside physical tables")]
    pub include_views: bool,

    /// Number of sample rows per table
    #[arg(long, default_value = "0", help = "Sample N rows per table (0 disables sampling)")]
    pub sample_rows: u32,

    /// Mask PII in samples
    #[arg(long, help = "Mask emails, CPF numbers and phone numbers in sample rows")]
    pub mask_pii: bool,

    /// Maximum sample text length
    #[arg(
        long,
        default_value = "160",
        help = "Maximum length of masked sample text (0 disables truncation)"
    )]
    pub max_text_len: usize,
}

#[derive(Args)]
pub struct QueryArgs {
    /// SQL text, possibly wrapped in a Markdown code fence
    #[arg(help = "SELECT statement to run")]
    pub sql: String,

    /// Question the SQL answers
    #[arg(long, help = "Natural-language question; prints only the rows")]
    pub question: Option<String>,

    /// Row cap for statements without LIMIT
    #[arg(long, default_value = "200", help = "LIMIT appended when the statement has none")]
    pub limit: u32,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Database connection URL
    #[arg(
        long,
        visible_alias = "url",
        env = "DATABASE_URL",
        global = true,
        help = "Database connection string (credentials will be sanitized in logs)"
    )]
    pub database_url: Option<String>,

    /// Schema override
    #[arg(long, global = true, help = "Schema to inspect (default: the connection's database)")]
    pub schema: Option<String>,

    /// Allow-listed tables
    #[arg(
        long,
        env = "ALLOWED_TABLES",
        value_delimiter = ',',
        global = true,
        help = "Comma-separated list of tables queries may reference"
    )]
    pub allowed_tables: Vec<String>,

    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

impl GlobalArgs {
    fn gateway_config(&self) -> GatewayConfig {
        let mut config = GatewayConfig::new().with_allowed_tables(&self.allowed_tables);
        if let Some(schema) = &self.schema {
            config = config.with_schema(schema.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    initialize_catalog_validator().context("Failed to initialize catalog validator")?;

    let Some(database_url) = cli.global.database_url.as_deref() else {
        bail!("Database URL is required: pass --database-url or set DATABASE_URL");
    };

    info!("Target: {}", redact_database_url(database_url));
    let inspector = MySqlInspector::connect(database_url, &PoolConfig::default())?;

    let result = match &cli.command {
        Some(Command::Export(args)) => export_catalog(&inspector, &cli.global, args).await,
        None => export_catalog(&inspector, &cli.global, &cli.export).await,
        Some(Command::Tables) => list_tables(&inspector, &cli.global).await,
        Some(Command::Query(args)) => run_query(&inspector, &cli.global, args).await,
        Some(Command::Test) => test_connection(&inspector).await,
    };

    inspector.close().await;
    result
}

/// Builds the catalog and writes it out.
async fn export_catalog(
    inspector: &MySqlInspector,
    global: &GlobalArgs,
    args: &ExportArgs,
) -> anyhow::Result<()> {
    info!("Starting catalog export...");

    let options = CatalogOptions::new()
        .with_views(args.include_views)
        .with_sample_rows(args.sample_rows)
        .with_masking(args.mask_pii)
        .with_max_text_len(args.max_text_len)
        .with_allow_list(allow_list(&global.allowed_tables));

    let catalog = build_catalog(inspector, global.schema.as_deref(), &options)
        .await
        .map_err(|e| {
            error!("Catalog export failed: {}", e);
            e
        })
        .context("Catalog export failed")?;

    output::write_catalog(&catalog, args.out_json.as_deref(), args.out_md.as_deref()).await?;

    info!(
        "✓ Catalog exported: {} tables, {} columns, {} failed",
        catalog.tables.len(),
        catalog.column_count(),
        catalog.failed_count()
    );
    Ok(())
}

/// Prints the allow-listed tables, one per line.
async fn list_tables(inspector: &MySqlInspector, global: &GlobalArgs) -> anyhow::Result<()> {
    let gateway = Gateway::from_pool(inspector.pool().clone(), global.gateway_config())?;
    for table in gateway.list_tables().await? {
        println!("{}", table);
    }
    Ok(())
}

/// Runs one statement through the gatekeeper and prints the result as JSON.
async fn run_query(
    inspector: &MySqlInspector,
    global: &GlobalArgs,
    args: &QueryArgs,
) -> anyhow::Result<()> {
    let config = global.gateway_config().with_default_limit(args.limit);
    let gateway = Gateway::from_pool(inspector.pool().clone(), config)?;

    match &args.question {
        Some(question) => {
            let rows = gateway.natural_language_to_rows(question, &args.sql).await?;
            println!("{}", rows);
        }
        None => {
            let result = gateway.run_query(&args.sql).await?;
            let json = serde_json::to_string_pretty(&result).context("Failed to serialize query result")?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Tests database connection without exporting anything
async fn test_connection(inspector: &MySqlInspector) -> anyhow::Result<()> {
    info!("Testing database connection...");

    inspector.test_connection().await.map_err(|e| {
        error!("Connection test failed: {}", e);
        e
    })?;

    info!("✓ Connection test successful");
    println!("Connection to database successful");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_is_default() {
        let cli = Cli::try_parse_from([
            "schemagate",
            "--database-url",
            "mysql://reader@localhost/hr",
            "--sample-rows",
            "3",
            "--mask-pii",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.export.sample_rows, 3);
        assert!(cli.export.mask_pii);
        assert_eq!(cli.export.max_text_len, 160);
        assert!(!cli.export.include_views);
    }

    #[test]
    fn test_query_subcommand() {
        let cli = Cli::try_parse_from([
            "schemagate",
            "query",
            "SELECT * FROM candidates",
            "--allowed-tables",
            "candidates,interviews",
            "--question",
            "who applied?",
        ])
        .unwrap();

        assert!(matches!(
            &cli.command,
            Some(Command::Query(args)) if args.sql == "SELECT * FROM candidates"
                && args.question.as_deref() == Some("who applied?")
                && args.limit == 200
        ));
        assert_eq!(cli.global.allowed_tables, vec!["candidates", "interviews"]);

        let config = cli.global.gateway_config();
        assert_eq!(config.allowed_tables.map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_blank_allow_list_is_unrestricted() {
        let cli = Cli::try_parse_from(["schemagate", "tables", "--allowed-tables", " , "]).unwrap();
        assert!(cli.global.gateway_config().allowed_tables.is_none());
    }
}
