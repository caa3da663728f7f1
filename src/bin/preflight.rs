use anyhow::Context;
use clap::Parser;

use notify_service::infra::config::ServiceConfig;
use notify_service::infra::tenant::{TenantId, MODULE_NAME};
use notify_service::storage::{postgres, PostgresDocumentStore};
use notify_service::ResourceSpec;

/// Checks configuration and database connectivity before the service is started.
#[derive(Parser, Debug)]
#[command(about)]
struct CliArgs {
    /// Tenant whose schema is checked.
    #[arg(long)]
    tenant: Option<String>,

    /// Create the tenant's schema and table when missing.
    #[arg(long, requires = "tenant")]
    ensure_table: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = ServiceConfig::from_env()?;

    println!("> Preflight:");
    println!("  NOTIFY_BIND_ADDR={}", config.bind_addr);
    println!("  DB_MAX_CONNECTIONS={}", config.max_connections);
    println!("  NOTIFY_VALIDATE_QUERY_FIELDS={}", config.validate_query_fields);
    println!("  NOTIFY_DEFAULT_LANG={}", config.default_lang);

    let mut resource = ResourceSpec::notifications();
    if let Some(path) = &config.query_schema {
        println!("  NOTIFY_QUERY_SCHEMA={}", path.display());
        resource = resource.with_schema_file(path);
        if resource.schema.is_none() {
            eprintln!("  Warning: query schema could not be loaded; field validation will be off.");
        }
    }

    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set")?;
    let pool = postgres::connect(url, 1)
        .await
        .context("Failed to connect to the database")?;
    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(&pool)
        .await
        .context("Database did not answer")?;
    println!("  Database: {}", version);

    if let Some(raw) = cli.tenant.as_deref() {
        let tenant = TenantId::parse(raw)?;
        let store = PostgresDocumentStore::new(pool.clone(), tenant.schema_name(MODULE_NAME));
        if cli.ensure_table {
            store
                .ensure_table(&resource.table)
                .await
                .with_context(|| format!("Failed to create {}.{}", store.schema(), resource.table))?;
            println!("  Table {}.{} is ready.", store.schema(), resource.table);
        } else {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2)",
            )
            .bind(store.schema())
            .bind(&resource.table)
            .fetch_one(&pool)
            .await?;
            if !exists {
                return Err(anyhow::anyhow!(
                    "Table {}.{} does not exist. Re-run with --ensure-table",
                    store.schema(),
                    resource.table
                ));
            }
            println!("  Table {}.{} exists.", store.schema(), resource.table);
        }
    }

    println!("> Preflight OK.");
    Ok(())
}
