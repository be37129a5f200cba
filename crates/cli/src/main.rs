use crate::{
    commands::{Commands, PlanArgs, parse_pairs},
    error::CliError,
};
use clap::Parser;
use composer::{
    entity::next_auto_increment,
    plan::ComposePlan,
    source::SourceCatalog,
    sync::sync_many_to_many,
};
use connectors::sql::{base::adapter::SqlAdapter, mysql::adapter::MySqlAdapter};
use model::{core::value::Value, records::row::RowData};
use planner::query::dialect;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

#[derive(Parser)]
#[command(
    name = "joinery",
    version = "0.1.0",
    about = "Compose multi-source SQL joins from a source catalog"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            plan,
            dialect: name,
        } => {
            let dialect = dialect::by_name(&name).ok_or(CliError::UnknownDialect(name))?;
            let (catalog, plan) = load_plan(&plan).await?;
            let composer = plan.compose(&catalog, dialect.as_ref())?;
            let (sql, params) = composer.to_sql(dialect.as_ref());
            output::print_json(&json!({ "sql": sql, "params": params }))?;
        }
        Commands::Columns { plan } => {
            let (catalog, plan) = load_plan(&plan).await?;
            let composer = plan.compose(&catalog, &dialect::MySql)?;
            if let Some(projection) = composer.projection() {
                output::print_json(&output::projection_to_json(projection))?;
            }
        }
        Commands::Fetch {
            plan,
            url,
            unzip,
            separator,
        } => {
            let unzip = parse_pairs(&unzip)?;
            let (catalog, plan) = load_plan(&plan).await?;
            let adapter = MySqlAdapter::connect(&url)?;

            let rows = fetch(&plan, &catalog, &adapter).await;
            adapter.disconnect().await?;
            let rows = rows?;

            info!("Fetched {} rows", rows.len());
            output::print_json(&output::rows_to_json(&rows, &unzip, &separator))?;
        }
        Commands::Sync {
            url,
            table,
            scope,
            remote_field,
            desired,
            previous,
        } => {
            let scope = parse_pairs(&scope)?;
            let common: Vec<(&str, Value)> = scope
                .iter()
                .map(|(column, value)| (column.as_str(), Value::String(value.clone())))
                .collect();

            let adapter = MySqlAdapter::connect(&url)?;
            let diff =
                sync_many_to_many(&adapter, &table, &common, &remote_field, desired, previous)
                    .await;
            adapter.disconnect().await?;

            output::print_json(&serde_json::to_value(diff?)?)?;
        }
        Commands::NextId {
            catalog,
            source,
            url,
        } => {
            let catalog = load_catalog(&catalog).await?;
            let source = catalog.get(&source)?;

            let adapter = MySqlAdapter::connect(&url)?;
            let next = next_auto_increment(&adapter, source).await;
            adapter.disconnect().await?;

            println!("{}", next?);
        }
    }

    Ok(())
}

async fn fetch(
    plan: &ComposePlan,
    catalog: &SourceCatalog,
    adapter: &MySqlAdapter,
) -> Result<Vec<RowData>, CliError> {
    let composer = plan.compose(catalog, adapter.dialect())?;
    Ok(composer.fetch(adapter).await?)
}

async fn load_catalog(path: &str) -> Result<SourceCatalog, CliError> {
    let json = tokio::fs::read_to_string(path).await?;
    Ok(SourceCatalog::from_json_str(&json)?)
}

async fn load_plan(args: &PlanArgs) -> Result<(SourceCatalog, ComposePlan), CliError> {
    let catalog = load_catalog(&args.catalog).await?;
    let json = tokio::fs::read_to_string(&args.plan).await?;
    let plan = ComposePlan::from_json_str(&json)?;
    Ok((catalog, plan))
}
