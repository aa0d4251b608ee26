//! DynamoDB infrastructure management commands.

mod client;
mod config;
mod deploy;
mod error;
mod planning;
mod seed;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use dialoguer::Confirm;
use purr::storage::DynamoDbRepository;

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy the records and jobs tables.
    Deploy(DeployCommand),

    /// Seed the records table with demo rasters.
    Seed(SeedCommand),
}

/// Names of the two tables the API reads.
#[derive(Debug, Clone, clap::Args)]
pub struct TableNames {
    /// Records table (repos, rasters, vectors).
    #[arg(long, default_value = "fizz", env = "FIZZ_TABLE_NAME")]
    pub records_table: String,

    /// Jobs table.
    #[arg(long, default_value = "purr-jobs", env = "JOBS_TABLE_NAME")]
    pub jobs_table: String,
}

/// Deploy or update DynamoDB infrastructure.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy the purr DynamoDB tables.

By default, this command creates or updates the records table (pk/sk with the
pk-uwi-index and pk-calib_log_description_lc-index GSIs) and the jobs table
(keyed by id, expiring on ttl).

Missing indexes are added one at a time. If DynamoDB rejects an index because
another schema change is still running, the command waits and retries once.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use DynamoDB Local (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the tables instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    #[command(flatten)]
    pub tables: TableNames,
}

/// Seed the records table with demo rasters.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Insert demo raster records into the records table.

Rasters are grouped into wells sharing the --area uwi prefix, one raster per
log type, so the search endpoint has something to page through.")]
pub struct SeedCommand {
    /// Uwi prefix shared by the generated wells.
    #[arg(long, default_value = "15-009")]
    pub area: String,

    /// Number of rasters to generate.
    #[arg(long, default_value = "60")]
    pub count: u32,

    #[command(flatten)]
    pub tables: TableNames,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
        DynamodbAction::Seed(seed_cmd) => run_seed(seed_cmd, &global).await,
    }
}

fn confirm(prompt: &str, default: bool) -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;
    let desired = [
        config::records_table_config().with_table_name(&cmd.tables.records_table),
        config::jobs_table_config().with_table_name(&cmd.tables.jobs_table),
    ];

    if cmd.destroy {
        let mut plans = Vec::with_capacity(desired.len());
        for table in &desired {
            let current = client::get_table_state(&dynamo_client, &table.table_name).await?;
            plans.push(planning::calculate_destroy_plan(
                current.as_ref(),
                &table.table_name,
            ));
        }

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for line in plans.iter().flat_map(planning::format_destroy_plan) {
                aprintln!("  {}", p_r(&line));
            }
            aprintln!();
        }

        if plans
            .iter()
            .all(|plan| matches!(plan, planning::DestroyPlan::AlreadyGone { .. }))
        {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        if !cmd.force {
            confirm(
                "Are you sure you want to delete these tables? ALL DATA WILL BE LOST",
                false,
            )?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Deleting tables..."));
        }

        for plan in &plans {
            deploy::execute_destroy_plan(&dynamo_client, plan).await?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_g("Tables destroyed successfully."));
        }
    } else {
        let mut plans = Vec::with_capacity(desired.len());
        for table in &desired {
            let current = client::get_table_state(&dynamo_client, &table.table_name).await?;
            plans.push(planning::calculate_deploy_plan(current.as_ref(), table));
        }

        if !global.is_silent() {
            aprintln!("{}", p_c("Deploy Plan:"));
            for line in plans.iter().flat_map(planning::format_deploy_plan) {
                if line.starts_with('+') {
                    aprintln!("  {}", p_g(&line));
                } else if line.starts_with('-') {
                    aprintln!("  {}", p_r(&line));
                } else if line.starts_with('~') {
                    aprintln!("  {}", p_y(&line));
                } else {
                    aprintln!("  {}", line);
                }
            }
            aprintln!();
        }

        if plans.iter().all(planning::DeployPlan::is_noop) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Infrastructure is up to date."));
            }
            return Ok(());
        }

        if !cmd.force {
            confirm("Apply these changes?", true)?;
        }

        for plan in plans.iter().filter(|plan| !plan.is_noop()) {
            if global.is_verbose() {
                aprintln!("{}", p_m(&format!("Applying: {plan:?}")));
            } else if !global.is_silent() {
                aprintln!("{}", p_b("Applying changes..."));
            }
            deploy::execute_deploy_plan(&dynamo_client, plan).await?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_g("Infrastructure deployed successfully."));
        }
    }

    Ok(())
}

async fn run_seed(cmd: SeedCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!("{} {}", p_b("Table:"), cmd.tables.records_table);
        aprintln!("{} {}", p_b("Area:"), cmd.area);
        aprintln!("{} {}", p_b("Raster count:"), cmd.count);
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;

    let table_state = client::get_table_state(&dynamo_client, &cmd.tables.records_table).await?;
    if table_state.is_none() {
        return Err(DynamodbError::TableNotFound {
            table_name: cmd.tables.records_table,
        });
    }

    let prepared = seed::prepare_seed(
        seed::generate_seed_rasters(&cmd.area, cmd.count),
        chrono::Utc::now(),
    )?;

    if !global.is_silent() {
        aprintln!("{}", p_c("Rasters to create:"));
        for raster in prepared.echo.iter().take(5) {
            aprintln!(
                "  {} - {}",
                raster["uwi"].as_str().unwrap_or_default(),
                raster["sk"].as_str().unwrap_or_default()
            );
        }
        if prepared.count() > 5 {
            aprintln!("  ... and {} more", prepared.count() - 5);
        }
        aprintln!();
    }

    if !cmd.force {
        confirm(&format!("Insert {} rasters?", prepared.count()), true)?;
    }

    let repository = DynamoDbRepository::new(
        dynamo_client,
        cmd.tables.records_table,
        cmd.tables.jobs_table,
    );
    let inserted = seed::seed_rasters(&repository, &prepared).await?;

    if !global.is_silent() {
        aprintln!("{} {} rasters inserted.", p_g("Success:"), inserted);
    }

    Ok(())
}
