//! Table deployment operations (Imperative Shell).

use super::client::{self, sdk_error};
use super::config::{GsiConfig, KeyAttribute, TableConfig};
use super::error::{DynamodbError, Result};
use super::planning::{DeployPlan, DestroyPlan, GsiStatus, TableStatus};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, CreateGlobalSecondaryIndexAction, GlobalSecondaryIndex,
    GlobalSecondaryIndexUpdate, KeySchemaElement, KeyType, Projection, ProjectionType,
    ScalarAttributeType, TimeToLiveSpecification,
};
use aws_sdk_dynamodb::Client;
use std::time::Duration;

/// Wait before retrying an index creation that collided with another schema change.
pub const GSI_CONFLICT_BACKOFF: Duration = Duration::from_secs(30);

/// Retries allowed after the first colliding attempt.
pub const GSI_CONFLICT_RETRIES: u32 = 1;

/// Outcome of a single index creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GsiAttempt {
    Started,
    /// Another index build or table update is still running.
    InUse,
}

/// Execute a deploy plan.
pub async fn execute_deploy_plan(client: &Client, plan: &DeployPlan) -> Result<()> {
    match plan {
        DeployPlan::CreateTable { config } => {
            create_table(client, config).await?;
            wait_for_table_active(client, &config.table_name).await?;
            if let Some(attr) = &config.ttl_attribute {
                enable_ttl(client, &config.table_name, attr).await?;
            }
        }
        DeployPlan::UpdateTable {
            table_name,
            gsis_to_add,
            enable_ttl: ttl,
        } => {
            // DynamoDB builds one index at a time per table.
            for gsi in gsis_to_add {
                add_gsi_with_retry(client, table_name, gsi).await?;
                wait_for_table_active(client, table_name).await?;
            }
            if let Some(attr) = ttl {
                enable_ttl(client, table_name, attr).await?;
            }
        }
        DeployPlan::NoChanges { .. } => {}
    }
    Ok(())
}

/// Execute a destroy plan.
pub async fn execute_destroy_plan(client: &Client, plan: &DestroyPlan) -> Result<()> {
    if let DestroyPlan::DeleteTable { table_name } = plan {
        client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(sdk_error)?;
    }
    Ok(())
}

fn key_schema(
    partition_key: &KeyAttribute,
    sort_key: Option<&KeyAttribute>,
) -> Result<Vec<KeySchemaElement>> {
    let mut schema = vec![KeySchemaElement::builder()
        .attribute_name(&partition_key.name)
        .key_type(KeyType::Hash)
        .build()
        .map_err(sdk_error)?];

    if let Some(sk) = sort_key {
        schema.push(
            KeySchemaElement::builder()
                .attribute_name(&sk.name)
                .key_type(KeyType::Range)
                .build()
                .map_err(sdk_error)?,
        );
    }
    Ok(schema)
}

fn attribute_definitions<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<AttributeDefinition>> {
    names
        .into_iter()
        .map(|name| {
            AttributeDefinition::builder()
                .attribute_name(name)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(sdk_error)
        })
        .collect()
}

fn all_projection() -> Projection {
    Projection::builder()
        .projection_type(ProjectionType::All)
        .build()
}

async fn create_table(client: &Client, config: &TableConfig) -> Result<()> {
    let mut request = client
        .create_table()
        .table_name(&config.table_name)
        .set_key_schema(Some(key_schema(
            &config.partition_key,
            config.sort_key.as_ref(),
        )?))
        .set_attribute_definitions(Some(attribute_definitions(config.key_attributes())?))
        .billing_mode(BillingMode::PayPerRequest);

    for gsi in &config.gsis {
        request = request.global_secondary_indexes(
            GlobalSecondaryIndex::builder()
                .index_name(&gsi.name)
                .set_key_schema(Some(key_schema(&gsi.partition_key, gsi.sort_key.as_ref())?))
                .projection(all_projection())
                .build()
                .map_err(sdk_error)?,
        );
    }

    request.send().await.map_err(sdk_error)?;
    Ok(())
}

/// Requests an index and retries once after [`GSI_CONFLICT_BACKOFF`] if the
/// table is busy with another schema change.
async fn add_gsi_with_retry(client: &Client, table_name: &str, gsi: &GsiConfig) -> Result<()> {
    let mut retries_left = GSI_CONFLICT_RETRIES;
    loop {
        match add_gsi(client, table_name, gsi).await? {
            GsiAttempt::Started => return Ok(()),
            GsiAttempt::InUse if retries_left > 0 => {
                retries_left -= 1;
                anstream::eprintln!(
                    "Index {} collides with another schema change, retrying in {}s",
                    gsi.name,
                    GSI_CONFLICT_BACKOFF.as_secs()
                );
                tokio::time::sleep(GSI_CONFLICT_BACKOFF).await;
            }
            GsiAttempt::InUse => {
                return Err(DynamodbError::IndexCreationConflict {
                    table_name: table_name.to_string(),
                    index_name: gsi.name.clone(),
                })
            }
        }
    }
}

async fn add_gsi(client: &Client, table_name: &str, gsi: &GsiConfig) -> Result<GsiAttempt> {
    let schema = key_schema(&gsi.partition_key, gsi.sort_key.as_ref())?;
    let key_names = std::iter::once(gsi.partition_key.name.as_str())
        .chain(gsi.sort_key.as_ref().map(|sk| sk.name.as_str()));

    let result = client
        .update_table()
        .table_name(table_name)
        .set_attribute_definitions(Some(attribute_definitions(key_names)?))
        .global_secondary_index_updates(
            GlobalSecondaryIndexUpdate::builder()
                .create(
                    CreateGlobalSecondaryIndexAction::builder()
                        .index_name(&gsi.name)
                        .set_key_schema(Some(schema))
                        .projection(all_projection())
                        .build()
                        .map_err(sdk_error)?,
                )
                .build(),
        )
        .send()
        .await;

    match result {
        Ok(_) => Ok(GsiAttempt::Started),
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|e| e.is_resource_in_use_exception()) =>
        {
            Ok(GsiAttempt::InUse)
        }
        Err(err) => Err(sdk_error(err)),
    }
}

async fn enable_ttl(client: &Client, table_name: &str, attribute: &str) -> Result<()> {
    client
        .update_time_to_live()
        .table_name(table_name)
        .time_to_live_specification(
            TimeToLiveSpecification::builder()
                .enabled(true)
                .attribute_name(attribute)
                .build()
                .map_err(sdk_error)?,
        )
        .send()
        .await
        .map_err(sdk_error)?;
    Ok(())
}

async fn wait_for_table_active(client: &Client, table_name: &str) -> Result<()> {
    let max_attempts = 150;
    let delay = Duration::from_secs(2);

    for _ in 0..max_attempts {
        if let Some(state) = client::get_table_state(client, table_name).await? {
            if state.status == TableStatus::Active
                && state.gsis.iter().all(|g| g.status == GsiStatus::Active)
            {
                return Ok(());
            }
        }
        tokio::time::sleep(delay).await;
    }

    Err(DynamodbError::TableActivationTimeout)
}
