//! Pure functions for calculating deployment plans (Functional Core).

use super::config::{GsiConfig, TableConfig};

/// Represents the current state of a table.
#[derive(Debug, Clone)]
pub struct TableState {
    pub status: TableStatus,
    pub gsis: Vec<GsiState>,
    /// Attribute TTL is enabled on, if any.
    pub ttl_attribute: Option<String>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// GSI state.
#[derive(Debug, Clone)]
pub struct GsiState {
    pub name: String,
    pub status: GsiStatus,
}

/// GSI status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsiStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Planned changes for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created (TTL is enabled afterwards).
    CreateTable { config: TableConfig },
    /// Table exists but is missing indexes or its TTL setting.
    UpdateTable {
        table_name: String,
        gsis_to_add: Vec<GsiConfig>,
        enable_ttl: Option<String>,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

impl DeployPlan {
    pub fn is_noop(&self) -> bool {
        matches!(self, DeployPlan::NoChanges { .. })
    }
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

/// Calculate what changes are needed to reach the desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            config: desired.clone(),
        };
    };

    let gsis_to_add: Vec<GsiConfig> = desired
        .gsis
        .iter()
        .filter(|gsi| !state.gsis.iter().any(|g| g.name == gsi.name))
        .cloned()
        .collect();

    let enable_ttl = match &desired.ttl_attribute {
        Some(attr) if state.ttl_attribute.as_ref() != Some(attr) => Some(attr.clone()),
        _ => None,
    };

    if gsis_to_add.is_empty() && enable_ttl.is_none() {
        DeployPlan::NoChanges {
            table_name: desired.table_name.clone(),
        }
    } else {
        DeployPlan::UpdateTable {
            table_name: desired.table_name.clone(),
            gsis_to_add,
            enable_ttl,
        }
    }
}

/// Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

fn format_gsi(lines: &mut Vec<String>, gsi: &GsiConfig, indent: &str) {
    lines.push(format!("{indent}Partition key: {} (S)", gsi.partition_key.name));
    if let Some(sk) = &gsi.sort_key {
        lines.push(format!("{indent}Sort key: {} (S)", sk.name));
    }
}

/// Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => {
            let mut lines = vec![
                format!("+ Create table: {}", config.table_name),
                format!("  Partition key: {} (S)", config.partition_key.name),
            ];
            if let Some(sk) = &config.sort_key {
                lines.push(format!("  Sort key: {} (S)", sk.name));
            }
            for gsi in &config.gsis {
                lines.push(format!("  + GSI: {}", gsi.name));
                format_gsi(&mut lines, gsi, "    ");
            }
            if let Some(ttl) = &config.ttl_attribute {
                lines.push(format!("  + TTL on: {ttl}"));
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::UpdateTable {
            table_name,
            gsis_to_add,
            enable_ttl,
        } => {
            let mut lines = vec![format!("~ Update table: {table_name}")];
            for gsi in gsis_to_add {
                lines.push(format!("  + Add GSI: {}", gsi.name));
                format_gsi(&mut lines, gsi, "    ");
            }
            if let Some(ttl) = enable_ttl {
                lines.push(format!("  + Enable TTL on: {ttl}"));
            }
            lines
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{table_name}' is up to date")]
        }
    }
}

/// Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!("- Delete table: {table_name} (ALL DATA WILL BE LOST)")]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{table_name}' does not exist")]
        }
    }
}
