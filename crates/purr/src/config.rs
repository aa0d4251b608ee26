use std::{env, str::FromStr};

use purr_core::resource::DEFAULT_STAGES;
use purr_core::response::LOCAL_ORIGIN;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
    #[error("{set} is set but {unset} is not")]
    Incomplete {
        set: &'static str,
        unset: &'static str,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => Err(()),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Keyed records table (`FIZZ_TABLE_NAME`).
    pub records_table: Option<String>,
    /// TTL-bounded jobs table (`JOBS_TABLE_NAME`).
    pub jobs_table: Option<String>,
    /// Origins echoed back in `Access-Control-Allow-Origin`.
    pub allowed_origins: Vec<String>,
    /// Leading path segments treated as deployment stages.
    pub stages: Vec<String>,
    /// Stage the authorizer scopes its policies to.
    pub authorizer_stage: String,
    /// `LOG_FORMAT`; each binary picks its own default.
    pub log_format: Option<LogFormat>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FIZZ_TABLE_NAME` - records table (required by the DynamoDB store)
    /// - `JOBS_TABLE_NAME` - jobs table (required by the DynamoDB store)
    /// - `PURR_SUBDOMAIN`, `PURR_DOMAIN` - site origin `https://<sub>.<domain>`
    /// - `PURR_EXTRA_ORIGINS` - comma separated extra origins
    /// - `PURR_STAGES` - comma separated stage names (default: prod,dev,test)
    /// - `PURR_AUTHORIZER_STAGE` - authorizer policy stage (default: prod)
    /// - `LOG_FORMAT` - `json` or `pretty`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut allowed_origins = vec![LOCAL_ORIGIN.to_string()];
        match (var("PURR_SUBDOMAIN"), var("PURR_DOMAIN")) {
            (Some(sub), Some(domain)) => allowed_origins.push(format!("https://{sub}.{domain}")),
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    set: "PURR_SUBDOMAIN",
                    unset: "PURR_DOMAIN",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    set: "PURR_DOMAIN",
                    unset: "PURR_SUBDOMAIN",
                })
            }
            (None, None) => {}
        }
        if let Some(extra) = var("PURR_EXTRA_ORIGINS") {
            allowed_origins.extend(split_list(&extra));
        }

        let stages = match var("PURR_STAGES") {
            Some(stages) => split_list(&stages),
            None => DEFAULT_STAGES.iter().map(|s| s.to_string()).collect(),
        };

        let log_format = var("LOG_FORMAT")
            .map(|value| {
                value.parse().map_err(|_| ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value,
                })
            })
            .transpose()?;

        Ok(Self {
            records_table: var("FIZZ_TABLE_NAME"),
            jobs_table: var("JOBS_TABLE_NAME"),
            allowed_origins,
            stages,
            authorizer_stage: var("PURR_AUTHORIZER_STAGE").unwrap_or_else(|| "prod".to_string()),
            log_format,
        })
    }

    /// Both table names, failing fast when either is missing.
    pub fn tables(&self) -> Result<(&str, &str), ConfigError> {
        let records = self
            .records_table
            .as_deref()
            .ok_or(ConfigError::Missing("FIZZ_TABLE_NAME"))?;
        let jobs = self
            .jobs_table
            .as_deref()
            .ok_or(ConfigError::Missing("JOBS_TABLE_NAME"))?;
        Ok((records, jobs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            records_table: None,
            jobs_table: None,
            allowed_origins: vec![LOCAL_ORIGIN.to_string()],
            stages: DEFAULT_STAGES.iter().map(|s| s.to_string()).collect(),
            authorizer_stage: "prod".to_string(),
            log_format: None,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
