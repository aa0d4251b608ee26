//! Resource routing: (verb, path) to (kind, verb).

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::storage::keys::{RASTER_PARTITION, REPO_PARTITION, VECTOR_PARTITION};

/// Deployment stages stripped from the front of a path by default.
pub const DEFAULT_STAGES: [&str; 3] = ["prod", "dev", "test"];

/// The closed set of resources the API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Repo,
    Raster,
    Vector,
    Search,
    Job,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Repo,
        ResourceKind::Raster,
        ResourceKind::Vector,
        ResourceKind::Search,
        ResourceKind::Job,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Repo => "repo",
            ResourceKind::Raster => "raster",
            ResourceKind::Vector => "vector",
            ResourceKind::Search => "search",
            ResourceKind::Job => "job",
        }
    }

    /// Partition value of records of this kind, if it is stored in the records table.
    pub fn partition(self) -> Option<&'static str> {
        match self {
            ResourceKind::Repo => Some(REPO_PARTITION),
            ResourceKind::Raster => Some(RASTER_PARTITION),
            ResourceKind::Vector => Some(VECTOR_PARTITION),
            ResourceKind::Search | ResourceKind::Job => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ApiError::InvalidResource(s.to_string()))
    }
}

/// Verbs the API answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl FromStr for Method {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(ApiError::MethodNotAllowed),
        }
    }
}

/// A routed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub kind: ResourceKind,
    pub method: Method,
    /// Second segment of `/jobs/<id>` paths.
    pub id: Option<String>,
}

/// Maps paths to resource kinds, knowing which leading segments are stages.
#[derive(Debug, Clone)]
pub struct Router {
    stages: Vec<String>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(DEFAULT_STAGES)
    }
}

impl Router {
    pub fn new<I, S>(stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stages: stages.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve a request.
    ///
    /// The kind is checked before the verb, so an unknown resource is a 400
    /// whatever the verb.
    pub fn route(&self, method: &str, path: &str) -> Result<Route, ApiError> {
        let (kind, id) = self.resolve_kind(path)?;
        let method = method.parse()?;
        Ok(Route { kind, method, id })
    }

    fn resolve_kind(&self, path: &str) -> Result<(ResourceKind, Option<String>), ApiError> {
        let mut parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if parts
            .first()
            .is_some_and(|first| self.stages.iter().any(|stage| stage == first))
        {
            parts.remove(0);
        }

        if let ["jobs", id, ..] = parts.as_slice() {
            if !id.is_empty() {
                return Ok((ResourceKind::Job, Some((*id).to_string())));
            }
        }

        let segment = parts
            .iter()
            .rev()
            .find(|part| !part.is_empty())
            .copied()
            .unwrap_or_default();

        let kind = segment.trim_end_matches('s').parse()?;
        Ok((kind, None))
    }
}
