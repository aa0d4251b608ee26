//! API Gateway TOKEN authorizer: request/response contract and policy generation.
//!
//! Token validation is a stub. A missing token is denied and any other token
//! is allowed; bearer JWTs are only recognised by shape.

use serde::{Deserialize, Serialize};

pub const PRINCIPAL_ID: &str = "user";
pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Event sent by API Gateway to a TOKEN authorizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub authorization_token: Option<String>,
    #[serde(default)]
    pub method_arn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
}

/// What the stub validator made of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCheck {
    Missing,
    /// `Bearer <header>.<payload>.<signature>`.
    BearerJwt,
    Opaque,
}

impl TokenCheck {
    pub fn is_authorized(self) -> bool {
        !matches!(self, TokenCheck::Missing)
    }
}

pub fn validate_token(token: Option<&str>) -> TokenCheck {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return TokenCheck::Missing;
    };

    let is_jwt = token
        .strip_prefix("Bearer ")
        .map(|jwt| {
            let parts: Vec<&str> = jwt.trim().split('.').collect();
            parts.len() == 3 && parts.iter().all(|part| !part.is_empty())
        })
        .unwrap_or(false);

    if is_jwt {
        TokenCheck::BearerJwt
    } else {
        TokenCheck::Opaque
    }
}

/// Widen a method ARN to every method and path of `stage`.
///
/// `arn:aws:execute-api:us-east-1:123456789012:abc123/prod/GET/repos`
/// becomes `arn:aws:execute-api:us-east-1:123456789012:abc123/<stage>/*/*`.
pub fn stage_wildcard_resource(method_arn: &str, stage: &str) -> Option<String> {
    let parts: Vec<&str> = method_arn.split(':').collect();
    let [arn, partition, service, region, account, path] = parts.as_slice() else {
        return None;
    };
    if *arn != "arn" || service.is_empty() {
        return None;
    }

    let api_id = path.split('/').next().filter(|id| !id.is_empty())?;
    Some(format!(
        "{arn}:{partition}:{service}:{region}:{account}:{api_id}/{stage}/*/*"
    ))
}

pub fn generate_policy(effect: Effect, resource: impl Into<String>) -> AuthorizerResponse {
    AuthorizerResponse {
        principal_id: PRINCIPAL_ID.to_string(),
        policy_document: PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resource: resource.into(),
            }],
        },
    }
}

/// Decide on a request. A malformed ARN is denied on the raw ARN.
pub fn authorize(request: &AuthorizerRequest, stage: &str) -> AuthorizerResponse {
    let Some(resource) = stage_wildcard_resource(&request.method_arn, stage) else {
        tracing::warn!(method_arn = %request.method_arn, "malformed method ARN");
        return generate_policy(Effect::Deny, request.method_arn.as_str());
    };

    let check = validate_token(request.authorization_token.as_deref());
    tracing::info!(?check, "token checked");

    let effect = if check.is_authorized() {
        Effect::Allow
    } else {
        Effect::Deny
    };
    generate_policy(effect, resource)
}
