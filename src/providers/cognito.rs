// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AWS Cognito user pool client.
//!
//! Talks to the public Cognito JSON API (`GetUser`, `InitiateAuth`) which
//! needs no AWS request signing, plus the pool's well-known JWKS document.

use std::time::Duration;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use jsonwebtoken::jwk::JwkSet;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use sha2::Sha256;
use tracing::{debug, info};
use url::Url;

use super::{IdentityProvider, ProviderError, UserAttributes};
use crate::config::CognitoConfig;

type HmacSha256 = Hmac<Sha256>;

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const PASSWORD_AUTH_FLOW: &str = "USER_PASSWORD_AUTH";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType {
    name: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    #[serde(default)]
    user_attributes: Vec<AttributeType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
    #[serde(default)]
    challenge_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default, rename = "__type")]
    kind: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

#[derive(Clone)]
pub struct CognitoClient {
    endpoint: Url,
    jwks_url: String,
    client_id: String,
    client_secret: String,
    http: Client,
}

impl CognitoClient {
    pub fn new(config: &CognitoConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            jwks_url: config.jwks_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            http,
        })
    }

    /// POST a Cognito API action and decode the successful reply.
    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("{action} request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(service_error(action, response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("{action}: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn fetch_jwks(&self) -> Result<JwkSet, ProviderError> {
        debug!(url = %self.jwks_url, "Fetching JWKS");
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("JWKS: {e}")))
    }

    async fn get_user(&self, access_token: &str) -> Result<UserAttributes, ProviderError> {
        let reply: GetUserResponse = self
            .call("GetUser", json!({ "AccessToken": access_token }))
            .await?;

        Ok(into_attributes(reply))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<String, ProviderError> {
        let hash = secret_hash(&self.client_secret, email, &self.client_id)?;

        let reply: InitiateAuthResponse = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": PASSWORD_AUTH_FLOW,
                    "ClientId": self.client_id,
                    "AuthParameters": {
                        "USERNAME": email,
                        "PASSWORD": password,
                        "SECRET_HASH": hash,
                    }
                }),
            )
            .await?;

        if let Some(challenge) = reply.challenge_name {
            info!(challenge = %challenge, "Password grant answered with a challenge");
            return Err(ProviderError::Rejected(format!(
                "authentication requires challenge {challenge}"
            )));
        }

        reply
            .authentication_result
            .and_then(|result| result.access_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ProviderError::Rejected("access token missing from authentication result".to_string())
            })
    }
}

/// Attributes with a value; valueless entries are dropped.
fn into_attributes(reply: GetUserResponse) -> UserAttributes {
    reply
        .user_attributes
        .into_iter()
        .filter_map(|attr| attr.value.map(|value| (attr.name, value)))
        .collect()
}

/// Cognito `SECRET_HASH`: base64(HMAC-SHA256(client_secret, username + client_id)).
pub fn secret_hash(
    client_secret: &str,
    username: &str,
    client_id: &str,
) -> Result<String, ProviderError> {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .map_err(|e| ProviderError::InvalidResponse(format!("invalid HMAC key: {e}")))?;
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Ok(Base64::encode_string(&mac.finalize().into_bytes()))
}

/// Classify a non-success Cognito reply.
async fn service_error(action: &str, response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed: ServiceErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.kind)
        .unwrap_or_else(|| format!("HTTP {status}"));

    if status.is_client_error() {
        ProviderError::Rejected(message)
    } else {
        ProviderError::Unavailable(format!("{action} returned {status}: {message}"))
    }
}
