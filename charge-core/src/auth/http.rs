//! HTTP JSON client for the auth collaborator.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

use super::{
    AuthGateway, AuthSession, AuthUserRecord, CreateUserInput, ListUsersQuery, SessionInfo,
    SignInInput, SignUpInput, UpdateUserInput, UserPage,
};

/// Configuration for the auth collaborator client.
#[derive(Debug, Clone)]
pub struct HttpAuthGatewayConfig {
    /// Base URL of the auth service (e.g. `http://auth-service:3001`).
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpAuthGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Production [`AuthGateway`] implementation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAuthGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthGateway {
    pub fn new(config: HttpAuthGatewayConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Translate a collaborator failure by status code; anything unmapped is
    /// an upstream error, logged in full.
    async fn translate_error(response: reqwest::Response) -> AppError {
        let status = response.status();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("auth error").to_string());

        match status {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized(anyhow::anyhow!(message)),
            StatusCode::FORBIDDEN => AppError::Forbidden(anyhow::anyhow!(message)),
            StatusCode::NOT_FOUND => AppError::NotFound(anyhow::anyhow!(message)),
            StatusCode::CONFLICT => AppError::Conflict(anyhow::anyhow!(message)),
            StatusCode::BAD_REQUEST => AppError::validation(message),
            _ => AppError::Upstream(format!("auth service returned {status}: {message}")),
        }
    }

}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HasPermissionBody<'a> {
    user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    permissions: HashMap<&'a str, &'a [&'a str]>,
}

#[derive(serde::Deserialize)]
struct HasPermissionResponse {
    success: bool,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    user: AuthUserRecord,
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn sign_up(&self, input: SignUpInput) -> Result<SessionInfo, AppError> {
        let response = self
            .client
            .post(self.url("/auth/sign-up"))
            .json(&input)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::translate_error(response).await);
        }
        response.json().await.map_err(|e| {
            AppError::Upstream(format!("malformed auth service response: {e}"))
        })
    }

    async fn sign_in(&self, input: SignInInput) -> Result<SessionInfo, AppError> {
        let response = self
            .client
            .post(self.url("/auth/sign-in"))
            .json(&input)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::translate_error(response).await);
        }
        response.json().await.map_err(|e| {
            AppError::Upstream(format!("malformed auth service response: {e}"))
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.url("/auth/sign-out"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::translate_error(response).await);
        }
        Ok(())
    }

    async fn validate_session(&self, token: &str) -> Result<AuthSession, AppError> {
        let response = self
            .client
            .get(self.url("/auth/session"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::translate_error(response).await);
        }

        let session: SessionResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!("malformed auth service response: {e}"))
        })?;

        Ok(AuthSession {
            user_id: session.user.id,
            role: session.user.role,
            token: token.to_string(),
        })
    }

    async fn create_user(
        &self,
        token: &str,
        input: CreateUserInput,
    ) -> Result<AuthUserRecord, AppError> {
        let response = self
            .client
            .post(self.url("/auth/users"))
            .bearer_auth(token)
            .json(&input)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::translate_error(response).await);
        }
        response.json().await.map_err(|e| {
            AppError::Upstream(format!("malformed auth service response: {e}"))
        })
    }

    async fn update_user(
        &self,
        token: &str,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> Result<AuthUserRecord, AppError> {
        let response = self
            .client
            .patch(self.url(&format!("/auth/users/{user_id}")))
            .bearer_auth(token)
            .json(&input)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::translate_error(response).await);
        }
        response.json().await.map_err(|e| {
            AppError::Upstream(format!("malformed auth service response: {e}"))
        })
    }

    async fn delete_user(&self, token: &str, user_id: Uuid) -> Result<(), AppError> {
        let response = self
            .client
            .delete(self.url(&format!("/auth/users/{user_id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::translate_error(response).await);
        }
        Ok(())
    }

    async fn list_users(&self, token: &str, query: ListUsersQuery) -> Result<UserPage, AppError> {
        let response = self
            .client
            .get(self.url("/auth/users"))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::translate_error(response).await);
        }
        response.json().await.map_err(|e| {
            AppError::Upstream(format!("malformed auth service response: {e}"))
        })
    }

    async fn user_has_permission(
        &self,
        user_id: Uuid,
        role: Option<&str>,
        resource: &str,
        actions: &[&str],
    ) -> Result<bool, AppError> {
        let mut permissions = HashMap::new();
        permissions.insert(resource, actions);

        let body = HasPermissionBody {
            user_id,
            role,
            permissions,
        };

        let response = self
            .client
            .post(self.url("/auth/has-permission"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::translate_error(response).await);
        }

        let result: HasPermissionResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!("malformed auth service response: {e}"))
        })?;

        Ok(result.success)
    }
}
