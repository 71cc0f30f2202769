// src/services/intent_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;
use yup_oauth2::authenticator::Authenticator;
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};

use crate::config::IntentConfig;
use crate::errors::{AppError, Result};

const DIALOGFLOW_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

type HyperConnector =
    yup_oauth2::hyper_rustls::HttpsConnector<yup_oauth2::hyper::client::HttpConnector>;
type AuthType = Authenticator<HyperConnector>;

/// Text in, fulfillment text out.
#[async_trait]
pub trait IntentDetector: Send + Sync {
    async fn detect_intent(&self, text: &str) -> Result<String>;

    fn is_enabled(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

pub struct ServiceAccountTokens {
    authenticator: Arc<Mutex<AuthType>>,
}

impl ServiceAccountTokens {
    pub async fn from_key_file(path: &std::path::Path) -> Result<Self> {
        let service_account_key = read_service_account_key(path).await.map_err(|e| {
            AppError::configuration(format!(
                "Failed to read service account key {}: {}",
                path.display(),
                e
            ))
        })?;

        let authenticator = ServiceAccountAuthenticator::builder(service_account_key)
            .build()
            .await
            .map_err(|e| AppError::configuration(format!("Failed to build authenticator: {}", e)))?;

        Ok(Self {
            authenticator: Arc::new(Mutex::new(authenticator)),
        })
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String> {
        let auth = self.authenticator.lock().await;

        let token = auth
            .token(&[DIALOGFLOW_SCOPE])
            .await
            .map_err(|e| AppError::intent(format!("Failed to get token: {}", e)))?;

        token
            .token()
            .map(|t| t.to_string())
            .ok_or_else(|| AppError::intent("Access token was empty"))
    }
}

/// Fixed bearer token from `INTENT_ACCESS_TOKEN`, e.g. for a local emulator.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentRequest<'a> {
    pub query_input: QueryInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct QueryInput<'a> {
    pub text: TextInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInput<'a> {
    pub text: &'a str,
    pub language_code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentResponse {
    #[serde(default)]
    pub query_result: Option<QueryResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub fulfillment_text: String,
}

impl DetectIntentResponse {
    pub fn fulfillment_text(self) -> String {
        self.query_result
            .map(|result| result.fulfillment_text)
            .unwrap_or_default()
    }
}

pub struct DialogflowClient {
    project_id: String,
    api_base: String,
    language_code: String,
    tokens: Arc<dyn AccessTokenProvider>,
    client: Client,
}

impl DialogflowClient {
    pub fn new(
        config: &IntentConfig,
        project_id: impl Into<String>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            project_id: project_id.into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            language_code: config.language_code.clone(),
            tokens,
            client: builder.build()?,
        })
    }

    pub async fn from_config(config: &IntentConfig) -> Result<Self> {
        let project_id = config
            .project_id
            .as_deref()
            .ok_or_else(|| AppError::configuration("PROJECT_ID is not set"))?;

        if let Some(token) = &config.access_token {
            tracing::info!("Using static intent access token");
            return Self::new(config, project_id, Arc::new(StaticToken(token.clone())));
        }

        let key_path = config
            .service_key_path
            .as_deref()
            .ok_or_else(|| AppError::configuration("SERVICE_KEY is not set"))?;

        let tokens = ServiceAccountTokens::from_key_file(key_path).await?;
        Self::new(config, project_id, Arc::new(tokens))
    }

    pub fn session_path(&self, session_id: &str) -> String {
        format!("projects/{}/agent/sessions/{}", self.project_id, session_id)
    }

    fn detect_intent_url(&self, session_id: &str) -> String {
        format!(
            "{}/v2/{}:detectIntent",
            self.api_base,
            self.session_path(session_id)
        )
    }
}

#[async_trait]
impl IntentDetector for DialogflowClient {
    async fn detect_intent(&self, text: &str) -> Result<String> {
        // Each query gets its own session; no conversational context is kept.
        let session_id = Uuid::new_v4().to_string();
        let access_token = self.tokens.access_token().await?;

        let request = DetectIntentRequest {
            query_input: QueryInput {
                text: TextInput {
                    text,
                    language_code: &self.language_code,
                },
            },
        };

        let response = self
            .client
            .post(self.detect_intent_url(&session_id))
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(AppError::intent(format!(
                "detectIntent returned {}: {}",
                status, details
            )));
        }

        let body: DetectIntentResponse = response
            .json()
            .await
            .map_err(|e| AppError::intent(format!("Malformed detectIntent response: {}", e)))?;

        tracing::debug!(session = %session_id, "detectIntent answered");
        Ok(body.fulfillment_text())
    }
}

/// Stand-in used when the intent service is not configured. Every query fails.
pub struct DisabledIntentDetector;

#[async_trait]
impl IntentDetector for DisabledIntentDetector {
    async fn detect_intent(&self, _text: &str) -> Result<String> {
        Err(AppError::intent("intent service is not configured"))
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
