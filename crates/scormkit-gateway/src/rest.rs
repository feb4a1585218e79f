//! REST record-store gateway.
//!
//! Talks to the hosted record store over JSON: appends activity log rows,
//! reads enrollment records, and patches back the derived best score. The
//! store derives the enrollment's `scorm_score` server-side as the maximum
//! over SCORM-originated log rows; this client only reads it.
//!
//! Transient failures (429, 5xx, network, timeout) are retried with
//! exponential backoff up to a bounded budget; permanent failures are
//! returned immediately.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use scormkit_core::error::GatewayError;
use scormkit_core::model::{
    CompletionWeights, Enrollment, EnrollmentId, EnrollmentStatus, LogId, NewActivityLog,
};
use scormkit_core::traits::PersistenceGateway;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// REST client for the hosted record store.
pub struct RestGateway {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl RestGateway {
    pub fn new(base_url: &str, api_token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }

    /// Override the retry budget and initial backoff delay.
    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = Duration::from_millis(retry_delay_ms);
        self
    }

    async fn with_retry<T, F, Fut>(&self, mut op: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut delay = self.retry_delay;
        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_RETRY_DELAY);
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() => {
                    if let Some(ms) = error.retry_after_ms() {
                        delay = Duration::from_millis(ms);
                    }
                    debug!(attempt, %error, "transient gateway error, will retry");
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }
        Err(last_error
            .unwrap_or_else(|| GatewayError::NetworkError("retry budget exhausted".to_string())))
    }

    fn request_error(error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            GatewayError::Timeout(DEFAULT_TIMEOUT_SECS)
        } else {
            GatewayError::NetworkError(error.to_string())
        }
    }

    async fn error_from_response(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs * 1000)
            .unwrap_or(1000);
        let message = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => GatewayError::AuthenticationFailed(message),
            404 => GatewayError::NotFound(message),
            429 => GatewayError::RateLimited { retry_after_ms },
            code => GatewayError::ApiError {
                status: code,
                message,
            },
        }
    }

    async fn append_once(&self, entry: &NewActivityLog) -> Result<LogId, GatewayError> {
        let body = ActivityLogRequest {
            enrollment_id: entry.enrollment_id,
            course_id: entry.course_id,
            interaction_type: entry.interaction_type.clone(),
            score: entry.score,
            raw_data: entry.raw_data.clone(),
            recorded_at: entry.recorded_at,
        };
        let response = self
            .client
            .post(format!("{}/api/v1/activity-log", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(Self::request_error)?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        let created: CreatedRecord = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidRecord(e.to_string()))?;
        Ok(created.id)
    }

    async fn read_once(&self, id: EnrollmentId) -> Result<Enrollment, GatewayError> {
        let response = self
            .client
            .get(format!("{}/api/v1/enrollments/{id}", self.base_url))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(Self::request_error)?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        let record: EnrollmentRecord = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidRecord(e.to_string()))?;
        record.try_into()
    }

    async fn update_once(
        &self,
        id: EnrollmentId,
        best_score: u32,
        new_status: Option<EnrollmentStatus>,
    ) -> Result<(), GatewayError> {
        let body = BestScoreUpdate {
            best_score,
            status: new_status.map(|s| s.to_string()),
        };
        let response = self
            .client
            .patch(format!("{}/api/v1/enrollments/{id}", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(Self::request_error)?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ActivityLogRequest {
    enrollment_id: EnrollmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    course_id: Option<Uuid>,
    interaction_type: String,
    score: f64,
    raw_data: HashMap<String, String>,
    recorded_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct CreatedRecord {
    id: LogId,
}

#[derive(Deserialize)]
struct EnrollmentRecord {
    id: EnrollmentId,
    student_id: Uuid,
    #[serde(default)]
    course_id: Option<Uuid>,
    status: String,
    #[serde(default)]
    quiz_score: Option<f64>,
    #[serde(default)]
    scorm_score: Option<f64>,
    #[serde(default)]
    best_score: u32,
    #[serde(default)]
    quiz_percentage: Option<u32>,
    #[serde(default)]
    scorm_percentage: Option<u32>,
}

impl TryFrom<EnrollmentRecord> for Enrollment {
    type Error = GatewayError;

    fn try_from(record: EnrollmentRecord) -> Result<Self, Self::Error> {
        let status = record
            .status
            .parse::<EnrollmentStatus>()
            .map_err(GatewayError::InvalidRecord)?;
        let weights = match (record.quiz_percentage, record.scorm_percentage) {
            (Some(quiz), Some(scorm)) => {
                Some(CompletionWeights::new(quiz, scorm).map_err(GatewayError::InvalidRecord)?)
            }
            _ => None,
        };
        Ok(Enrollment {
            id: record.id,
            student_id: record.student_id,
            course_id: record.course_id,
            status,
            quiz_score: record.quiz_score,
            scorm_score: record.scorm_score,
            best_score: record.best_score,
            weights,
        })
    }
}

#[derive(Serialize)]
struct BestScoreUpdate {
    best_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

#[async_trait]
impl PersistenceGateway for RestGateway {
    fn name(&self) -> &str {
        "rest"
    }

    #[instrument(skip(self, entry), fields(enrollment_id = %entry.enrollment_id))]
    async fn append_activity_log(&self, entry: &NewActivityLog) -> Result<LogId, GatewayError> {
        self.with_retry(|| self.append_once(entry)).await
    }

    #[instrument(skip(self))]
    async fn read_enrollment(&self, id: EnrollmentId) -> Result<Enrollment, GatewayError> {
        self.with_retry(|| self.read_once(id)).await
    }

    #[instrument(skip(self))]
    async fn update_best_score(
        &self,
        id: EnrollmentId,
        best_score: u32,
        new_status: Option<EnrollmentStatus>,
    ) -> Result<(), GatewayError> {
        self.with_retry(|| self.update_once(id, best_score, new_status))
            .await
    }
}
