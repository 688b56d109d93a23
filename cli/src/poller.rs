use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api_types::{Validation, ValidationHandle, ValidationOutcome};
use crate::config::Config;
use crate::error::{Result, StretchError};
use crate::http_client::{path_segment, RemoteApi};

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Unset means wait until the remote side reaches a terminal state.
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            interval: Duration::from_secs(cfg.poll_interval_secs()),
            timeout: cfg.poll_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Last observed validation and how many status fetches it took.
#[derive(Debug, Clone)]
pub struct PollReport {
    pub validation: Validation,
    pub polls: u32,
}

pub fn validation_path(handle: &ValidationHandle) -> String {
    format!("/v1/validations/{}", path_segment(handle.as_str()))
}

/// Fetch the validation until it leaves the pending/in-progress states.
///
/// Completed with a succeeded result is the only success; every other terminal
/// state is [`StretchError::ValidationFailed`]. HTTP errors end the loop.
pub async fn poll_until_terminal(
    api: &dyn RemoteApi,
    handle: &ValidationHandle,
    policy: PollPolicy,
) -> Result<PollReport> {
    let path = validation_path(handle);
    let started = Instant::now();
    let mut polls = 0u32;
    loop {
        let raw = api.get(&path).await?;
        polls += 1;
        let validation: Validation =
            serde_json::from_value(raw).map_err(|e| StretchError::UnexpectedResponse {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        let status = validation
            .execution_status
            .as_ref()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "<none>".to_string());
        debug!(validation = %handle, poll = polls, status = %status, "validation status");

        match validation.outcome() {
            Some(ValidationOutcome::Succeeded) => {
                info!(validation = %handle, polls, "validation succeeded");
                return Ok(PollReport { validation, polls });
            }
            Some(ValidationOutcome::Failed) => {
                warn!(validation = %handle, status = %status, "validation failed");
                return Err(StretchError::ValidationFailed {
                    id: handle.to_string(),
                    execution_status: status,
                    result_status: validation
                        .result_status
                        .as_ref()
                        .map(|r| r.as_str().to_string()),
                });
            }
            None => {
                info!(validation = %handle, status = %status, "validation in progress");
            }
        }

        if let Some(timeout) = policy.timeout {
            if started.elapsed() + policy.interval > timeout {
                return Err(StretchError::PollTimeout {
                    id: handle.to_string(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }
        }
        tokio::time::sleep(policy.interval).await;
    }
}
