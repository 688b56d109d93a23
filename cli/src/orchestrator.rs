use serde_json::{json, Value};
use tracing::info;

use crate::api_types::{ClusterId, ValidationHandle};
use crate::error::{Result, StretchError};
use crate::http_client::{path_segment, RemoteApi};
use crate::poller::{poll_until_terminal, PollPolicy};
use crate::request_builder::{ClusterExpansionSpec, ClusterStretchSpec};

/// A fully built request for one workflow run.
#[derive(Debug, Clone)]
pub enum WorkflowRequest {
    PrepareStretch,
    StretchCreate(ClusterStretchSpec),
    StretchExpand(ClusterExpansionSpec),
}

impl WorkflowRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PrepareStretch => "prepare stretch",
            Self::StretchCreate(_) => "vSAN stretch cluster",
            Self::StretchExpand(_) => "expand stretch cluster",
        }
    }

    /// Body sent to both the validations resource and the cluster resource.
    pub fn payload(&self) -> Result<Value> {
        Ok(match self {
            Self::PrepareStretch => json!({ "prepareForStretch": true }),
            Self::StretchCreate(spec) => json!({ "clusterStretchSpec": serde_json::to_value(spec)? }),
            Self::StretchExpand(spec) => {
                json!({ "clusterExpansionSpec": serde_json::to_value(spec)? })
            }
        })
    }

    fn needs_validation(&self) -> bool {
        !matches!(self, Self::PrepareStretch)
    }
}

/// Response of the execution call, returned as-is. Task completion is tracked
/// by the remote side.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingAck(pub Value);

pub fn cluster_path(cluster: &ClusterId) -> String {
    format!("/v1/clusters/{}", path_segment(cluster.as_str()))
}

pub fn validations_path(cluster: &ClusterId) -> String {
    format!("/v1/clusters/{}/validations", path_segment(cluster.as_str()))
}

/// Run one workflow against an already resolved cluster.
///
/// Stretch and expansion submit a validation, wait for it, and only then PATCH
/// the cluster with the identical body. Preparation is a single PATCH.
pub async fn run(
    api: &dyn RemoteApi,
    cluster: &ClusterId,
    request: &WorkflowRequest,
    poll: PollPolicy,
) -> Result<TrackingAck> {
    let payload = request.payload()?;
    let workflow = request.name();

    if request.needs_validation() {
        let path = validations_path(cluster);
        let accepted = api.post(&path, &payload).await?;
        let handle = accepted
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(ValidationHandle::new)
            .ok_or_else(|| StretchError::UnexpectedResponse {
                path: path.clone(),
                reason: "validation response has no id".to_string(),
            })?;
        info!(workflow, validation = %handle, "validation started");

        let report = poll_until_terminal(api, &handle, poll).await?;
        info!(
            workflow,
            polls = report.polls,
            id = report.validation.id.as_deref().unwrap_or(handle.as_str()),
            "validation completed successfully"
        );
    }

    info!(workflow, cluster = %cluster, "triggering workflow");
    let ack = api.patch(&cluster_path(cluster), &payload).await?;
    info!(workflow, "workflow triggered, track the task status in SDDC Manager");
    Ok(TrackingAck(ack))
}
