use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: Option<String>,
}

/// Envelope used by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PageOf<T> {
    #[serde(default = "Vec::new")]
    pub elements: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Domain {
    pub name: String,
    #[serde(default)]
    pub clusters: Vec<ResourceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
}

/// Opaque cluster id, used as a path component once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterId(String);

impl ClusterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle of an accepted validation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationHandle(String);

impl ValidationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValidationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub id: Option<String>,
    pub execution_status: Option<ExecutionStatus>,
    pub result_status: Option<ResultStatus>,
}

impl Validation {
    /// `None` while the remote side is still working.
    pub fn outcome(&self) -> Option<ValidationOutcome> {
        match &self.execution_status {
            Some(s) if s.is_running() => None,
            Some(ExecutionStatus::Completed) if self.result_status == Some(ResultStatus::Succeeded) => {
                Some(ValidationOutcome::Succeeded)
            }
            _ => Some(ValidationOutcome::Failed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Succeeded,
    Failed,
}

/// Execution state of a validation. The service spells the running states
/// several ways (`Pending`, `IN_PROGRESS`, `In Progress`); they collapse here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Pending,
    InProgress,
    Completed,
    Unknown(String),
}

impl ExecutionStatus {
    pub fn parse(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "PENDING" => Self::Pending,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Unknown(v) => v.as_str(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultStatus {
    Succeeded,
    Failed,
    Unknown(String),
}

impl ResultStatus {
    pub fn parse(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Unknown(v) => v.as_str(),
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase().replace([' ', '-'], "_")
}

impl<'de> Deserialize<'de> for ExecutionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

impl<'de> Deserialize<'de> for ResultStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(v: serde_json::Value) -> Validation {
        serde_json::from_value(v).expect("validation json")
    }

    #[test]
    fn running_synonyms_collapse() {
        for raw in ["Pending", "PENDING", "In Progress", "IN_PROGRESS", "in-progress"] {
            assert!(ExecutionStatus::parse(raw).is_running(), "{raw}");
        }
        assert!(!ExecutionStatus::parse("COMPLETED").is_running());
        assert!(!ExecutionStatus::parse("CANCELLED").is_running());
    }

    #[test]
    fn completed_and_succeeded_is_the_only_success() {
        let ok = validation(serde_json::json!({
            "executionStatus": "COMPLETED",
            "resultStatus": "SUCCEEDED"
        }));
        assert_eq!(ok.outcome(), Some(ValidationOutcome::Succeeded));

        let failed = validation(serde_json::json!({
            "executionStatus": "COMPLETED",
            "resultStatus": "FAILED"
        }));
        assert_eq!(failed.outcome(), Some(ValidationOutcome::Failed));

        let no_result = validation(serde_json::json!({"executionStatus": "COMPLETED"}));
        assert_eq!(no_result.outcome(), Some(ValidationOutcome::Failed));

        let odd = validation(serde_json::json!({
            "executionStatus": "CANCELLED",
            "resultStatus": "SUCCEEDED"
        }));
        assert_eq!(odd.outcome(), Some(ValidationOutcome::Failed));
    }

    #[test]
    fn running_validation_has_no_outcome() {
        let running = validation(serde_json::json!({
            "id": "v-1",
            "executionStatus": "In Progress"
        }));
        assert_eq!(running.outcome(), None);
    }

    #[test]
    fn list_envelope_tolerates_missing_clusters() {
        let page: PageOf<Domain> = serde_json::from_value(serde_json::json!({
            "elements": [{"id": "d-1", "name": "mgmt"}]
        }))
        .expect("page");
        assert_eq!(page.elements.len(), 1);
        assert!(page.elements[0].clusters.is_empty());
    }
}
