use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Failed to read event file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse event payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unable to determine pull request number from event data")]
    Unresolvable,
}

/// Read and parse the JSON trigger payload written by the CI host.
pub fn load_event(path: &Path) -> Result<Value, EventError> {
    let contents = fs::read_to_string(path).map_err(|source| EventError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Determine the PR number from a trigger payload.
///
/// A `pull_request` event carries `pull_request.number`. A comment on a PR
/// arrives as an `issue_comment` event whose `issue` has a `pull_request`
/// entry; there the PR number is `issue.number`.
pub fn resolve_pr_number(event: &Value) -> Result<u64, EventError> {
    if let Some(pull_request) = event.get("pull_request") {
        debug!("resolving PR number from pull_request event");
        return pull_request
            .get("number")
            .and_then(Value::as_u64)
            .ok_or(EventError::Unresolvable);
    }

    if let Some(issue) = event.get("issue") {
        if issue.get("pull_request").is_some_and(|pr| !pr.is_null()) {
            debug!("resolving PR number from issue comment event");
            return issue
                .get("number")
                .and_then(Value::as_u64)
                .ok_or(EventError::Unresolvable);
        }
    }

    Err(EventError::Unresolvable)
}
