use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque locator for one unit of work (usually a URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Result of retrieving a single resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Payload(Bytes),
    Failure(String),
}

impl FetchOutcome {
    pub fn is_payload(&self) -> bool {
        matches!(self, FetchOutcome::Payload(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failure(_))
    }

    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            FetchOutcome::Payload(bytes) => Some(bytes),
            FetchOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            FetchOutcome::Payload(_) => None,
            FetchOutcome::Failure(description) => Some(description),
        }
    }
}

/// One failed resource within a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub index: usize,
    pub id: ResourceId,
    pub description: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.index, self.id, self.description)
    }
}

/// Summary of every failed resource in a batch, ordered by index
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{} of {total} resources failed: {}", .failures.len(), join_failures(.failures))]
pub struct AggregateFailure {
    pub total: usize,
    pub failures: Vec<ItemFailure>,
}

fn join_failures(failures: &[ItemFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl AggregateFailure {
    /// Build from index-aligned ids and outcomes; `None` when nothing failed
    pub fn collect(ids: &[ResourceId], outcomes: &[FetchOutcome]) -> Option<Self> {
        let failures: Vec<ItemFailure> = ids
            .iter()
            .zip(outcomes)
            .enumerate()
            .filter_map(|(index, (id, outcome))| {
                outcome.failure().map(|description| ItemFailure {
                    index,
                    id: id.clone(),
                    description: description.to_string(),
                })
            })
            .collect();

        if failures.is_empty() {
            None
        } else {
            Some(Self {
                total: outcomes.len(),
                failures,
            })
        }
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.description.as_str())
    }
}

/// Outcomes aligned index-for-index with the input identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub outcomes: Vec<FetchOutcome>,
    pub failure: Option<AggregateFailure>,
}

impl BatchResult {
    pub fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
            failure: None,
        }
    }

    /// Pair outcomes with their identifiers and derive the aggregate failure
    pub fn from_outcomes(ids: &[ResourceId], outcomes: Vec<FetchOutcome>) -> Self {
        debug_assert_eq!(ids.len(), outcomes.len());
        let failure = AggregateFailure::collect(ids, &outcomes);
        Self { outcomes, failure }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_payload()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// Successful payloads with their input index
    pub fn payloads(&self) -> impl Iterator<Item = (usize, &Bytes)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.payload().map(|bytes| (index, bytes)))
    }

    /// All payloads in input order, or the aggregate failure if any retrieval failed
    pub fn into_result(self) -> Result<Vec<Bytes>, AggregateFailure> {
        if let Some(failure) = self.failure {
            return Err(failure);
        }

        Ok(self
            .outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                FetchOutcome::Payload(bytes) => Some(bytes),
                FetchOutcome::Failure(_) => None,
            })
            .collect())
    }
}
