use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ScanOptions;

pub mod driver;
pub mod raw;

/// Severity classification the engine assigns to a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Minor => "minor",
            Impact::Moderate => "moderate",
            Impact::Serious => "serious",
            Impact::Critical => "critical",
        }
    }
}

/// A node referenced by a related check, identified only by its selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedNode {
    pub target: Vec<String>,
}

/// Supporting detail explaining why a check matched, with the nodes it
/// involved. The any/all/none grouping is flattened away at the raw
/// boundary; order within a node is always any, then all, then none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedCheck {
    pub message: String,
    pub related_nodes: Vec<RelatedNode>,
}

/// One offending DOM node within a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationNode {
    /// Serialized markup of the offending element.
    pub html: String,
    pub failure_summary: String,
    pub target: Vec<String>,
    pub ancestry: Option<Vec<String>>,
    /// Opaque element handle from the driving layer, when it supplied one.
    pub element_ref: Option<String>,
    pub related_checks: Vec<RelatedCheck>,
}

/// A failed accessibility rule with every node it affected, in engine order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable rule identifier, e.g. `image-alt`.
    pub id: String,
    /// Human-readable rule summary.
    pub help: String,
    pub help_url: String,
    pub impact: Impact,
    pub nodes: Vec<ViolationNode>,
}

impl Violation {
    /// Documentation URL with any query string stripped.
    pub fn sanitized_help_url(&self) -> &str {
        self.help_url.split('?').next().unwrap_or(&self.help_url)
    }
}

/// A rule that ran and found nothing wrong. Only the summary is surfaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRecord {
    pub help: String,
}

/// Classified result of one scan invocation. Exactly one variant is produced
/// per run; a payload and an error never coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Completed {
        violations: Vec<Violation>,
        passes: Vec<PassRecord>,
    },
    /// The engine capability was not available in the target context.
    EngineMissing,
    /// The bounded engine call did not return within the timeout budget.
    TimedOut,
    /// The engine itself reported a failure.
    EngineError { message: String },
}

/// Capability boundary to the browsing context hosting the scan engine.
///
/// Implementations talk to a real browser (script injection plus an async
/// execute call) or replay captured results in tests and tooling.
#[async_trait]
pub trait ScanEngine: Send + Sync {
    /// Ensure the engine script is present in the target context.
    ///
    /// Must be idempotent: implementations detect an already-injected script
    /// (by its marker element) and report `true` without appending a second
    /// copy. `false` means the engine could not be made available.
    async fn inject(&self) -> AnyResult<bool>;

    /// Execute the scan against `context` with the given options and return
    /// the engine's raw payload.
    async fn run(&self, context: &str, options: &ScanOptions) -> AnyResult<raw::RawResults>;
}
