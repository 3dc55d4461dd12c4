//! Serde boundary for the engine's raw JSON payload.
//!
//! axe-core reports loosely structured camelCase objects; everything past
//! this module is the typed model from [`crate::scan`]. No untyped payload
//! crosses this boundary.

use anyhow::{anyhow, Result};
use serde::Deserialize;

use super::{PassRecord, RelatedCheck, RelatedNode, ScanOutcome, Violation, ViolationNode};
use crate::scan::Impact;

/// Top-level `axe.run()` payload. Only the rule lists the reporter consumes
/// are modeled; the rest of the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResults {
    #[serde(default)]
    pub violations: Vec<RawRule>,
    #[serde(default)]
    pub passes: Vec<RawRule>,
}

impl RawResults {
    /// Convert the payload into the typed outcome, preserving engine order.
    ///
    /// Fails when a violation lacks an impact classification, which a
    /// healthy engine never produces for the violations list.
    pub fn into_outcome(self) -> Result<ScanOutcome> {
        let violations = self
            .violations
            .into_iter()
            .map(RawRule::into_violation)
            .collect::<Result<Vec<_>>>()?;
        let passes = self
            .passes
            .into_iter()
            .map(|rule| PassRecord { help: rule.help })
            .collect();
        Ok(ScanOutcome::Completed { violations, passes })
    }
}

/// One rule result, shared between the violations and passes lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub help_url: String,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

impl RawRule {
    fn into_violation(self) -> Result<Violation> {
        let impact = self
            .impact
            .ok_or_else(|| anyhow!("violation `{}` is missing an impact classification", self.id))?;
        Ok(Violation {
            id: self.id,
            help: self.help,
            help_url: self.help_url,
            impact,
            nodes: self.nodes.into_iter().map(RawNode::into_node).collect(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub failure_summary: String,
    #[serde(default)]
    pub target: Vec<String>,
    #[serde(default)]
    pub ancestry: Option<Vec<String>>,
    #[serde(default)]
    pub element: Option<RawElementRef>,
    #[serde(default)]
    pub any: Vec<RawCheck>,
    #[serde(default)]
    pub all: Vec<RawCheck>,
    #[serde(default)]
    pub none: Vec<RawCheck>,
}

impl RawNode {
    fn into_node(self) -> ViolationNode {
        // The any/all/none grouping is fixed into a single list here, in
        // exactly that order, with no deduplication.
        let related_checks = self
            .any
            .into_iter()
            .chain(self.all)
            .chain(self.none)
            .map(RawCheck::into_check)
            .collect();
        ViolationNode {
            html: self.html,
            failure_summary: self.failure_summary,
            target: self.target,
            ancestry: self.ancestry,
            element_ref: self.element.map(|element| element.reference),
            related_checks,
        }
    }
}

/// WebDriver element handle as the driving layer attaches it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElementRef {
    #[serde(rename = "ELEMENT")]
    pub reference: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCheck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub related_nodes: Vec<RawRelatedNode>,
}

impl RawCheck {
    fn into_check(self) -> RelatedCheck {
        RelatedCheck {
            message: self.message,
            related_nodes: self
                .related_nodes
                .into_iter()
                .map(|node| RelatedNode {
                    target: node.target,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRelatedNode {
    #[serde(default)]
    pub target: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "violations": [
            {
                "id": "image-alt",
                "help": "Images must have alternate text",
                "helpUrl": "https://example.com/rules/image-alt?application=axeAPI",
                "impact": "critical",
                "nodes": [
                    {
                        "html": "<img src=\"hero.png\">",
                        "failureSummary": "Fix any of the following: missing alt",
                        "target": ["#hero > img"],
                        "ancestry": ["html > body > div#hero > img"],
                        "element": { "ELEMENT": "element-42" },
                        "any": [
                            {
                                "message": "Element has no alt attribute",
                                "relatedNodes": [{ "target": ["#hero"] }]
                            }
                        ],
                        "all": [{ "message": "all-check", "relatedNodes": [] }],
                        "none": [{ "message": "none-check", "relatedNodes": [] }]
                    }
                ]
            }
        ],
        "passes": [
            { "id": "document-title", "help": "Documents must have a title" }
        ],
        "incomplete": [],
        "timestamp": "2024-04-02T10:00:00.000Z"
    }"##;

    #[test]
    fn sample_payload_converts_to_typed_outcome() {
        let raw: RawResults = serde_json::from_str(SAMPLE).unwrap();
        let outcome = raw.into_outcome().unwrap();
        let ScanOutcome::Completed { violations, passes } = outcome else {
            panic!("expected a completed outcome");
        };

        assert_eq!(violations.len(), 1);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].help, "Documents must have a title");

        let violation = &violations[0];
        assert_eq!(violation.id, "image-alt");
        assert_eq!(violation.impact, Impact::Critical);

        let node = &violation.nodes[0];
        assert_eq!(node.target, vec!["#hero > img".to_string()]);
        assert_eq!(node.element_ref.as_deref(), Some("element-42"));
    }

    #[test]
    fn related_checks_concatenate_any_then_all_then_none() {
        let raw: RawResults = serde_json::from_str(SAMPLE).unwrap();
        let ScanOutcome::Completed { violations, .. } = raw.into_outcome().unwrap() else {
            panic!("expected a completed outcome");
        };
        let messages: Vec<_> = violations[0].nodes[0]
            .related_checks
            .iter()
            .map(|check| check.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["Element has no alt attribute", "all-check", "none-check"]
        );
    }

    #[test]
    fn violation_without_impact_is_rejected() {
        let raw: RawResults = serde_json::from_str(
            r#"{ "violations": [{ "id": "mystery" }], "passes": [] }"#,
        )
        .unwrap();
        let err = raw.into_outcome().expect_err("missing impact should fail");
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn empty_payload_is_a_clean_completed_outcome() {
        let raw: RawResults = serde_json::from_str("{}").unwrap();
        let outcome = raw.into_outcome().unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Completed {
                violations: Vec::new(),
                passes: Vec::new()
            }
        );
    }
}
