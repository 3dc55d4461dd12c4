use std::fmt::Write;

use serde::Serialize;

use crate::config::ScanOptions;
use crate::scan::{PassRecord, ScanOutcome, Violation, ViolationNode};

/// Pass/fail decision for the enclosing test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail { reason: String },
}

impl Verdict {
    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail { .. })
    }
}

/// Assertion event destined for the host test framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionEvent {
    pub passed: bool,
    pub message: String,
}

impl AssertionEvent {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// Everything the pipeline produces for one scan invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub verdict: Verdict,
    pub assertions: Vec<AssertionEvent>,
    /// Human-readable lines, in emission order. Plain text; any coloring is
    /// a cosmetic concern of the surface printing them.
    pub diagnostics: Vec<String>,
}

/// Classify a scan outcome and format it for the test run.
///
/// The verdict depends only on the violation count. The option flags gate
/// sections of the diagnostics and the volume of assertion events, never
/// the decision itself. Inputs are not mutated and nothing is retried.
pub fn build_report(options: &ScanOptions, outcome: &ScanOutcome) -> RunReport {
    match outcome {
        ScanOutcome::EngineMissing => fatal(
            "axe not found in the target context. Try increasing \"options.timeout\" in your \
             axe.conf.json, or verify that the engine script was injected.",
        ),
        ScanOutcome::TimedOut => fatal(
            "the axe scan did not finish in time. Try increasing \"options.timeout\" in your \
             axe.conf.json.",
        ),
        ScanOutcome::EngineError { message } => fatal(message),
        ScanOutcome::Completed { violations, passes } => completed(options, violations, passes),
    }
}

fn fatal(message: &str) -> RunReport {
    RunReport {
        verdict: Verdict::Fail {
            reason: message.to_string(),
        },
        assertions: vec![AssertionEvent::failed(message)],
        diagnostics: vec![message.to_string()],
    }
}

fn completed(options: &ScanOptions, violations: &[Violation], passes: &[PassRecord]) -> RunReport {
    let pass_count = passes.len();
    let fail_count = violations.len();
    let mut assertions = Vec::new();
    let mut diagnostics = Vec::new();

    if options.verbose {
        for pass in passes {
            assertions.push(AssertionEvent::ok(pass.help.clone()));
        }
    }

    if pass_count > 0 && fail_count == 0 {
        assertions.push(AssertionEvent::ok(format!("axe: {pass_count} passed.")));
    }

    if fail_count == 0 {
        return RunReport {
            verdict: Verdict::Pass,
            assertions,
            diagnostics,
        };
    }

    diagnostics.push(format!("-----{fail_count} axe violations-----"));
    for (index, violation) in violations.iter().enumerate() {
        format_violation(&mut diagnostics, options, index + 1, violation);
    }
    diagnostics.push("--------------------------".to_string());

    let reason =
        format!("axe: {fail_count} rule violation(s). See the axe violations output for details");
    assertions.push(AssertionEvent::failed(reason.clone()));
    RunReport {
        verdict: Verdict::Fail { reason },
        assertions,
        diagnostics,
    }
}

fn format_violation(
    diagnostics: &mut Vec<String>,
    options: &ScanOptions,
    ordinal: usize,
    violation: &Violation,
) {
    diagnostics.push(format!(
        "#{ordinal}: {help} ({id})",
        help = violation.help,
        id = violation.id
    ));
    diagnostics.push(format!("Impact: {}", violation.impact.as_str()));
    diagnostics.push(format!("Count: {}", violation.nodes.len()));
    diagnostics.push(format!("See: {}", violation.sanitized_help_url()));

    for (index, node) in violation.nodes.iter().enumerate() {
        format_node(diagnostics, options, ordinal, index + 1, node);
    }
    diagnostics.push(String::new());
}

fn format_node(
    diagnostics: &mut Vec<String>,
    options: &ScanOptions,
    ordinal: usize,
    node_ordinal: usize,
    node: &ViolationNode,
) {
    diagnostics.push(format!(
        "#{ordinal}.{node_ordinal}: {}",
        node.failure_summary
    ));
    diagnostics.push(format!("  {}", node.html));

    if options.selectors {
        diagnostics.push(format!("  Selector: {}", node.target.join(", ")));
    }
    if options.ancestry {
        if let Some(ancestry) = &node.ancestry {
            diagnostics.push(format!("  Ancestry: {}", ancestry.join(", ")));
        }
    }
    if options.element_ref {
        if let Some(reference) = &node.element_ref {
            diagnostics.push(format!("  Element reference: {reference}"));
        }
    }
    if options.related_nodes {
        diagnostics.push("--".to_string());
        diagnostics.push("Related nodes:".to_string());
        for check in &node.related_checks {
            diagnostics.push(check.message.clone());
            for related in &check.related_nodes {
                diagnostics.push(format!("Selector: {}", related.target.join(", ")));
            }
        }
    }
}

/// Format styles supported by the default renderer.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Produce a printable string from a `RunReport` using the desired format.
pub fn render_report(report: &RunReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(report),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn render_human(report: &RunReport) -> anyhow::Result<String> {
    let mut out = String::new();
    for line in &report.diagnostics {
        writeln!(out, "{line}")?;
    }
    for assertion in &report.assertions {
        let marker = if assertion.passed { "ok" } else { "FAILED" };
        writeln!(out, "{marker}: {}", assertion.message)?;
    }
    match &report.verdict {
        Verdict::Pass => writeln!(out, "Verdict: pass")?,
        Verdict::Fail { reason } => writeln!(out, "Verdict: fail ({reason})")?,
    }
    Ok(out)
}
