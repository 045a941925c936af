//! Offline quality and compliance checks over fixture files.
//!
//! Neither command reads configuration or connects to the database, so they
//! can be used to vet events and playbooks before they reach production.

use std::path::PathBuf;

use brandops_core::{load_event_file, load_playbook_file, Platform};
use brandops_quality::{DataQualityMonitor, MonitorConfig, ValidationOutcome};
use brandops_scoring::{ComplianceConfig, ComplianceResult, ComplianceValidationService};
use clap::Subcommand;

/// Sub-commands available under `quality`.
#[derive(Debug, Subcommand)]
pub enum QualityCommands {
    /// Run every built-in rule against a JSON or YAML event file
    Check {
        event: PathBuf,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Sub-commands available under `compliance`.
#[derive(Debug, Subcommand)]
pub enum ComplianceCommands {
    /// Validate an event, or a proposed response, against a playbook
    Check {
        /// Event file (JSON or YAML)
        #[arg(long)]
        event: PathBuf,
        /// Playbook file (JSON or YAML)
        #[arg(long)]
        playbook: PathBuf,
        /// Validate this text instead of the event's own content
        #[arg(long)]
        text: Option<String>,
        /// Minimum overall score for a compliant result
        #[arg(long, default_value = "0.7")]
        min_score: f64,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

/// # Errors
///
/// Returns an error if the event file cannot be loaded or the event fails
/// a blocking rule.
pub(crate) async fn run_quality(command: QualityCommands) -> anyhow::Result<()> {
    let QualityCommands::Check { event, json } = command;
    let event = load_event_file(&event)?;
    let outcome = DataQualityMonitor::new(MonitorConfig::default(), None)
        .monitor_event(&event)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_quality(&outcome);
    }

    if outcome.is_valid {
        Ok(())
    } else {
        anyhow::bail!("event {} failed blocking quality rules", outcome.event_id)
    }
}

fn print_quality(outcome: &ValidationOutcome) {
    let verdict = if outcome.is_valid { "valid" } else { "INVALID" };
    println!("event {}: {verdict}", outcome.event_id);
    if outcome.issues.is_empty() {
        println!("no data quality issues");
        return;
    }
    println!("{:<26}{:<10}MESSAGE", "ISSUE", "SEVERITY");
    for issue in &outcome.issues {
        println!(
            "{:<26}{:<10}{}",
            issue.issue_type,
            issue.severity.as_str(),
            issue.message
        );
    }
}

/// # Errors
///
/// Returns an error if either file cannot be loaded or the text is not
/// compliant.
pub(crate) fn run_compliance(command: ComplianceCommands) -> anyhow::Result<()> {
    let ComplianceCommands::Check {
        event,
        playbook,
        text,
        min_score,
        json,
    } = command;
    if !(0.0..=1.0).contains(&min_score) {
        anyhow::bail!("--min-score must be within [0, 1], got {min_score}");
    }

    let event = load_event_file(&event)?;
    let playbook = load_playbook_file(&playbook)?;
    let service = ComplianceValidationService::new(ComplianceConfig { min_score });
    let result = match text.as_deref() {
        Some(text) => service.validate_text(text, event.platform, &playbook),
        None => service.validate_compliance(&event, &playbook),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_compliance(&result, event.platform, &playbook.brand_identity.name);
    }

    if result.is_compliant {
        Ok(())
    } else {
        anyhow::bail!("text is not compliant with the {} playbook", playbook.brand_identity.name)
    }
}

fn print_compliance(result: &ComplianceResult, platform: Platform, brand: &str) {
    let verdict = if result.is_compliant {
        "compliant"
    } else {
        "NOT COMPLIANT"
    };
    println!(
        "{brand} on {platform}: {verdict} (score {:.2}, tone {} {:.2})",
        result.overall_score, result.tone_analysis.detected_tone, result.tone_analysis.score
    );
    for violation in &result.violations {
        println!(
            "  violation [{}] {}: {} (\"{}\")",
            violation.severity.as_str(),
            violation.violation_type.as_str(),
            violation.description,
            violation.detected_text
        );
    }
    for warning in &result.warnings {
        println!("  warning: {}", warning.message);
    }
}
