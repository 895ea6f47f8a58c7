//! Plan and drift display - caixa-specific UI

use colored::Colorize;
use declarative::{BucketRecord, DriftFinding, DriftReport, FieldChanges, Plan};

const RULE: &str = "─────────────────────────────────────────────────────";

/// Display a plan in a user-friendly format
pub fn display_plan(plan: &Plan) {
    if plan.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Reconciliation Plan".bold()
    );
    println!("│");

    if !plan.creates.is_empty() {
        println!("│ {}", "Create".bold());
        for record in &plan.creates {
            println!(
                "│   {} {:<30} {}",
                "+".green(),
                record.name,
                describe_record(record).dimmed()
            );
        }
        println!("│");
    }

    if !plan.updates.is_empty() {
        println!("│ {}", "Update".bold());
        for update in &plan.updates {
            println!("│   {} {}", "~".yellow(), update.name);
            for line in change_lines(&update.changes) {
                println!("│       {}", line.dimmed());
            }
        }
        println!("│");
    }

    println!("├{RULE}┤");
    println!(
        "│ Summary: {} changes ({} create, {} update)",
        plan.total_changes().to_string().bold(),
        plan.creates.len().to_string().green(),
        plan.updates.len().to_string().yellow()
    );
    println!(
        "│ {} desired, {} recorded",
        plan.outputs.count_desired_buckets, plan.outputs.count_state_buckets
    );
    println!("└{RULE}┘");
}

/// Display drift findings
pub fn display_drift(report: &DriftReport) {
    if !report.has_drift() {
        println!();
        println!("  {} No drift.", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Drift".yellow().bold()
    );
    println!("│");
    for finding in &report.drift {
        let symbol = match finding {
            DriftFinding::Missing { .. } => "!".red(),
            DriftFinding::Mismatch { .. } => "~".yellow(),
        };
        println!(
            "│   {} {:<30} {}",
            symbol,
            finding.name(),
            describe_finding(finding).dimmed()
        );
    }
    println!("│");
    println!("├{RULE}┤");
    println!("│ {} findings", report.len().to_string().bold());
    println!("└{RULE}┘");
}

fn describe_record(record: &BucketRecord) -> String {
    format!(
        "public={}, classification={}, prefix={}",
        record.public,
        record.classification,
        display_prefix(&record.allowed_prefix)
    )
}

fn change_lines(changes: &FieldChanges) -> Vec<String> {
    let mut lines = Vec::with_capacity(changes.len());
    if let Some(c) = &changes.public {
        lines.push(format!("public: {} → {}", c.from, c.to));
    }
    if let Some(c) = &changes.classification {
        lines.push(format!("classification: {} → {}", c.from, c.to));
    }
    if let Some(c) = &changes.allowed_prefix {
        lines.push(format!(
            "allowed_prefix: {} → {}",
            display_prefix(&c.from),
            display_prefix(&c.to)
        ));
    }
    lines
}

fn describe_finding(finding: &DriftFinding) -> String {
    match finding {
        DriftFinding::Missing { .. } => "missing from backend".to_string(),
        DriftFinding::Mismatch {
            field,
            state,
            actual,
            ..
        } => format!("{field}: recorded {state}, actual {actual}"),
    }
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() { "(none)" } else { prefix }
}
