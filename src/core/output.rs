//! Output rendering for CLI surfaces.
//!
//! Keeps command result output bounded and readable while preserving signal.

use crate::core::error::PolicyError;
use crate::core::guide::Principle;
use crate::core::report::{Report, VerifyOutcome};
use crate::core::rules::Violation;
use colored::Colorize;
use std::io::Write;

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Render up to `max_items` messages with compact formatting.
pub fn preview_messages(messages: &[String], max_items: usize, max_chars: usize) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let shown = messages
        .iter()
        .take(max_items)
        .map(|m| compact_line(m, max_chars))
        .collect::<Vec<_>>()
        .join(" | ");
    if messages.len() > max_items {
        format!("{} (+{} more)", shown, messages.len() - max_items)
    } else {
        shown
    }
}

pub fn violation_line(v: &Violation) -> String {
    format!(
        "  [{}] {} {}",
        v.rule.as_str().red().bold(),
        v.location().as_str().bold(),
        v.message
    )
}

/// Human-readable `check` report.
pub fn render_check_text(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("check: running\n");
    match &report.guide {
        Some(guide) => out.push_str(&format!("check: guide={}\n", guide)),
        None => out.push_str("check: guide=<none>\n"),
    }
    for v in &report.violations {
        out.push_str(&violation_line(v));
        out.push('\n');
    }
    for w in &report.warnings {
        out.push_str(&format!("  {} {}\n", "warn:".yellow().bold(), w));
    }

    let s = report.summary;
    out.push_str(&format!(
        "check: summary pass={} fail={} warn={} skip={}\n",
        s.pass, s.fail, s.warn, s.skip
    ));

    if !report.violations.is_empty() {
        let messages: Vec<String> = report
            .violations
            .iter()
            .map(|v| format!("{} {}", v.rule, v.message))
            .collect();
        out.push_str(&format!(
            "check: failures {}: {}\n",
            messages.len(),
            preview_messages(&messages, 2, 110)
        ));
    }

    let status = if report.ok {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    out.push_str(&format!("check: {}\n", status));
    out
}

pub fn render_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, PolicyError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

/// Print a `verify` outcome. The success object always goes to stdout;
/// failures go to stderr in text mode and stdout in JSON mode.
pub fn emit_verify(
    outcome: &VerifyOutcome,
    json: bool,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> Result<(), PolicyError> {
    if json || matches!(outcome, VerifyOutcome::Passed { .. }) {
        writeln!(stdout, "{}", render_json(&outcome.to_json(), false)?)?;
        return Ok(());
    }
    match outcome {
        VerifyOutcome::Violation { error, .. } => writeln!(stderr, "FAIL: {}", error)?,
        VerifyOutcome::Error { error, .. } => writeln!(stderr, "{}", error)?,
        VerifyOutcome::Passed { .. } => {}
    }
    Ok(())
}

pub fn render_principles_text(guide: &str, principles: &[Principle]) -> String {
    let mut out = format!("principles: guide={} count={}\n", guide, principles.len());
    for p in principles {
        out.push_str(&format!("  {:>2}. {}\n", p.number, p.title));
    }
    out
}
