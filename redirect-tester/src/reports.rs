use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub description: String,
    pub passed: bool,
    pub failures: Vec<String>,
    /// State labels in the order they were entered.
    pub trace: Vec<String>,
    pub navigations: Vec<String>,
    pub notices: Vec<String>,
    pub elapsed_ms: u64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    total: usize,
    passed: usize,
    results: &'a [ScenarioResult],
}

fn passed_count(results: &[ScenarioResult]) -> usize {
    results.iter().filter(|r| r.passed).count()
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    (passed_count(results) as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
    generated_at: DateTime<Utc>,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Redirect Replay Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==========================".cyan())?;

    let total = results.len();
    let passed = passed_count(results);
    writeln!(out, "Generated: {}", generated_at.to_rfc3339())?;
    writeln!(out, "Total scenarios: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Wall time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} {}", status, result.scenario_name.bold())?;
        writeln!(out, "   {}", result.description)?;
        writeln!(out, "   Trace: {}", result.trace.join(" -> "))?;
        if !result.navigations.is_empty() {
            writeln!(out, "   Navigations: {}", result.navigations.join(", "))?;
        }
        writeln!(out, "   Virtual time: {} ms", result.elapsed_ms)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let report = JsonReport {
        generated_at: generated_at.to_rfc3339(),
        total: results.len(),
        passed: passed_count(results),
        results,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    generated_at: DateTime<Utc>,
) -> Result<()> {
    writeln!(out, "# Redirect Replay Results\n")?;
    writeln!(out, "_Generated {}_\n", generated_at.to_rfc3339())?;

    if results.is_empty() {
        writeln!(out, "_No scenarios executed._")?;
        return Ok(());
    }

    let total = results.len();
    let passed = passed_count(results);
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {} {}\n", status, result.scenario_name)?;
        writeln!(out, "{}\n", result.description)?;
        writeln!(out, "- **Trace**: `{}`", result.trace.join(" -> "))?;
        writeln!(out, "- **Virtual time**: {} ms", result.elapsed_ms)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
