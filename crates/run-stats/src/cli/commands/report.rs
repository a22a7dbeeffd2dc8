//! Report command for run-stats

use std::path::{Path, PathBuf};

use crate::config::LoadOptions;
use crate::error::Result;
use crate::loader::DatasetLoader;
use crate::report::{run_standard_report, ReportContext, ReportSummary};

/// Load a dataset and write the standard chart set as JSON
pub fn run(path: PathBuf, output: Option<PathBuf>, debug: bool) -> Result<()> {
    let loader = DatasetLoader::new(LoadOptions::default().debug(debug));
    let dataset = loader.load(&path)?;

    let mut ctx = ReportContext::new(dataset);
    let summary = run_standard_report(&mut ctx);
    let json = ctx.registry.to_json()?;

    match output {
        Some(out) => {
            write_output(&out, &json)?;
            println!("Wrote {} charts to {}", ctx.registry.len(), out.display());
            println!();
            for line in summary_lines(&ctx, &summary) {
                println!("{}", line);
            }
        }
        None => {
            // stdout carries the JSON
            println!("{}", json);
            for line in summary_lines(&ctx, &summary) {
                eprintln!("{}", line);
            }
        }
    }

    Ok(())
}

fn write_output(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}

fn summary_lines(ctx: &ReportContext, summary: &ReportSummary) -> Vec<String> {
    let mut lines = vec![
        format!("{:<24} {:<12} {:>8}", "Chart", "Type", "Points"),
        "-".repeat(46),
    ];

    for chart in ctx.registry.iter() {
        lines.push(format!(
            "{:<24} {:<12} {:>8}",
            truncate(&chart.title, 24),
            chart.chart_type.as_str(),
            chart.x_values.len()
        ));
    }

    for (title, error) in &summary.failures {
        lines.push(format!("{:<24} failed: {}", truncate(title, 24), error));
    }

    if let Some((start, end)) = ctx.dataset.date_range() {
        lines.push(String::new());
        lines.push(format!(
            "{} runs by {} users, {} ~ {}",
            ctx.dataset.len(),
            ctx.identity.len(),
            start,
            end
        ));
    }

    lines
}

/// Truncate a string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Total distance", 24), "Total distance");
        assert_eq!(truncate("A very long chart title here", 10), "A very ...");
        assert_eq!(truncate("月度配速变化趋势图表", 5), "月度...");
    }

    #[test]
    fn test_write_output_creates_parent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out").join("charts.json");
        write_output(&path, "[]").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }

    #[test]
    fn test_missing_input_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(run(temp.path().join("nope"), None, false).is_err());
    }
}
