//! HTML score sheet generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use std::path::Path;

use anyhow::{Context, Result};
use mathdrill_core::expr::format_number;
use mathdrill_core::report::{PartScore, ScoreReport};

use crate::primitives::escape;

/// Generate an HTML score sheet from a report.
pub fn score_sheet(report: &ScoreReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>{} | score sheet</title>\n",
        escape(&report.subject_title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape(&report.subject_title)));
    html.push_str(&format!(
        "<p class=\"mark\">{} / {}</p>\n",
        format_number(report.mark),
        format_number(report.scale)
    ));
    html.push_str(&format!(
        "<p class=\"meta\">{} / {} points | {} of {} questions correct",
        format_number(report.earned),
        format_number(report.possible),
        report.correct_count(),
        report.scored_count()
    ));
    if report.non_evaluated_points > 0.0 {
        html.push_str(&format!(
            " | {} points not evaluated",
            format_number(report.non_evaluated_points)
        ));
    }
    html.push_str("</p>\n</header>\n");

    if !report.parts.is_empty() {
        html.push_str("<section class=\"chart\">\n<h2>Parts</h2>\n");
        html.push_str(&part_chart(&report.parts));
        html.push_str("</section>\n");
    }

    // Per-question results
    html.push_str("<section class=\"results\">\n<h2>Questions</h2>\n");
    html.push_str("<table>\n");
    html.push_str("<thead><tr><th>Part</th><th>Exercise</th><th>Question</th><th>Answer</th><th>Points</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for part in &report.parts {
        for exercise in &part.exercises {
            for q in &exercise.questions {
                let class = if !q.scored {
                    "info"
                } else if q.correct {
                    "pass"
                } else {
                    "fail"
                };
                let points = if q.scored {
                    format!("{} / {}", format_number(q.earned), format_number(q.possible))
                } else {
                    "-".to_string()
                };
                html.push_str(&format!(
                    "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{points}</td></tr>\n",
                    escape(&part.id),
                    escape(&exercise.id),
                    escape(&q.id),
                    escape(q.submitted.as_deref().unwrap_or("")),
                ));
            }
        }
    }
    html.push_str("</tbody></table>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML score sheet to a file.
pub fn write_score_sheet(report: &ScoreReport, path: &Path) -> Result<()> {
    let html = score_sheet(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write score sheet to {}", path.display()))?;
    Ok(())
}

fn part_chart(parts: &[PartScore]) -> String {
    let bar_height = 26;
    let max_width = 360;
    let padding = 10;
    let label_width = 180;
    let total_height = parts.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, part) in parts.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let ratio = part.ratio();
        let width = (ratio * max_width as f64) as usize;
        let color = if ratio >= 0.75 {
            "#22c55e"
        } else if ratio >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };
        let name = if part.title.is_empty() {
            &part.id
        } else {
            &part.title
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            escape(name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{label_width}\" y=\"{y}\" width=\"{width}\" height=\"{bar_height}\" fill=\"{color}\" rx=\"4\"/>\n"
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.0}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            ratio * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --info: #f3f4f6; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --info: #1f2937; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.mark { font-size: 2.5rem; font-weight: bold; margin: 0.5rem 0; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.info { background: var(--info); color: #6b7280; }
svg { margin: 1rem 0; }
"#;
