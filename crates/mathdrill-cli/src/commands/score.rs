//! The `mathdrill score` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

use mathdrill_core::exam::{parse_subject, AnswerSet};
use mathdrill_core::expr::format_number;
use mathdrill_core::report::{ExamRecord, ScoreReport};
use mathdrill_core::scoring::score_subject;
use mathdrill_render::html::write_score_sheet;
use mathdrill_store::{create_store, load_config_from};

pub async fn execute(
    subject_path: PathBuf,
    answers_path: PathBuf,
    config_path: Option<PathBuf>,
    save: bool,
    html: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let subject = parse_subject(&subject_path)?;
    let answers = AnswerSet::load_json(&answers_path)?;

    let report = score_subject(&subject, &answers, &config.scoring);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_summary(&report),
    }

    if let Some(path) = html {
        write_score_sheet(&report, &path)?;
        eprintln!("Score sheet written to {}", path.display());
    }

    if save {
        let store = create_store(&config.store);
        let record = ExamRecord::from_report(&report, Utc::now());
        store.save(&record).await?;
        eprintln!("Result saved to the {} store ({})", store.name(), record.id);
    }

    Ok(())
}

fn print_summary(report: &ScoreReport) {
    let mut table = Table::new();
    table.set_header(vec!["Part", "Exercise", "Question", "Answer", "Result", "Points"]);

    for part in &report.parts {
        for exercise in &part.exercises {
            for q in &exercise.questions {
                let (result, points) = if q.scored {
                    (
                        if q.correct { "correct" } else { "wrong" },
                        format!("{}/{}", format_number(q.earned), format_number(q.possible)),
                    )
                } else {
                    ("info", "-".to_string())
                };
                table.add_row(vec![
                    Cell::new(&part.id),
                    Cell::new(&exercise.id),
                    Cell::new(&q.id),
                    Cell::new(q.submitted.as_deref().unwrap_or("")),
                    Cell::new(result),
                    Cell::new(points),
                ]);
            }
        }
    }

    println!("{}\n", report.subject_title);
    println!("{table}");
    println!(
        "\nPoints: {}/{} ({} of {} correct)",
        format_number(report.earned),
        format_number(report.possible),
        report.correct_count(),
        report.scored_count()
    );
    println!(
        "Mark: {}/{}",
        format_number(report.mark),
        format_number(report.scale)
    );
    if report.non_evaluated_points > 0.0 {
        println!(
            "Not evaluated: {} point(s)",
            format_number(report.non_evaluated_points)
        );
    }
}
