//! The `mathdrill generate` command.

use std::path::PathBuf;

use anyhow::Result;

use mathdrill_core::generate::instantiate;
use mathdrill_core::schema::parse_exercise;

use super::{resolve_seed, select_level};

pub fn execute(
    exercise_path: PathBuf,
    level: Option<String>,
    seed: Option<u64>,
    format: String,
) -> Result<()> {
    let exercise = parse_exercise(&exercise_path)?;
    let level = select_level(&exercise, level.as_deref())?;
    let instance = instantiate(&exercise, &level.id, resolve_seed(seed))?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&instance)?),
        _ => {
            println!(
                "{} [level {}, seed {}]",
                exercise.title.as_deref().unwrap_or(&exercise.id),
                instance.level_id,
                instance.seed
            );
            println!("\n{}", instance.question);
            for (i, option) in instance.options.iter().enumerate() {
                println!("  {}. {}", i + 1, option.text);
            }
            println!("\nAnswer: {}", instance.correct_answer);
            if let Some(explanation) = &instance.explanation {
                println!("Explanation: {explanation}");
            }
            println!("Reward: {} xp", instance.xp);
        }
    }

    Ok(())
}
