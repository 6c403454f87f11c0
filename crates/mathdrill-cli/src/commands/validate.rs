//! The `mathdrill validate` command.

use std::path::PathBuf;

use anyhow::Result;

use mathdrill_core::schema::{exercise_files, parse_exercise};

pub fn execute(exercise_path: PathBuf) -> Result<()> {
    let files = if exercise_path.is_dir() {
        exercise_files(&exercise_path)?
    } else {
        vec![exercise_path]
    };

    let mut invalid = 0;

    for path in &files {
        match parse_exercise(path) {
            Ok(exercise) => println!(
                "OK   {} ({}, {} level(s), engine {})",
                path.display(),
                exercise.id,
                exercise.levels.len(),
                exercise.visual_engine
            ),
            Err(e) => {
                invalid += 1;
                println!("FAIL {e:#}");
            }
        }
    }

    if invalid == 0 {
        println!("All {} exercise(s) valid.", files.len());
        Ok(())
    } else {
        anyhow::bail!("{invalid} of {} exercise(s) invalid", files.len())
    }
}
