pub mod generate;
pub mod init;
pub mod render;
pub mod score;
pub mod validate;

use anyhow::Result;

use mathdrill_core::model::{ExerciseDescriptor, LevelConfig};

/// The requested level, or the first one.
pub(crate) fn select_level<'a>(
    exercise: &'a ExerciseDescriptor,
    level: Option<&str>,
) -> Result<&'a LevelConfig> {
    match level {
        Some(id) => exercise.level(id).ok_or_else(|| {
            let known: Vec<&str> = exercise.levels.iter().map(|l| l.id.as_str()).collect();
            anyhow::anyhow!(
                "exercise {} has no level {id} (available: {})",
                exercise.id,
                known.join(", ")
            )
        }),
        None => exercise
            .first_level()
            .ok_or_else(|| anyhow::anyhow!("exercise {} has no levels", exercise.id)),
    }
}

/// The requested seed, or a fresh random one.
pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        let seed = rand::random();
        tracing::info!(seed, "no seed given, using a random one");
        seed
    })
}
