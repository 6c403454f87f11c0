//! The `mathdrill render` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use mathdrill_core::generate::instantiate;
use mathdrill_core::schema::parse_exercise;
use mathdrill_render::render;
use mathdrill_store::load_config_from;

use super::{resolve_seed, select_level};

pub fn execute(
    exercise_path: PathBuf,
    level: Option<String>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let exercise = parse_exercise(&exercise_path)?;
    let level = select_level(&exercise, level.as_deref())?;
    let seed = resolve_seed(seed);

    let instance = instantiate(&exercise, &level.id, seed)?;
    let diagram = render(&instance.visual);
    if diagram.is_empty() {
        tracing::info!(engine = %exercise.visual_engine, "nothing to draw for this level");
    }
    let svg = diagram.to_svg_sized(config.render.canvas_size);

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, svg)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Diagram written to {}", path.display());
        }
        None => print!("{svg}"),
    }

    Ok(())
}
