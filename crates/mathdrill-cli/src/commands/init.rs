//! The `mathdrill init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create mathdrill.toml
    if std::path::Path::new("mathdrill.toml").exists() {
        println!("mathdrill.toml already exists, skipping.");
    } else {
        std::fs::write("mathdrill.toml", SAMPLE_CONFIG)?;
        println!("Created mathdrill.toml");
    }

    // Create example exercise
    std::fs::create_dir_all("exercises")?;
    let example_path = std::path::Path::new("exercises/example.json");
    if example_path.exists() {
        println!("exercises/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_EXERCISE)?;
        println!("Created exercises/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: mathdrill validate --exercise exercises/example.json");
    println!("  2. Run: mathdrill generate --exercise exercises/example.json --seed 1");
    println!("  3. Run: mathdrill render --exercise exercises/example.json --output example.svg");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# mathdrill configuration

[scoring]
scale = 20.0
non_evaluated_points = 0.0
precision = 1

[store]
type = "file"
dir = "./mathdrill-results"

[render]
canvas_size = 300.0
"#;

const EXAMPLE_EXERCISE: &str = r#"{
  "id": "angles-complementary",
  "title": "Complementary angles",
  "visual_engine": "ANGLES",
  "visual_config": {
    "mode": "COMPLEMENTARY",
    "labels": { "b": "?" }
  },
  "levels": {
    "1": {
      "variables": { "a": "randint(20, 70)" },
      "question": "Two complementary angles: one measures {a}°. How much does the other measure?",
      "explanation": "90 - {a} = {90 - a}",
      "response_type": "NUMERIC",
      "correct_answer": "{90 - a}",
      "xp": 5,
      "visual_config": { "angle": "{a}", "labels": { "a": "{a}°", "b": "?" } }
    }
  }
}
"#;
