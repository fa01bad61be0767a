//! `hexvote predict`: one-shot classification with no learning state.

use hexvote_core::{Engine, Reply};

pub fn run(token: &str, config_path: Option<&str>, json: bool) {
    let mut engine = Engine::new(super::load_engine_config(config_path));
    let normalized = token.trim().to_lowercase();

    let prediction = match engine.submit(0, &normalized) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&prediction) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: cannot encode prediction: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("{}", Reply::Prediction(prediction.clone()).render());
    println!();
    println!("  {:<22} {:>5}", "Predictor", "Vote");
    println!("  {}", "-".repeat(28));
    for (p, vote) in &prediction.votes {
        println!("  {:<22} {:>5}", p.name(), vote.label());
    }
}
