//! Outline generation handler
//!
//! Requests an outline per question from `/generate-outline` and prints the
//! results, keeping per-question failures independent.

use crate::client::HttpBackend;
use crate::config::Config;
use crate::error::{FolioError, Result};
use colored::Colorize;

/// Generate and print outlines for a set of questions
pub async fn run_outline(config: &Config, folder: &str, questions: Vec<String>) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;

    println!(
        "Generating {} outline(s) from \"{}\"...\n",
        questions.len(),
        folder
    );
    let batch = backend.generate_outline(&questions, folder).await?;

    if let Some(error) = batch.error {
        return Err(FolioError::Backend(error).into());
    }

    for entry in batch.outlines {
        println!("{}", entry.question.bold());
        match (&entry.outline, &entry.error) {
            (Some(outline), _) => {
                println!("{}", outline);
                if let Some(chunks_used) = entry.chunks_used {
                    println!("{}", format!("({} chunks consulted)", chunks_used).dimmed());
                }
            }
            (None, Some(error)) => println!("{}", format!("Failed: {}", error).red()),
            (None, None) => println!("{}", "No outline returned.".yellow()),
        }
        println!();
    }

    Ok(())
}
