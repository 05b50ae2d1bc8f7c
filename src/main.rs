use anyhow::Context;
use clap::Parser;

mod citation;
mod clean;
mod cli;
mod config;
mod extractor;
mod loader;
mod pipeline;
mod prompts;
mod records;
mod section;
mod segment;
mod store;

use cli::{Args, Command, PromptAction};
use config::Config;
use extractor::ChatCompletionExtractor;
use loader::PdfLoader;
use pipeline::Pipeline;
use prompts::PromptStore;
use store::{ContentAddressedStore, FastembedEmbedder};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load();

    match args.command {
        Command::Ingest {
            dir,
            index,
            mode,
            export,
        } => {
            let endpoint = config
                .extractor
                .endpoint
                .clone()
                .context("extractor.endpoint is not configured")?;
            let api_key = config.api_key().with_context(|| {
                format!("API key env var {} is not set", config.extractor.api_key_env)
            })?;

            let prompt_store = PromptStore::load(&config.prompts_path())?;
            let prompt = prompt_store
                .get(prompts::METADATA_CATEGORY, 0)
                .unwrap_or(extractor::DEFAULT_METADATA_PROMPT)
                .to_string();

            let extractor =
                ChatCompletionExtractor::new(&endpoint, &config.extractor.model, &api_key, &prompt)?;
            let loader = PdfLoader;
            let mode = mode.unwrap_or(config.segment_mode);

            let pipeline = Pipeline::new(
                &loader,
                &extractor,
                mode,
                config.self_citation_threshold,
            );

            let mut records = Vec::new();
            let report = pipeline.run(&dir, &mut records)?;

            if let Some(path) = export {
                let mut file = std::fs::File::create(&path)?;
                pipeline::export_records(&records, &mut file)?;
                log::info!("Exported {} records to {}", records.len(), path.display());
            }

            let embedder =
                FastembedEmbedder::new(&config.embedding.model, config.base_path().to_path_buf())?;
            let mut store =
                ContentAddressedStore::open(embedder, config.databases_root(), &index)?;

            let mut inserted = 0usize;
            let mut deduplicated = 0usize;
            for record in &records {
                let outcome = store.upsert(&record.sentence, &record.metadata)?;
                if outcome.inserted {
                    inserted += 1;
                } else {
                    deduplicated += 1;
                }
            }
            store.save(&index)?;

            println!(
                "Processed {} documents ({} skipped, {} other files), {} records: {} new, {} already indexed",
                report.processed.len(),
                report.skipped.len(),
                report.other_files,
                report.records_emitted,
                inserted,
                deduplicated,
            );

            if !report.skipped.is_empty() {
                for (path, err) in &report.skipped {
                    eprintln!("skipped {}: {}", path.display(), err);
                }
            }
        }

        Command::Query { text, index, top_k } => {
            let embedder =
                FastembedEmbedder::new(&config.embedding.model, config.base_path().to_path_buf())?;
            let store = ContentAddressedStore::open(embedder, config.databases_root(), &index)?;

            let hits = store.query(&text, top_k)?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }

        Command::Prompt { action } => {
            let mut prompt_store = PromptStore::load(&config.prompts_path())?;

            match action {
                PromptAction::List { category } => {
                    for (index, entry) in prompt_store.list(&category).iter().enumerate() {
                        println!("[{}] {}", index, entry.template);
                    }
                }
                PromptAction::Show { category, index } => {
                    println!("{}", prompt_store.get(&category, index)?);
                }
                PromptAction::Add { category, template } => {
                    prompt_store.add(&category, &template)?;
                    println!("Prompt added to category '{}'", category);
                }
                PromptAction::Edit {
                    category,
                    index,
                    template,
                } => {
                    prompt_store.edit(&category, index, &template)?;
                    println!("Prompt {} in category '{}' updated", index, category);
                }
                PromptAction::Delete { category, index } => {
                    prompt_store.delete(&category, index)?;
                    println!("Prompt {} deleted from category '{}'", index, category);
                }
            }
        }
    }

    Ok(())
}
