use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::segment::SegmentMode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest a directory of papers into a named index.
    Ingest {
        /// Directory to scan recursively for PDF files.
        dir: PathBuf,

        /// Name of the index to create or extend.
        #[clap(short, long)]
        index: String,

        /// Segmentation strategy; defaults to the configured one.
        #[clap(long, value_enum)]
        mode: Option<SegmentMode>,

        /// Also write the plain-text record dump to this file.
        #[clap(long)]
        export: Option<PathBuf>,
    },

    /// Query a named index by similarity.
    Query {
        /// Query text.
        text: String,

        /// Name of the index to query.
        #[clap(short, long)]
        index: String,

        /// Number of results.
        #[clap(short = 'k', long, default_value_t = crate::store::DEFAULT_TOP_K)]
        top_k: usize,
    },

    /// Manage stored prompt templates.
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum PromptAction {
    /// List the templates of a category.
    List {
        #[clap(default_value = crate::prompts::METADATA_CATEGORY)]
        category: String,
    },

    /// Print one template.
    Show {
        category: String,
        index: usize,
    },

    /// Append a template to a category.
    Add {
        category: String,
        template: String,
    },

    /// Replace the template at an index.
    Edit {
        category: String,
        index: usize,
        template: String,
    },

    /// Delete the template at an index.
    Delete {
        category: String,
        index: usize,
    },
}
