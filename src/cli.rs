//! Command line surface of the `structgen` binary.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use tracing::Level;

use crate::batch::{self, BatchConfig, BatchSummary};
use crate::compiler::CompileOptions;
use crate::orientation::{Mirror, Rotation};
use crate::plan::SUPPORTED_BIOMES;
use crate::Result;

/// Compiles JSON structure plans into gzip NBT structure templates
#[derive(Parser, Debug)]
#[command(name = "structgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile every plan under the plan directory
    Compile(CompileArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// Directory holding `<category>/<name>.json` plans
    #[arg(long, default_value = "plans")]
    pub plans: PathBuf,

    /// Directory holding `block_entities/` and `entities/` templates
    #[arg(long, default_value = "templates")]
    pub templates: PathBuf,

    #[arg(long, default_value = "allowlist.json")]
    pub allowlist: PathBuf,

    /// Output directory
    #[arg(long)]
    pub out: PathBuf,

    /// Clockwise rotation in degrees: 0, 90, 180 or 270
    #[arg(long, default_value = "0")]
    pub rotate: Rotation,

    /// none, left_right or front_back
    #[arg(long, default_value = "none")]
    pub mirror: Mirror,

    /// Keep entity payloads in the output
    #[arg(long)]
    pub include_entities: bool,

    /// Biome variant to build, repeatable (default: all)
    #[arg(long = "biome", value_parser = PossibleValuesParser::new(SUPPORTED_BIOMES))]
    pub biomes: Vec<String>,

    /// Parallel compile jobs (default: available cores)
    #[arg(long)]
    pub jobs: Option<NonZeroUsize>,
}

impl From<CompileArgs> for BatchConfig {
    fn from(args: CompileArgs) -> Self {
        BatchConfig {
            plans: args.plans,
            templates: args.templates,
            allowlist: args.allowlist,
            out: args.out,
            options: CompileOptions {
                rotation: args.rotate,
                mirror: args.mirror,
                include_entities: args.include_entities,
            },
            biomes: args.biomes,
            jobs: args.jobs.map_or_else(batch::default_jobs, NonZeroUsize::get),
        }
    }
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }

    pub async fn run(self) -> Result<BatchSummary> {
        match self.command {
            Commands::Compile(args) => batch::run(args.into()).await,
        }
    }
}
