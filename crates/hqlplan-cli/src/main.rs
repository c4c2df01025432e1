//! hqlplan command-line tool
//!
//! Splits polymorphic HQL queries against an entity catalog and explains the
//! resulting query plans.

mod commands;
mod explain;
mod formatter;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use commands::{CommandError, ExplainOptions};
use formatter::OutputFormat;
use hqlplan_core::{PlanConfig, QuerySubstitutions, DEFAULT_PLAN_CACHE_MAX_SIZE};
use tracing_subscriber::EnvFilter;

/// hqlplan command-line tool
#[derive(Parser, Debug)]
#[command(name = "hqlplan")]
#[command(version, about = "Split and explain HQL query plans")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the concrete queries a polymorphic query expands into
    Split {
        /// HQL query
        query: String,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Build a query plan and describe it
    Explain {
        /// HQL query
        query: String,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Build the plan for shallow execution
        #[arg(long)]
        shallow: bool,

        /// Enabled filter (repeatable)
        #[arg(long = "filter", value_name = "NAME")]
        filters: Vec<String>,

        /// Treat the query as a filter over this collection role
        #[arg(long, value_name = "ROLE")]
        collection_role: Option<String>,

        /// Query substitutions, e.g. "true 1, false 0"
        #[arg(long)]
        substitutions: Option<String>,

        /// Plan cache size
        #[arg(long, default_value_t = DEFAULT_PLAN_CACHE_MAX_SIZE)]
        plan_cache_size: usize,
    },
}

/// Options shared by all subcommands.
#[derive(ClapArgs, Debug)]
pub struct CatalogArgs {
    /// Entity catalog (JSON)
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,
}

impl Args {
    /// Plan configuration from the command-line flags.
    pub fn plan_config(&self) -> PlanConfig {
        match &self.command {
            Command::Split { .. } => PlanConfig::default(),
            Command::Explain {
                substitutions,
                plan_cache_size,
                ..
            } => {
                let config = PlanConfig::new().with_plan_cache_max_size(*plan_cache_size);
                match substitutions {
                    Some(text) => config.with_query_substitutions(QuerySubstitutions::parse(text)),
                    None => config,
                }
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hqlplan=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<String, CommandError> {
    let config = args.plan_config();

    match args.command {
        Command::Split { query, catalog } => {
            let formatter = formatter::create_formatter(catalog.format);
            let entities = commands::load_catalog(&catalog.catalog)?;
            commands::split(&query, &entities, &*formatter)
        }
        Command::Explain {
            query,
            catalog,
            shallow,
            filters,
            collection_role,
            ..
        } => {
            let formatter = formatter::create_formatter(catalog.format);
            let entities = commands::load_catalog(&catalog.catalog)?;
            let options = ExplainOptions {
                shallow,
                filters,
                collection_role,
            };
            commands::explain(&query, entities, config, &options, &*formatter)
        }
    }
}
