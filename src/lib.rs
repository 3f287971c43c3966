pub mod cli;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod fuzzy;
pub mod io_utils;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

pub use crate::{
    dataset::{Dataset, Row},
    error::{InsightError, SchemaError},
    filter::{FilterOptions, FilterSpec},
    metrics::{Insight, MetricsResult},
    pipeline::{DashboardView, Session},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("ticket_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Summary(args) => commands::summary(&args),
        Commands::Filter(args) => commands::filter(&args),
        Commands::Search(args) => commands::search(&args),
        Commands::Options(args) => commands::options(&args),
    }
}
