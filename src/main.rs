use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use literacy_allocator::allocation::{AllocationMode, AllocationPlan, PhasedPlan};
use literacy_allocator::config::{Config, ConfigOverrides};
use literacy_allocator::dataset::Dataset;
use literacy_allocator::effectiveness::{rank, CostEffectivenessRank};
use literacy_allocator::index::{relative_need, CompositeScore};
use literacy_allocator::output::csv::{
    allocation_to_csv, outlook_to_csv, phases_to_csv, projection_to_csv, rankings_to_csv,
    scores_to_csv,
};
use literacy_allocator::output::render_json;
use literacy_allocator::output::table::{
    render_allocation_table, render_outlook_table, render_phases_table,
    render_projection_table, render_rankings_table, render_scores_table,
    render_sources_table, render_summary_table,
};
use literacy_allocator::projection::{project, Outlook, ProjectionResult};
use literacy_allocator::report::{self, ExecutiveSummary};
use literacy_allocator::server::run_server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "literacy-allocator",
    about = "Literacy need index, budget allocation and trend projection"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory with indicators.csv, series.csv, programs.csv and needs.csv.
    #[arg(short, long = "data-dir")]
    data_dir: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Need index per country, highest first.
    Scores,
    /// Split the budget across countries.
    Allocate {
        #[arg(long)]
        budget: Option<f64>,
        #[arg(long)]
        mode: Option<AllocationMode>,
        #[arg(long)]
        precision: Option<u32>,
        /// Also split each allocation into phase 1 and phase 2.
        #[arg(long)]
        phases: bool,
    },
    /// Before/after trend projection with counterfactual.
    Project {
        #[arg(long)]
        country: String,
        #[arg(long = "intervention-year")]
        intervention_year: Option<i32>,
        #[arg(long = "target-year")]
        target_year: Option<i32>,
    },
    /// Projected literacy against the SDG target for every country.
    Outlook,
    /// Programs ranked by cost per outcome point.
    Rank,
    Summary,
    /// List where each input table was loaded from.
    Sources,
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    let mut overrides = ConfigOverrides {
        data_dir: cli.data_dir.clone(),
        ..ConfigOverrides::default()
    };
    match &cli.command {
        Commands::Allocate {
            budget,
            mode,
            precision,
            ..
        } => {
            overrides.total_budget = *budget;
            overrides.allocation_mode = *mode;
            overrides.precision = *precision;
        }
        Commands::Project {
            intervention_year,
            target_year,
            ..
        } => {
            overrides.intervention_year = *intervention_year;
            overrides.target_year = *target_year;
        }
        _ => {}
    }
    config.apply_overrides(overrides);
    config.validate()?;

    if let Commands::Config { init, show } = &cli.command {
        return handle_config_command(*init, *show, &config, &config_path);
    }

    let data_dir = config.resolved_data_dir();
    let dataset = Arc::new(Dataset::load(&data_dir)?);
    if dataset.uses_fallback() {
        warn!(
            data_dir = %data_dir.display(),
            "one or more tables use built-in fallback data"
        );
    }

    match &cli.command {
        Commands::Scores => {
            let scores = report::scores(&dataset, &config)?;
            print_scores(&scores, cli.output)?;
        }
        Commands::Allocate { phases, .. } => {
            if *phases {
                let phased = report::phased_plan(&dataset, &config)?;
                print_phases(&phased, cli.output)?;
            } else {
                let plan = report::allocation_plan(&dataset, &config)?;
                print_allocation(&plan, cli.output)?;
            }
        }
        Commands::Project { country, .. } => {
            let series = dataset
                .series_for(country)
                .ok_or_else(|| anyhow!("no literacy series for {country}"))?;
            let result = project(
                series,
                config.projection.intervention_year,
                config.projection.target_year,
                &config.projection,
            )?;
            print_projection(&result, cli.output)?;
        }
        Commands::Outlook => {
            let outlook = report::outlook(&dataset, &config)?;
            print_outlook(&outlook, cli.output)?;
        }
        Commands::Rank => {
            let ranked = rank(&dataset.programs.data)?;
            print_rankings(&ranked, cli.output)?;
        }
        Commands::Summary => {
            let summary = report::build_summary(&dataset, &config)?;
            print_summary(&summary, cli.output)?;
        }
        Commands::Sources => {
            let sources = dataset.sources();
            match cli.output {
                OutputFormat::Table => println!("{}", render_sources_table(&sources)),
                OutputFormat::Json => println!("{}", render_json(&sources)?),
                OutputFormat::Csv => {
                    warn!("CSV output for sources not implemented, using JSON");
                    println!("{}", render_json(&sources)?);
                }
            }
        }
        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let bind = format!("{host}:{port}");
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            run_server(config, dataset, addr).await?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn handle_config_command(init: bool, show: bool, config: &Config, path: &Path) -> Result<()> {
    if init {
        if path.exists() {
            return Err(anyhow!("config already exists at {}", path.display()));
        }
        Config::write_template(path)?;
        info!("wrote config template to {}", path.display());
    }
    if show || !init {
        println!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

fn print_scores(scores: &[CompositeScore], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", render_scores_table(scores, &relative_need(scores)))
        }
        OutputFormat::Json => println!("{}", render_json(scores)?),
        OutputFormat::Csv => print!("{}", scores_to_csv(scores)?),
    }
    Ok(())
}

fn print_allocation(plan: &AllocationPlan, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_allocation_table(plan)),
        OutputFormat::Json => println!("{}", render_json(plan)?),
        OutputFormat::Csv => print!("{}", allocation_to_csv(plan)?),
    }
    Ok(())
}

fn print_phases(phased: &PhasedPlan, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", render_phases_table(phased));
            println!("phase 2 trigger: {}", phased.summary.trigger);
        }
        OutputFormat::Json => println!("{}", render_json(phased)?),
        OutputFormat::Csv => print!("{}", phases_to_csv(phased)?),
    }
    Ok(())
}

fn print_projection(result: &ProjectionResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_projection_table(result)),
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Csv => print!("{}", projection_to_csv(result)?),
    }
    Ok(())
}

fn print_outlook(outlook: &Outlook, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_outlook_table(outlook)),
        OutputFormat::Json => println!("{}", render_json(outlook)?),
        OutputFormat::Csv => print!("{}", outlook_to_csv(outlook)?),
    }
    Ok(())
}

fn print_rankings(ranked: &[CostEffectivenessRank], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_rankings_table(ranked)),
        OutputFormat::Json => println!("{}", render_json(ranked)?),
        OutputFormat::Csv => print!("{}", rankings_to_csv(ranked)?),
    }
    Ok(())
}

fn print_summary(summary: &ExecutiveSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_summary_table(summary)),
        OutputFormat::Json => println!("{}", render_json(summary)?),
        OutputFormat::Csv => {
            warn!("CSV output for summary not implemented, using JSON");
            println!("{}", render_json(summary)?);
        }
    }
    Ok(())
}
