//! rowgraph CLI: write tabular datasets into an RDF graph store.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use miette::Result;

use rowgraph::config::{ConfigOverrides, WriteConfig};
use rowgraph::dataset::load::{self, AttributeDecl};
use rowgraph::error::RowgraphResult;
use rowgraph::store::{HttpGraphStore, MemoryGraphStore};
use rowgraph::writer::{TransactionCoordinator, WriteReport};

#[derive(Parser)]
#[command(name = "rowgraph", version, about = "Write tabular datasets to an RDF graph store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a dataset into a remote graph store in one transaction.
    Write {
        /// TOML config file (url, username, password, graph, namespace).
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        input: DatasetArgs,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Build the graph in memory and print it as N-Quads without writing.
    Preview {
        #[command(flatten)]
        input: DatasetArgs,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the default configuration as TOML.
    Config,
}

#[derive(Args)]
struct DatasetArgs {
    /// Dataset file (.json or .csv).
    #[arg(long)]
    dataset: PathBuf,

    /// CSV column declaration `name:type[:label]`; repeat per column.
    #[arg(long = "column")]
    columns: Vec<AttributeDecl>,
}

#[derive(Args)]
struct Overrides {
    /// Database endpoint URL.
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
    /// Target named graph.
    #[arg(long)]
    graph: Option<String>,
    /// Base namespace for subject and predicate IRIs.
    #[arg(long)]
    namespace: Option<String>,
}

impl From<Overrides> for ConfigOverrides {
    fn from(o: Overrides) -> Self {
        Self {
            url: o.url,
            username: o.username,
            password: o.password,
            graph: o.graph,
            namespace: o.namespace,
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())?;
    Ok(())
}

fn run(cli: Cli) -> RowgraphResult<()> {
    match cli.command {
        Commands::Write {
            config,
            input,
            overrides,
        } => {
            let config = match config {
                Some(path) => WriteConfig::load(&path)?,
                None => WriteConfig::default(),
            };
            let config = config.with_overrides(overrides.into());
            let dataset = load::load(&input.dataset, &input.columns)?;

            let coordinator =
                TransactionCoordinator::new(HttpGraphStore::with_timeout(config.timeout()));
            let report = coordinator.write(&dataset, &config)?;
            print_report(&report);
        }

        Commands::Preview { input, overrides } => {
            let config = WriteConfig::default().with_overrides(overrides.into());
            let dataset = load::load(&input.dataset, &input.columns)?;

            let store = MemoryGraphStore::new()?;
            let coordinator = TransactionCoordinator::new(&store);
            let report = coordinator.write(&dataset, &config)?;

            let graph = config.graph_name()?;
            for quad in store.quads_in(&graph)? {
                println!("{quad} .");
            }
            eprintln!();
            print_report(&report);
        }

        Commands::Config => {
            print!("{}", WriteConfig::default().to_toml()?);
        }
    }

    Ok(())
}

fn print_report(report: &WriteReport) {
    eprintln!(
        "Wrote {} records ({} statements, {} anonymous subjects) to <{}>",
        report.records, report.statements, report.anonymous_subjects, report.graph
    );
}
