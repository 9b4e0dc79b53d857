use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use problemdata::models::ProblemDataConfig;
use problemdata::parser::FragmentPolicy;
use problemdata::services::ProblemQuery;
use problemdata::Result;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "problemdata")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract quiz problems from course problem markup", long_about = None)]
struct Cli {
    /// Config file (default: ./problemdata.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Course directory, overrides [store] course_dir
    #[arg(long, global = true)]
    course_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the problems of a markup file
    Parse {
        /// Markup file
        file: PathBuf,

        /// Declared response kind (repeatable); classified from the markup when omitted
        #[arg(short, long = "kind")]
        kinds: Vec<String>,

        /// Content id (default: file stem)
        #[arg(long)]
        id: Option<String>,

        /// Version token (default: checksum of the markup)
        #[arg(long)]
        version: Option<String>,

        /// Drop malformed fragments instead of failing the document
        #[arg(long)]
        skip_malformed: bool,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Tell whether a markup file holds more than one problem
    Multiple {
        /// Markup file
        file: PathBuf,

        /// Declared response kind (repeatable)
        #[arg(short, long = "kind")]
        kinds: Vec<String>,
    },

    /// Show the response kinds of a markup file
    Classify {
        /// Markup file
        file: PathBuf,
    },

    /// List the problems under a course block
    Problems {
        /// Course key or block usage id
        block_id: String,

        /// Only problems of exactly this kind
        #[arg(short = 't', long = "type")]
        problem_type: Option<String>,

        /// Regular expression matched against the markup
        #[arg(long)]
        text: Option<String>,

        /// Page number, from 1
        #[arg(short, long)]
        page: Option<usize>,

        /// Page size
        #[arg(long)]
        page_size: Option<usize>,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Show the parsed content of problems
    Detail {
        /// Problem usage ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// HTTP server port, overrides [server] port
        #[arg(long)]
        port: Option<u16>,

        /// Bind address, overrides [server] host
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins unless `--verbose` is given
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("problemdata=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("problemdata=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ProblemDataConfig> {
    let mut config = match &cli.config {
        Some(path) if !path.exists() => {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        Some(path) => ProblemDataConfig::load(path)?,
        None => ProblemDataConfig::load_from_dir(&std::env::current_dir()?)?,
    };
    if let Some(dir) = &cli.course_dir {
        config.store.course_dir = dir.clone();
    }
    Ok(config)
}

async fn run_async(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Parse {
            file,
            kinds,
            id,
            version,
            skip_malformed,
            json,
        } => {
            let policy = if skip_malformed {
                FragmentPolicy::Skip
            } else {
                config.parser.fragment_policy
            };
            problemdata::cli::markup::run_parse(
                &file,
                &kinds,
                id.as_deref(),
                version.as_deref(),
                policy,
                json,
            )?;
        }

        Commands::Multiple { file, kinds } => {
            problemdata::cli::markup::run_multiple(&file, &kinds)?;
        }

        Commands::Classify { file } => {
            problemdata::cli::markup::run_classify(&file)?;
        }

        Commands::Problems {
            block_id,
            problem_type,
            text,
            page,
            page_size,
            json,
        } => {
            let query = ProblemQuery {
                block_id,
                problem_type,
                text,
                page,
                page_size,
            };
            problemdata::cli::problems::run_list(&config, &query, json)?;
        }

        Commands::Detail { ids, json } => {
            problemdata::cli::problems::run_detail(&config, &ids, json)?;
        }

        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            problemdata::cli::server::run(&config).await?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "problemdata", &mut io::stdout());
        }
    }

    Ok(())
}
