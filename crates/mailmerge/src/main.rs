//! `mailmerge` - merge comma or tab separated rows into email messages.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mailmerge_core::{ErrorPolicy, MergeConfig, Output, parse_pair};
use mailmerge_tabular::TabularReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mailmerge")]
#[command(about = "Merge tabular data into email messages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one message per row and deliver it
    Run(RunArgs),

    /// Show the detected dialect, header and row count of an input file
    Inspect {
        /// Comma or tab separated input file
        #[arg(short, long)]
        tabular_file: PathBuf,

        /// Rows parsed ahead during dialect detection
        #[arg(long)]
        lookahead: Option<usize>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON config file; command line options take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma or tab separated input file
    #[arg(short, long)]
    tabular_file: Option<PathBuf>,

    /// Message template: headers, a blank line, then the body
    #[arg(long)]
    template_file: Option<PathBuf>,

    /// Named value overriding a column, as key=value (repeatable)
    #[arg(long = "nv", value_name = "KEY=VALUE")]
    named_values: Vec<String>,

    /// Write one .eml file per row into this directory
    #[arg(long, conflicts_with = "mbox")]
    out_dir: Option<PathBuf>,

    /// Write all messages into this mbox file
    #[arg(long)]
    mbox: Option<PathBuf>,

    /// Submit messages to this SMTP server, as host or host:port (port 25
    /// by default)
    #[arg(long, value_name = "HOST[:PORT]", conflicts_with_all = ["out_dir", "mbox"])]
    smtp_server: Option<String>,

    /// SMTP username for PLAIN authentication
    #[arg(long)]
    smtp_user: Option<String>,

    /// SMTP password
    #[arg(long, env = "MAILMERGE_SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,

    /// Connect with TLS instead of upgrading with STARTTLS
    #[arg(long)]
    implicit_tls: bool,

    /// Log failed rows and carry on instead of stopping
    #[arg(long)]
    keep_going: bool,

    /// Merge at most this many rows
    #[arg(long)]
    limit: Option<usize>,

    /// Render and validate without delivering
    #[arg(long)]
    dry_run: bool,

    /// Rows parsed ahead during dialect detection
    #[arg(long)]
    lookahead: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailmerge=info,mailmerge_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Inspect {
            tabular_file,
            lookahead,
        } => inspect(&tabular_file, lookahead),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = build_config(args)?;
    let job = config.job().context("Failed to load template")?;
    let input = open(config.tabular_path()?)?;

    let mut transport = config.output.open().context("Failed to open output")?;
    let report = job.run(input, transport.as_mut())?;

    info!(
        dialect = %report.dialect,
        rows = report.rows,
        delivered = report.delivered,
        failed = report.failed,
        "Done"
    );
    Ok(())
}

/// Loads the config file, if any, and layers command line options on top.
fn build_config(args: RunArgs) -> Result<MergeConfig> {
    let mut config = match &args.config {
        Some(path) => MergeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MergeConfig::default(),
    };

    if let Some(path) = args.tabular_file {
        config.tabular_file = Some(path);
    }
    if let Some(path) = args.template_file {
        config.template_file = Some(path);
    }
    for pair in &args.named_values {
        let (key, value) = parse_pair(pair)?;
        config.overrides.insert(key, value);
    }
    if let Some(path) = args.out_dir {
        config.output = Output::Directory { path };
    } else if let Some(path) = args.mbox {
        config.output = Output::Mbox { path };
    } else if let Some(server) = args.smtp_server {
        config.output = Output::Smtp {
            server,
            username: None,
            password: None,
            implicit_tls: false,
        };
    }
    if let Output::Smtp {
        username,
        password,
        implicit_tls,
        ..
    } = &mut config.output
    {
        if args.smtp_user.is_some() {
            *username = args.smtp_user;
        }
        if args.smtp_password.is_some() {
            *password = args.smtp_password;
        }
        if args.implicit_tls {
            *implicit_tls = true;
        }
    }
    if args.keep_going {
        config.policy = ErrorPolicy::Continue;
    }
    if args.limit.is_some() {
        config.limit = args.limit;
    }
    if args.dry_run {
        config.dry_run = true;
    }
    if let Some(lookahead) = args.lookahead {
        config.lookahead = lookahead;
    }
    Ok(config)
}

fn inspect(path: &Path, lookahead: Option<usize>) -> Result<()> {
    let input = open(path)?;
    let mut reader = match lookahead {
        Some(lookahead) => TabularReader::with_lookahead(input, lookahead)?,
        None => TabularReader::new(input)?,
    };

    let mut rows = 0usize;
    while reader.read()?.is_some() {
        rows += 1;
    }

    println!("dialect: {}", reader.dialect());
    println!("header:  {}", reader.header().join(", "));
    println!("rows:    {rows}");
    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}
