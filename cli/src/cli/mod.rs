use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

mod serve;
mod submit;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000/";

#[derive(Subcommand)]
enum Command {
    /// Run the task server
    Serve {
        /// Address to listen on
        #[clap(long, default_value = "0.0.0.0:8000")]
        bind: String,
    },
    /// Submit a task to a running server
    Submit(submit::SubmitArgs),
    /// Show the current state of a task
    Status {
        /// Base URL of the server
        #[clap(long, default_value = DEFAULT_SERVER)]
        server: Url,
        /// Task identifier
        task_id: String,
    },
}

#[derive(Parser)]
#[clap(version, author, about, long_about = None)]
struct Cli {
    /// Enable trace logging
    #[clap(long)]
    trace: bool,
    /// Enable debug logging
    #[clap(long)]
    debug: bool,
    /// Read configuration from this file instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

pub fn exec() {
    let cli = Cli::parse();
    let mut builder = env_logger::Builder::from_default_env();
    builder.format_target(false);

    if cli.trace {
        builder.filter_level(log::LevelFilter::Trace);
    } else if cli.debug {
        builder.filter_level(log::LevelFilter::Debug);
    } else if matches!(cli.command, Command::Serve { .. }) {
        builder.filter_level(log::LevelFilter::Info);
    } else {
        builder
            .format_timestamp(None)
            .format_level(false)
            .filter_level(log::LevelFilter::Warn);
    }

    builder.init();

    let Cli {
        config, command, ..
    } = cli;
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let result = runtime.block_on(async move {
        match command {
            Command::Serve { bind } => serve::serve(config.as_deref(), &bind).await,
            Command::Submit(args) => submit::submit(args).await,
            Command::Status { server, task_id } => submit::status(server, &task_id).await,
        }
    });

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
