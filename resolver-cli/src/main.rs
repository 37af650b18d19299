mod cli;
mod commands;
mod config;
mod error;
mod output;

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    config::AppConfig,
    error::Result,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use std::process;
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!("Application error: {}", e);
        #[cfg(feature = "colored-output")]
        {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        #[cfg(not(feature = "colored-output"))]
        {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    // Load configuration
    let config = AppConfig::load(args.config.as_deref())?;
    debug!("Starting sresolve with config: {:?}", config);

    match args.command {
        Commands::Resolve {
            url,
            output,
            output_file,
        } => {
            let output = output.unwrap_or(config.default_output_format);
            let transport = config.transport_config(
                args.timeout,
                args.proxy,
                args.proxy_username,
                args.proxy_password,
            );
            CommandExecutor::new(config, transport)?
                .resolve_single(&url, output_file.as_deref(), output)
                .await?;
        }

        Commands::Batch {
            input,
            output_dir,
            output_format,
            max_concurrent,
        } => {
            let max_concurrent = max_concurrent.unwrap_or(config.max_concurrent);
            let transport = config.transport_config(
                args.timeout,
                args.proxy,
                args.proxy_username,
                args.proxy_password,
            );
            CommandExecutor::new(config, transport)?
                .batch_process(&input, output_dir.as_deref(), max_concurrent, output_format)
                .await?;
        }

        Commands::Sites { detailed, output } => {
            let output = output.unwrap_or(config.default_output_format);
            let transport = config.transport_config(args.timeout, None, None, None);
            CommandExecutor::new(config, transport)?.list_sites(detailed, output)?;
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }

        Commands::Config { show, reset } => {
            if reset {
                AppConfig::reset(args.config.as_deref())?;
                println!("✓ Configuration reset to defaults");
            } else if show {
                println!("{}", config.show()?);
            } else {
                println!(
                    "Use --show to display current configuration or --reset to reset to defaults"
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .with(filter)
        .init();
}
