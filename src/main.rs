use anyhow::Result;
use clap::{Parser, Subcommand};
use mobscan::{active_plugins, output, scan_package, Config, Error};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes for shell integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const NOT_AN_ARCHIVE: u8 = 2;
    pub const UNRECOGNIZED_PACKAGE: u8 = 3;
}

#[derive(Parser)]
#[command(name = "mobscan")]
#[command(
    author,
    version,
    about = "Static analysis scanner for Android and iOS application packages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the provided APK or IPA file for vulnerabilities
    Scan {
        /// Path to the package file
        file: PathBuf,

        /// Enable online tests (network probes against derived endpoints)
        #[arg(long)]
        online: bool,
    },

    /// List supported plugins
    List,

    /// Display the current version
    Version,

    /// Show or create the config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { file, online } => {
            let config = Config::load().unwrap_or_default();
            let online = online || config.online;
            match scan_package(&file, &config, online).await {
                Ok(report) => {
                    output::print_report(&report);
                    Ok(exit_codes::SUCCESS)
                }
                Err(Error::NotAnArchive { .. }) => {
                    eprintln!(
                        "ERROR: Unable to open file - please check to make sure it is an APK \
                         or IPA file"
                    );
                    Ok(exit_codes::NOT_AN_ARCHIVE)
                }
                Err(Error::UnrecognizedPackage) => {
                    eprintln!(
                        "ERROR: Unable to identify the file as an Android or iOS application"
                    );
                    Ok(exit_codes::UNRECOGNIZED_PACKAGE)
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::List => {
            let config = Config::load().unwrap_or_default();
            output::print_plugin_list(&active_plugins(&config));
            Ok(exit_codes::SUCCESS)
        }
        Commands::Version => {
            println!("mobscan v{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{content}");
    } else {
        println!("No config file found.");
        println!("Run 'mobscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
