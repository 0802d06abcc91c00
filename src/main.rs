use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::fs::{self, File};
use std::process;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod address_book;
mod app;
mod config;
mod error;
mod finder;
mod models;
mod selector;
mod ssh_service;
mod table;
mod ui;

use app::{App, Mode, Outcome};
use config::{AppConfig, ConfigManager};
use finder::TerminalFinder;
use ssh_service::InheritedTerminal;

/// Log into a host from your address book.
///
/// With a host number the session opens right away; without one a search
/// over the host table opens first.
#[derive(Parser, Debug)]
#[command(name = "fastssh", version)]
struct Cli {
    /// Config file name, under home directory
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: Option<String>,

    /// Print the host table and exit
    #[arg(short, long, conflicts_with_all = ["index", "print_script"])]
    list: bool,

    /// Print the login script for the host instead of running it
    #[arg(long, requires = "index")]
    print_script: bool,

    /// Host number as shown in the table
    index: Option<usize>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        tracing::error!("{:#}", err);
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging().context("Failed to set up logging")?;
    debug!("Starting with {:?}", cli);

    let home = dirs::home_dir().context("get home dir failed")?;
    let config_manager = ConfigManager::new().context("Failed to initialize config manager")?;
    let settings = config_manager
        .load_settings()
        .context("Failed to load settings")?;
    debug!("Settings loaded from {:?}", config_manager.settings_path());
    let config = AppConfig::resolve(&home, &settings, cli.file.as_deref());
    debug!("Resolved config: {:?}", config);

    let mut app = App::new(config, TerminalFinder, InheritedTerminal)?;
    debug!("{} hosts available", app.records().len());

    if cli.list {
        print!("{}", app.table());
        return Ok(());
    }

    if let (true, Some(index)) = (cli.print_script, cli.index) {
        print!("{}", app.script_for(index)?);
        return Ok(());
    }

    let mode = cli.index.map_or(Mode::Interactive, Mode::Direct);
    match app.run(mode)? {
        Outcome::NoSelection => println!("no host selected"),
        Outcome::Finished { host, exit } => debug!("Session for {} returned {:?}", host, exit),
    }
    Ok(())
}

fn init_logging() -> Result<()> {
    let log_dir = dirs::cache_dir()
        .context("Could not find cache directory")?
        .join("fastssh")
        .join("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    let log_file = log_dir.join(format!(
        "fastssh_{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    let file = File::create(&log_file)?;

    fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(EnvFilter::from_default_env().add_directive("fastssh=debug".parse()?))
        .with_ansi(false)
        .with_writer(file)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_means_search() {
        let cli = Cli::try_parse_from(["fastssh"]).unwrap();
        assert_eq!(cli.index, None);
        assert_eq!(cli.file, None);
        assert!(!cli.list);
    }

    #[test]
    fn file_flag_and_index() {
        let cli = Cli::try_parse_from(["fastssh", "-f", ".work_hosts", "2"]).unwrap();
        assert_eq!(cli.file.as_deref(), Some(".work_hosts"));
        assert_eq!(cli.index, Some(2));
    }

    #[test]
    fn non_numeric_index_is_rejected() {
        assert!(Cli::try_parse_from(["fastssh", "web"]).is_err());
    }

    #[test]
    fn print_script_needs_an_index() {
        assert!(Cli::try_parse_from(["fastssh", "--print-script"]).is_err());
        assert!(Cli::try_parse_from(["fastssh", "--print-script", "1"]).is_ok());
        assert!(Cli::try_parse_from(["fastssh", "--list", "1"]).is_err());
    }
}
