use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use fltconf::engine::file::FileFilterEngine;
use fltconf::menu::controller::FilterMenu;
use fltconf::menu::terminal::{TerminalMenu, TerminalSession};
use fltconf::menu::{StatusDisplay, StatusRow};
use fltconf::models::config::{AppConfig, DEFAULT_FILTER_DIR, DEFAULT_LOCK_DIR, DEFAULT_STATE_FILE};
use fltconf::utils::logging;
use fltconf::{FilterState, FilterStore};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Configure display of ARP, RARP and other non-IP packets")]
struct Args {
    /// Persisted filter state file
    #[clap(long, default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    /// Directory shared by all instances for lock markers
    #[clap(long, default_value = DEFAULT_LOCK_DIR)]
    lock_dir: PathBuf,

    /// Directory of saved IP filter rule sets
    #[clap(long, default_value = DEFAULT_FILTER_DIR)]
    filter_dir: PathBuf,

    /// Print the saved filter state and exit
    #[clap(long)]
    show: bool,

    /// Print the saved filter state as JSON (with --show)
    #[clap(long, requires = "show")]
    json: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logger(logging::get_log_level(&args.log_level));

    info!("Starting fltconf v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig {
        state_file: args.state_file,
        lock_dir: args.lock_dir,
        filter_dir: args.filter_dir,
    };
    let store = FilterStore::from_config(&config);

    if args.show {
        let mut engine = FileFilterEngine::new(config.filter_dir.clone(), TerminalMenu::plain("Select IP Filter"));
        let loaded = store.load(&mut engine);
        if let Some(err) = &loaded.resolve_error {
            warn!("{}", err);
        }
        if args.json {
            println!("{}", serde_json::to_string_pretty(&loaded.state.status())?);
        } else {
            print_status(&loaded.state)?;
        }
        return Ok(());
    }

    configure(&config, &store)
}

/// Interactive session: load, edit, save
fn configure(config: &AppConfig, store: &FilterStore) -> Result<()> {
    let _session = TerminalSession::start().context("Unable to initialise the terminal")?;

    let mut screen = TerminalMenu::with_status("Filter Menu");
    let mut engine = FileFilterEngine::new(config.filter_dir.clone(), TerminalMenu::plain("Select IP Filter"));

    let loaded = store.load(&mut engine);
    let mut state = loaded.state;
    if let Some(err) = loaded.resolve_error {
        screen.notify(&err.to_string())?;
    }

    FilterMenu::new(&mut screen, &mut engine)
        .run(&mut state)
        .context("Filter menu failed")?;

    if let Err(e) = store.save(&state) {
        warn!("Filter state not saved: {}", e);
        screen.notify(&e.to_string())?;
    }

    Ok(())
}

/// Print each status line, coloured by visibility
fn print_status(state: &FilterState) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    for row in StatusRow::ALL {
        let enabled = match row {
            StatusRow::IpFilter => state.ip_filter_active(),
            StatusRow::Arp => state.arp,
            StatusRow::Rarp => state.rarp,
            StatusRow::NonIp => state.non_ip,
        };
        let color = if enabled { Color::Green } else { Color::Red };

        stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(stdout, "{}", row.label(state))?;
        stdout.reset()?;

        match (row, state.ip_filter_name()) {
            (StatusRow::IpFilter, Some(name)) => writeln!(stdout, " ({})", name)?,
            _ => writeln!(stdout)?,
        }
    }

    Ok(())
}
