use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use startpage::app::App;
use startpage::config::Config;
use startpage::{logging, ui};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "startpage")]
#[command(about = "A terminal start page with a random quote, a greeting and a photo backdrop")]
#[command(version)]
struct Cli {
    /// Path to config file (default: <config dir>/startpage/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    write_config: bool,

    /// Fetch everything once, print the page as text and exit
    #[arg(long)]
    print: bool,
}

/// Raw mode and the alternate screen, undone on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path().context("could not determine a config directory")?,
    };

    if cli.write_config {
        Config::default().write(&config_path)?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    let _logging = if cli.print {
        logging::init_stderr()
    } else {
        logging::init()
    };

    let config = Config::load(&config_path)?;
    let mut app = App::new(config)?;

    if cli.print {
        app.init();
        app.settle().await;
        print!("{}", ui::plain_text(app.document()));
        return Ok(());
    }

    logging::install_panic_hook(restore_terminal);
    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = app.run(&mut terminal);

    drop(terminal);
    drop(guard);
    result
}
