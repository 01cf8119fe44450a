use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use fctap::{
    app::{App, AppAction},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    context::{open_store, GameContext},
    frame::{self, FrameState},
    identity::{ChainedIdentity, EnvIdentity, FixedIdentity},
    platform::TerminalPlatform,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    store::{ComparisonKey, SqliteScoreStore},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 50;
const DEFAULT_LOG_FILTER: &str = "fctap=info";

/// tap as fast as you can before the clock runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed tapping game: tap any key as fast as you can, get ranked on your taps per second, and chase your personal best on the local leaderboard."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// player id scores are filed under (defaults to $FCTAP_PLAYER, then $USER)
    #[clap(short = 'p', long, env = "FCTAP_PLAYER")]
    player: Option<String>,

    /// length of a round in seconds
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// which figure decides a personal best
    #[clap(short = 'c', long, value_enum)]
    compare: Option<ComparisonKey>,

    /// number of leaderboard rows to show
    #[clap(short = 't', long)]
    top: Option<usize>,

    /// path of the score database
    #[clap(long)]
    db: Option<PathBuf>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// answer one press of the static frame counter as JSON
    Frame {
        /// count carried by the previous frame
        #[clap(long, default_value_t = 0)]
        count: u32,

        /// 1-based index of the pressed button (1 tap, 2 reset, 3 link)
        #[clap(long)]
        button: u8,
    },
    /// print the leaderboard and exit
    Leaderboard,
}

impl Cli {
    /// Flags win over the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(player) = self.player.as_ref() {
            config.player_id = Some(player.clone());
        }
        if let Some(secs) = self.secs {
            config.round_secs = secs.max(1);
        }
        if let Some(key) = self.compare {
            config.comparison_key = key;
        }
        if let Some(top) = self.top {
            config.leaderboard_size = top;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    init_logging(cli.command.is_none());

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
        info!(path = %config_store.path().display(), "saved config");
    }

    match cli.command {
        Some(Command::Frame { count, button }) => {
            let reply = frame::respond(FrameState::new(count), button);
            println!("{}", serde_json::to_string(&reply)?);
            Ok(())
        }
        Some(Command::Leaderboard) => print_leaderboard(&config, cli.db.as_deref()),
        None => {
            if !stdin().is_tty() {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
            }
            run_tui(&config, cli.db.as_deref())
        }
    }
}

/// The TUI owns the screen, so its logs go to a file; subcommands log to stderr
fn init_logging(tui: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if !tui {
        builder.with_writer(io::stderr).init();
        return;
    }
    if let Some(file) = AppDirs::log_path().and_then(|path| open_log(&path).ok()) {
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        return;
    }
    builder.with_writer(io::sink).init();
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn print_leaderboard(config: &Config, db: Option<&Path>) -> Result<(), Box<dyn Error>> {
    use fctap::store::ScoreStore;

    let store = match db {
        Some(path) => SqliteScoreStore::open(path)?,
        None => SqliteScoreStore::open_default()?,
    };
    let key = config.comparison_key;
    let records = store.get_top_n(config.leaderboard_size, key)?;

    if records.is_empty() {
        println!("no scores yet");
        return Ok(());
    }
    println!("leaderboard (by {})", key);
    for (i, record) in records.iter().enumerate() {
        println!(
            "{:>3}. {:<20} {:>5} taps {:>7.2} taps/s{}",
            i + 1,
            record.player_id,
            record.best_taps,
            record.best_tps,
            if record.flagged { "  (flagged)" } else { "" }
        );
    }
    Ok(())
}

fn run_tui(config: &Config, db: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let identity = ChainedIdentity(vec![
        Box::new(FixedIdentity(config.player_id.clone())),
        Box::new(EnvIdentity),
    ]);
    let context = GameContext::new(
        config,
        Box::new(identity),
        open_store(db),
        TerminalPlatform::new(),
    );
    let mut app = App::new(config, context);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.context.platform_mut().mark_ready();
    info!(player = ?app.context.player_id(), "terminal ready");

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    for line in app.context.platform_mut().take_shared() {
        println!("{}", line);
    }

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<TerminalPlatform>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            GameEvent::Tick => app.on_tick(Instant::now()),
            GameEvent::Resize => debug!("resize"),
            GameEvent::Closed => {
                warn!("terminal input closed, leaving");
                return Err("terminal input closed".into());
            }
            GameEvent::Key(key) => {
                if app.handle_key(key, Instant::now()) == AppAction::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_config_alone() {
        let cli = Cli::try_parse_from(["fctap"]).unwrap();
        assert_eq!(cli.command, None);
        let config = cli.apply(Config::default());
        assert_eq!(config.round_secs, 15);
        assert_eq!(config.comparison_key, ComparisonKey::Taps);
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "fctap", "--player", "ada", "--secs", "30", "--compare", "tps", "--top", "3",
        ])
        .unwrap();
        let config = cli.apply(Config::default());
        assert_eq!(config.player_id.as_deref(), Some("ada"));
        assert_eq!(config.round_secs, 30);
        assert_eq!(config.comparison_key, ComparisonKey::Tps);
        assert_eq!(config.leaderboard_size, 3);
    }

    #[test]
    fn zero_second_rounds_are_clamped() {
        let cli = Cli::try_parse_from(["fctap", "--secs", "0"]).unwrap();
        assert_eq!(cli.apply(Config::default()).round_secs, 1);
    }

    #[test]
    fn frame_subcommand() {
        let cli = Cli::try_parse_from(["fctap", "frame", "--count", "4", "--button", "1"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Frame {
                count: 4,
                button: 1
            })
        );
    }

    #[test]
    fn frame_requires_button() {
        assert!(Cli::try_parse_from(["fctap", "frame"]).is_err());
    }

    #[test]
    fn unknown_compare_key_is_rejected() {
        assert!(Cli::try_parse_from(["fctap", "--compare", "speed"]).is_err());
    }
}
