use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::*;
use log4rs::{
    append::rolling_file::{
        RollingFileAppender,
        policy::compound::{
            CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
        },
    },
    config::{Appender, Config as LogConfig, Logger, Root},
    encode::pattern::PatternEncoder,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{error::Error, io, path::PathBuf, sync::mpsc};
use tokio::time::Instant;
use trackside::{
    APP_NAME,
    app::{self, App},
    behavior::{PerformanceProfile, UiMode, UserContext},
    config::Config,
    health,
};

const LOG_FILE_NAME: &str = "trackside-log";

#[derive(Parser, Debug)]
#[command(name = APP_NAME, version, about = "Live scorekeeping for the team bench")]
struct Cli {
    /// Increase the log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory within which log files will be stored
    #[arg(long)]
    log_location: Option<PathBuf>,

    /// Max size of a single log file (in bytes)
    #[arg(long, default_value_t = 5_000_000)]
    log_max_file_size: u64,

    /// Number of archived logs to keep
    #[arg(long, default_value_t = 3)]
    num_old_logs: u32,

    /// Start in one-handed mode
    #[arg(long)]
    one_handed: bool,

    /// Override the remote score server's base URL
    #[arg(long)]
    base_url: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    let log_level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let log_base_path = args.log_location.unwrap_or_else(|| {
        let mut path = directories::BaseDirs::new()
            .map(|dirs| dirs.data_local_dir().to_path_buf())
            .unwrap_or_default();
        path.push("trackside-logs");
        path
    });
    let mut log_path = log_base_path.clone();
    log_path.push(format!("{LOG_FILE_NAME}.txt"));
    let mut archived_log_path = log_base_path.clone();
    archived_log_path.push(format!("{LOG_FILE_NAME}-{{}}.txt.gz"));

    let roller = FixedWindowRoller::builder().build(
        archived_log_path
            .as_os_str()
            .to_str()
            .ok_or("Invalid log location")?,
        args.num_old_logs,
    )?;
    let file_policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(args.log_max_file_size)),
        Box::new(roller),
    );
    // The terminal is in raw mode while the app runs, so everything goes to
    // the file appender
    let file_appender = RollingFileAppender::builder()
        .append(true)
        .encoder(Box::new(PatternEncoder::new("[{d} {l:5} {M}] {m}{n}")))
        .build(log_path, Box::new(file_policy))?;

    let log_config = LogConfig::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .logger(Logger::builder().build(APP_NAME, log_level))
        .logger(Logger::builder().build("trackside_core", log_level))
        .build(Root::builder().appender("file").build(LevelFilter::Error))?;
    log4rs::init_config(log_config)?;
    log_panics::init();

    info!("Starting trackside");

    let config: Config = match confy::load(APP_NAME, None) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to read the settings file: {e}. Using defaults");
            let config = Config::default();
            if let Err(e) = confy::store(APP_NAME, None, &config) {
                warn!("Could not write the default settings: {e}");
            }
            config
        }
    };

    let data_dir = directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut remote = config.remote.clone();
    if let Some(base_url) = args.base_url {
        remote.base_url = base_url;
    }
    let (health_tx, health_rx) = mpsc::channel();
    health::spawn_poller(remote, health_tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let mut user = UserContext::detect(
        size.width,
        args.one_handed || config.display.one_handed,
        config.feedback.haptics_enabled,
        config.feedback.sound_enabled,
    );
    user.reduced_motion = config.display.reduced_motion;

    // Tick at the fastest rate any mode asks for; slower modes skip redraws
    let tick_ms = enum_iterator::all::<UiMode>()
        .map(|mode| PerformanceProfile::for_mode(mode).tick_ms)
        .min()
        .unwrap_or(100);
    let events = app::spawn_event_threads(tick_ms, health_rx);

    let mut app = App::new(config, user, data_dir, Instant::now());
    let result = app::run(&mut terminal, &mut app, &events);
    app.shutdown(Instant::now());

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        error!("Exited with an error: {e}");
        return Err(e);
    }
    info!("Exiting");
    Ok(())
}
