//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter::JsonFileAdapter;
use crate::adapters::json_render_adapter::JsonRenderAdapter;
use crate::adapters::svg_render_adapter::SvgRenderAdapter;
use crate::domain::config_validation::{
    parse_optional_date, validate_data_config, validate_session_config,
};
use crate::domain::error::TraderError;
use crate::domain::money::Cash;
use crate::domain::portfolio::PortfolioSummary;
use crate::domain::price_series::PriceSeries;
use crate::domain::reveal_window::WindowMode;
use crate::domain::seed::{default_symbols, random_seed};
use crate::domain::session::{
    Command as SessionCommand, DEFAULT_INITIAL_REVEAL, DEFAULT_MA_PERIODS,
    DEFAULT_STARTING_CAPITAL, DEFAULT_WINDOW_PRESETS, Outcome, SessionConfig, SessionController,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, FetchRequest};
use crate::ports::render_port::RenderPort;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser, Debug)]
#[command(name = "tradetrainer", about = "Paper-trading practice on historical prices")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. `info`, `tradetrainer=debug`)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a session, reading commands from stdin or a script
    Play {
        #[arg(short, long)]
        config: PathBuf,
        /// Price file or directory, overriding `[data] path`
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        script: Option<PathBuf>,
        /// Rewrite this SVG chart after every change
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// Print the chart snapshot for a price file as JSON
    Snapshot {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        reveal: Option<usize>,
        /// `all` or a bar count
        #[arg(long)]
        window: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show bar count and date range of a price file
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Pick a random symbol and two-year date range
    Seed {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Command {
    fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Play { config, .. } => Some(config),
            Command::Snapshot { config, .. } | Command::Seed { config } => config.as_ref(),
            Command::Info { .. } => None,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Play {
            config,
            data,
            symbol,
            script,
            svg,
        } => run_play(
            &config,
            data.as_deref(),
            symbol.as_deref(),
            script.as_deref(),
            svg,
        ),
        Command::Snapshot {
            data,
            symbol,
            reveal,
            window,
            config,
        } => run_snapshot(
            &data,
            symbol.as_deref(),
            reveal,
            window.as_deref(),
            config.as_ref(),
        ),
        Command::Info { data } => run_info(&data),
        Command::Seed { config } => run_seed(config.as_ref()),
    }
}

/// Filter directive for the log subscriber when `RUST_LOG` is unset:
/// `--log-level`, then `[logging] level`, then [`DEFAULT_LOG_LEVEL`].
pub fn log_filter(cli: &Cli) -> String {
    if let Some(level) = &cli.log_level {
        return level.clone();
    }
    cli.command
        .config_path()
        .and_then(|path| FileConfigAdapter::from_file(path).ok())
        .and_then(|config| config.get_string("logging", "level"))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn report(err: TraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn build_session_config(config: &dyn ConfigPort) -> Result<SessionConfig, TraderError> {
    validate_session_config(config)?;

    let list = |key: &str, default: &[usize]| -> Vec<usize> {
        match config.get_usize_list("session", key) {
            Some(Ok(values)) => values,
            _ => default.to_vec(),
        }
    };

    Ok(SessionConfig {
        starting_capital: Cash::from_float(config.get_double(
            "session",
            "starting_capital",
            DEFAULT_STARTING_CAPITAL,
        )),
        initial_reveal: config.get_int("session", "initial_reveal", DEFAULT_INITIAL_REVEAL as i64)
            as usize,
        ma_periods: list("ma_periods", &DEFAULT_MA_PERIODS),
        window_presets: list("window_presets", &DEFAULT_WINDOW_PRESETS),
    })
}

pub fn resolve_symbols(config: &dyn ConfigPort) -> Vec<String> {
    match config.get_string("data", "symbols") {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect(),
        None => default_symbols(),
    }
}

/// Symbol and date range for a new session.
///
/// Without a symbol from the command line or `[data] symbol`, both the symbol
/// and the range are drawn at random. A configured symbol without dates
/// fetches everything the source has.
pub fn build_fetch_request<R: rand::Rng>(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
    rng: &mut R,
) -> Result<FetchRequest, TraderError> {
    validate_data_config(config)?;

    let symbol = symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_uppercase());

    let Some(symbol) = symbol else {
        return random_seed(rng, &resolve_symbols(config));
    };

    let mut request = FetchRequest::unbounded(symbol);
    if let Some(start) = parse_optional_date(config, "start_date")? {
        request.start = start;
    }
    if let Some(end) = parse_optional_date(config, "end_date")? {
        request.end = end;
    }
    Ok(request)
}

/// Data port for a single price file, picked by extension.
pub fn file_data_port(path: &Path) -> Box<dyn DataPort> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvAdapter::single_file(path.to_path_buf()))
    } else {
        Box::new(JsonFileAdapter::single_file(path.to_path_buf()))
    }
}

pub fn make_data_port(
    config: &dyn ConfigPort,
    data_override: Option<&Path>,
) -> Result<Box<dyn DataPort>, TraderError> {
    let source = config
        .get_string("data", "source")
        .map(|s| s.to_ascii_lowercase());

    if let Some(path) = data_override {
        if !path.is_dir() {
            return Ok(file_data_port(path));
        }
        return Ok(match source.as_deref() {
            Some("csv") => Box::new(CsvAdapter::new(path.to_path_buf())),
            _ => Box::new(JsonFileAdapter::new(path.to_path_buf())),
        });
    }

    let path = config.get_string("data", "path").map(PathBuf::from);
    match (source.as_deref(), path) {
        (Some("csv"), Some(path)) if path.is_dir() => Ok(Box::new(CsvAdapter::new(path))),
        (Some("json"), Some(path)) if path.is_dir() => Ok(Box::new(JsonFileAdapter::new(path))),
        (Some("csv" | "json"), Some(path)) => Ok(file_data_port(&path)),
        (Some("http"), _) => http_data_port(config),
        (None, Some(path)) => Ok(file_data_port(&path)),
        _ => Err(TraderError::ConfigMissing {
            section: "data".into(),
            key: "source".into(),
        }),
    }
}

#[cfg(feature = "http")]
fn http_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, TraderError> {
    use crate::adapters::http_adapter::{DEFAULT_BASE_URL, HttpAdapter};

    let base_url = config
        .get_string("data", "base_url")
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    Ok(Box::new(HttpAdapter::new(&base_url)?))
}

#[cfg(not(feature = "http"))]
fn http_data_port(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, TraderError> {
    Err(TraderError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "http source requires the `http` feature".into(),
    })
}

pub fn format_summary(summary: &PortfolioSummary) -> String {
    format!(
        "capital {} | units {} | value {} | total {} | return {:+.2}%",
        summary.capital, summary.units, summary.value, summary.total_asset, summary.return_pct
    )
}

fn status_line(controller: &SessionController) -> Result<String, TraderError> {
    let state = controller.state().ok_or_else(|| TraderError::SessionNotReady {
        reason: "no session loaded".into(),
    })?;
    let bar = state.boundary_bar()?;
    Ok(format!(
        "{} {} close {:.2} | bar {}/{} | window {} | {}",
        state.series().symbol(),
        bar.label(),
        bar.close,
        state.window().current_index(),
        state.window().len(),
        state.window().mode(),
        format_summary(&state.summary())
    ))
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Advanced { boundary, date } => {
            format!("advanced to {} (bar {})", date, boundary + 1)
        }
        Outcome::Filled(fill) => format!(
            "{} {} @ {} = {}",
            fill.side, fill.units, fill.price, fill.amount
        ),
        Outcome::WindowChanged { mode, range } => {
            format!("window {}: bars {}..{}", mode, range.start, range.end)
        }
    }
}

fn help_text(config: &SessionConfig) -> String {
    let presets: Vec<String> = config.window_presets.iter().map(|p| p.to_string()).collect();
    format!(
        "commands: next | buy <n|all|1/2|1/3|1/4> | sell <n|all|1/2|1/3|1/4> | \
         window <all|{}> | status | chart | quit",
        presets.join("|")
    )
}

/// Read commands line by line and apply them to the session.
///
/// Recoverable errors (rejected trades, bad input, end of data) are written to
/// `out` and the loop continues; anything else stops it. Ends at EOF or
/// `quit` and returns the final summary.
pub fn run_commands<R: BufRead, W: Write>(
    controller: &mut SessionController,
    input: R,
    out: &mut W,
    mut render: Option<&mut dyn RenderPort>,
) -> Result<PortfolioSummary, TraderError> {
    if let Some(r) = render.as_deref_mut() {
        r.render(&controller.snapshot()?)?;
    }

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.to_ascii_lowercase().as_str() {
            "quit" | "q" | "exit" => break,
            "status" => {
                writeln!(out, "{}", status_line(controller)?)?;
                continue;
            }
            "chart" => {
                writeln!(out, "{}", serde_json::to_string(&controller.snapshot()?)?)?;
                continue;
            }
            "help" | "?" => {
                writeln!(out, "{}", help_text(controller.config()))?;
                continue;
            }
            _ => {}
        }

        let result = line
            .parse::<SessionCommand>()
            .and_then(|command| controller.dispatch(command));

        match result {
            Ok(outcome) => {
                writeln!(out, "{}", describe(&outcome))?;
                if let Some(r) = render.as_deref_mut() {
                    r.render(&controller.snapshot()?)?;
                }
            }
            Err(e) if e.is_recoverable() => writeln!(out, "error: {e}")?,
            Err(e) => return Err(e),
        }
    }

    controller.summary()
}

fn run_play(
    config_path: &PathBuf,
    data: Option<&Path>,
    symbol: Option<&str>,
    script: Option<&Path>,
    svg: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let session_config = match build_session_config(&config) {
        Ok(c) => c,
        Err(e) => return report(e),
    };
    let request = match build_fetch_request(&config, symbol, &mut rand::thread_rng()) {
        Ok(r) => r,
        Err(e) => return report(e),
    };
    let data_port = match make_data_port(&config, data) {
        Ok(p) => p,
        Err(e) => return report(e),
    };

    let mut controller = SessionController::new(session_config);
    eprintln!("Loading {request}");
    if let Err(e) = controller.load_from(data_port.as_ref(), &request) {
        return report(e);
    }

    if let Ok(status) = status_line(&controller) {
        println!("{status}");
    }

    let input: Box<dyn BufRead> = match script {
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => return report(e.into()),
        },
        None => Box::new(io::stdin().lock()),
    };

    let mut svg_adapter = svg.map(SvgRenderAdapter::new);
    let render = svg_adapter.as_mut().map(|a| a as &mut dyn RenderPort);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match run_commands(&mut controller, input, &mut out, render) {
        Ok(summary) => {
            println!("final: {}", format_summary(&summary));
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}

fn symbol_for(path: &Path, symbol: Option<&str>) -> String {
    symbol
        .map(str::to_string)
        .or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .unwrap_or_default()
        .to_uppercase()
}

fn run_snapshot(
    data: &Path,
    symbol: Option<&str>,
    reveal: Option<usize>,
    window: Option<&str>,
    config_path: Option<&PathBuf>,
) -> ExitCode {
    let mut session_config = match config_path {
        Some(path) => {
            let config = match load_config(path) {
                Ok(c) => c,
                Err(code) => return code,
            };
            match build_session_config(&config) {
                Ok(c) => c,
                Err(e) => return report(e),
            }
        }
        None => SessionConfig::default(),
    };
    if let Some(n) = reveal {
        session_config.initial_reveal = n;
    }

    let mode = match window.map(str::parse::<WindowMode>).transpose() {
        Ok(m) => m,
        Err(e) => return report(e),
    };

    let request = FetchRequest::unbounded(symbol_for(data, symbol));
    let mut controller = SessionController::new(session_config);
    if let Err(e) = controller.load_from(file_data_port(data).as_ref(), &request) {
        return report(e);
    }
    if let Some(mode) = mode {
        if let Err(e) = controller.dispatch(SessionCommand::SetWindowMode(mode)) {
            return report(e);
        }
    }

    let snapshot = match controller.snapshot() {
        Ok(s) => s,
        Err(e) => return report(e),
    };
    let mut renderer = JsonRenderAdapter::pretty(io::stdout().lock());
    match renderer.render(&snapshot) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

fn run_info(data: &Path) -> ExitCode {
    let request = FetchRequest::unbounded(symbol_for(data, None));
    let series = match file_data_port(data)
        .fetch_bars(&request)
        .and_then(PriceSeries::load)
    {
        Ok(s) => s,
        Err(e) => return report(e),
    };

    let (first, last) = series.date_range();
    println!(
        "{}: {} bars, {} to {}",
        request.symbol,
        series.len(),
        first,
        last
    );
    ExitCode::SUCCESS
}

fn run_seed(config_path: Option<&PathBuf>) -> ExitCode {
    let symbols = match config_path {
        Some(path) => match load_config(path) {
            Ok(config) => {
                if let Err(e) = validate_data_config(&config) {
                    return report(e);
                }
                resolve_symbols(&config)
            }
            Err(code) => return code,
        },
        None => default_symbols(),
    };

    match random_seed(&mut rand::thread_rng(), &symbols) {
        Ok(request) => {
            println!("{} {} {}", request.symbol, request.start, request.end);
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}
