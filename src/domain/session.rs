//! Session state and command dispatch.
//!
//! A session owns the loaded [`PriceSeries`], its [`RevealWindow`] and the
//! [`Portfolio`]. Every change goes through one [`Command`] at a time; each
//! command runs to completion and returns an explicit [`Outcome`] or error.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::analytics::ChartSnapshot;
use super::error::TraderError;
use super::money::{Cash, Quantity};
use super::portfolio::{Portfolio, PortfolioSummary};
use super::price_bar::PriceBar;
use super::price_series::PriceSeries;
use super::reveal_window::{RevealWindow, WindowMode};
use super::trade_engine::{self, Fill, SizePreset};
use crate::ports::data_port::{DataPort, FetchRequest};

pub const DEFAULT_STARTING_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_INITIAL_REVEAL: usize = 200;
pub const DEFAULT_MA_PERIODS: [usize; 4] = [5, 10, 20, 30];
pub const DEFAULT_WINDOW_PRESETS: [usize; 2] = [200, 300];

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub starting_capital: Cash,
    pub initial_reveal: usize,
    pub ma_periods: Vec<usize>,
    pub window_presets: Vec<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            starting_capital: Cash::from_float(DEFAULT_STARTING_CAPITAL),
            initial_reveal: DEFAULT_INITIAL_REVEAL,
            ma_periods: DEFAULT_MA_PERIODS.to_vec(),
            window_presets: DEFAULT_WINDOW_PRESETS.to_vec(),
        }
    }
}

/// Order size as requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSize {
    Units(u64),
    Fraction(SizePreset),
}

impl FromStr for OrderSize {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(n) => Ok(OrderSize::Units(n)),
            Err(_) => s.parse::<SizePreset>().map(OrderSize::Fraction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Advance,
    Buy(OrderSize),
    Sell(OrderSize),
    SetWindowMode(WindowMode),
}

impl FromStr for Command {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();
        let invalid = |reason: &str| TraderError::InvalidCommand {
            input: s.trim().to_string(),
            reason: reason.to_string(),
        };
        if parts.next().is_some() {
            return Err(invalid("too many arguments"));
        }

        match (verb.as_str(), arg) {
            ("next" | "n" | "advance", None) => Ok(Command::Advance),
            ("buy" | "b", Some(size)) => Ok(Command::Buy(size.parse()?)),
            ("sell" | "s", Some(size)) => Ok(Command::Sell(size.parse()?)),
            ("window" | "w", Some(mode)) => Ok(Command::SetWindowMode(mode.parse()?)),
            ("buy" | "b" | "sell" | "s", None) => Err(invalid("missing order size")),
            ("window" | "w", None) => Err(invalid("missing window mode")),
            ("", _) => Err(invalid("empty command")),
            _ => Err(invalid("unknown command")),
        }
    }
}

impl fmt::Display for OrderSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSize::Units(n) => write!(f, "{}", n),
            OrderSize::Fraction(p) => write!(f, "{}", p),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Advanced { boundary: usize, date: NaiveDate },
    Filled(Fill),
    WindowChanged { mode: WindowMode, range: Range<usize> },
}

/// The single aggregate mutated by session commands.
#[derive(Debug, Clone)]
pub struct SessionState {
    series: PriceSeries,
    window: RevealWindow,
    portfolio: Portfolio,
    ma_periods: Vec<usize>,
}

impl SessionState {
    pub fn start(series: PriceSeries, config: &SessionConfig) -> Result<Self, TraderError> {
        let window = RevealWindow::new(series.len(), config.initial_reveal)?;
        let mut state = SessionState {
            series,
            window,
            portfolio: Portfolio::new(config.starting_capital),
            ma_periods: config.ma_periods.clone(),
        };
        let boundary = state.boundary_bar()?.date;
        state.portfolio.record_equity(boundary);
        Ok(state)
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn window(&self) -> &RevealWindow {
        &self.window
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn summary(&self) -> PortfolioSummary {
        self.portfolio.summary()
    }

    pub fn boundary_bar(&self) -> Result<&PriceBar, TraderError> {
        self.series.at(self.window.boundary_index())
    }

    pub fn display_bars(&self) -> Result<&[PriceBar], TraderError> {
        self.series.slice(self.window.display_range())
    }

    /// Reveal the next bar and re-mark the position at its close.
    pub fn advance(&mut self) -> Result<Outcome, TraderError> {
        let boundary = self.window.advance()?;
        let bar = self.series.at(boundary)?;
        trade_engine::revalue(&mut self.portfolio, bar);
        self.portfolio.record_equity(bar.date);
        debug!(boundary, date = %bar.date, close = bar.close, "advanced");
        Ok(Outcome::Advanced {
            boundary,
            date: bar.date,
        })
    }

    /// Units a buy of `size` resolves to at the current boundary.
    pub fn resolve_buy(&self, size: OrderSize) -> Result<Quantity, TraderError> {
        match size {
            OrderSize::Units(n) => Ok(Quantity(n)),
            OrderSize::Fraction(preset) => {
                let price = trade_engine::execution_price(self.boundary_bar()?);
                let max = trade_engine::max_buy_units(self.portfolio.capital(), price);
                Ok(preset.units_of(max))
            }
        }
    }

    pub fn resolve_sell(&self, size: OrderSize) -> Quantity {
        match size {
            OrderSize::Units(n) => Quantity(n),
            OrderSize::Fraction(preset) => preset.units_of(self.portfolio.units()),
        }
    }

    pub fn buy(&mut self, size: OrderSize) -> Result<Outcome, TraderError> {
        let units = self.resolve_buy(size)?;
        let bar = self.series.at(self.window.boundary_index())?;
        let fill = trade_engine::buy(&mut self.portfolio, bar, units)?;
        self.portfolio.record_equity(bar.date);
        Ok(Outcome::Filled(fill))
    }

    pub fn sell(&mut self, size: OrderSize) -> Result<Outcome, TraderError> {
        let units = self.resolve_sell(size);
        let bar = self.series.at(self.window.boundary_index())?;
        let fill = trade_engine::sell(&mut self.portfolio, bar, units)?;
        self.portfolio.record_equity(bar.date);
        Ok(Outcome::Filled(fill))
    }

    pub fn set_mode(&mut self, mode: WindowMode) -> Outcome {
        let range = self.window.set_mode(mode);
        debug!(%mode, start = range.start, end = range.end, "window changed");
        Outcome::WindowChanged { mode, range }
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome, TraderError> {
        match command {
            Command::Advance => self.advance(),
            Command::Buy(size) => self.buy(size),
            Command::Sell(size) => self.sell(size),
            Command::SetWindowMode(mode) => Ok(self.set_mode(mode)),
        }
    }

    pub fn snapshot(&self) -> Result<ChartSnapshot, TraderError> {
        let range = self.window.display_range();
        let view = self.series.slice(range.clone())?;
        Ok(ChartSnapshot::build(
            self.series.symbol(),
            view,
            range,
            &self.ma_periods,
            &self.portfolio,
        ))
    }
}

#[derive(Debug, Clone)]
pub enum SessionPhase {
    Loading,
    Ready(Box<SessionState>),
    Failed(String),
}

/// Drives one session: waits for the series to load, then applies commands.
#[derive(Debug, Clone)]
pub struct SessionController {
    config: SessionConfig,
    phase: SessionPhase,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        SessionController {
            config,
            phase: SessionPhase::Loading,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, SessionPhase::Ready(_))
    }

    pub fn state(&self) -> Option<&SessionState> {
        match &self.phase {
            SessionPhase::Ready(state) => Some(state.as_ref()),
            _ => None,
        }
    }

    /// Complete the pending load with the fetched bars (or the fetch error).
    ///
    /// Any failure is terminal for this session: the phase becomes `Failed`
    /// and subsequent commands are rejected.
    pub fn load(
        &mut self,
        symbol: &str,
        fetched: Result<Vec<PriceBar>, TraderError>,
    ) -> Result<(), TraderError> {
        let result = fetched
            .and_then(PriceSeries::load)
            .and_then(|series| SessionState::start(series.with_symbol(symbol), &self.config));

        match result {
            Ok(state) => {
                info!(
                    symbol,
                    bars = state.series().len(),
                    revealed = state.window().current_index(),
                    "session started"
                );
                self.phase = SessionPhase::Ready(Box::new(state));
                Ok(())
            }
            Err(e) => {
                warn!(symbol, error = %e, "session failed to load");
                self.phase = SessionPhase::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn load_from(
        &mut self,
        port: &dyn DataPort,
        request: &FetchRequest,
    ) -> Result<(), TraderError> {
        let fetched = port.fetch_bars(request);
        self.load(&request.symbol, fetched)
    }

    /// Discard the current session and start over from new bars.
    pub fn restart(
        &mut self,
        symbol: &str,
        fetched: Result<Vec<PriceBar>, TraderError>,
    ) -> Result<(), TraderError> {
        self.phase = SessionPhase::Loading;
        self.load(symbol, fetched)
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Outcome, TraderError> {
        match &mut self.phase {
            SessionPhase::Ready(state) => state.apply(command),
            SessionPhase::Loading => Err(TraderError::SessionNotReady {
                reason: "price data is still loading".into(),
            }),
            SessionPhase::Failed(reason) => Err(TraderError::SessionNotReady {
                reason: format!("session failed to load: {}", reason),
            }),
        }
    }

    pub fn snapshot(&self) -> Result<ChartSnapshot, TraderError> {
        self.ready()?.snapshot()
    }

    pub fn summary(&self) -> Result<PortfolioSummary, TraderError> {
        Ok(self.ready()?.summary())
    }

    fn ready(&self) -> Result<&SessionState, TraderError> {
        match &self.phase {
            SessionPhase::Ready(state) => Ok(state.as_ref()),
            SessionPhase::Loading => Err(TraderError::SessionNotReady {
                reason: "price data is still loading".into(),
            }),
            SessionPhase::Failed(reason) => Err(TraderError::SessionNotReady {
                reason: format!("session failed to load: {}", reason),
            }),
        }
    }
}
