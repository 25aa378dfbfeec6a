use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::PoiType;

/// Feature toggles and numeric knobs for one engine run.
///
/// Every boolean defaults to off and unknown keys are ignored, so a host can
/// pass whatever option bag it has.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Display
    pub show_hidden_swings: bool,
    pub show_fake_breaks: bool,

    // Per-type trade toggles
    pub trade_extremum_ob: bool,
    pub trade_inducement_ob: bool,
    pub trade_inducement_sweep: bool,
    pub trade_extremum_sweep: bool,
    pub trade_choch_inducement: bool,
    pub trade_fvg: bool,
    pub trade_breaker: bool,

    // Simulator
    pub with_move: bool,
    pub min_rr: f64,
    pub fee_rate: f64,
    pub lot_size: f64,
    pub risk_budget: f64,
    pub break_even_rr: f64,

    // Overlays
    pub sessions: bool,
    pub weekly: bool,

    // POI detection
    pub imbalance_lookahead: usize,
    pub fvg_offset: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            show_hidden_swings: false,
            show_fake_breaks: false,
            trade_extremum_ob: false,
            trade_inducement_ob: false,
            trade_inducement_sweep: false,
            trade_extremum_sweep: false,
            trade_choch_inducement: false,
            trade_fvg: false,
            trade_breaker: false,
            with_move: false,
            min_rr: 3.0,
            fee_rate: 0.0,
            lot_size: 1.0,
            risk_budget: 100.0,
            break_even_rr: 1.0,
            sessions: false,
            weekly: false,
            imbalance_lookahead: 20,
            fvg_offset: 1,
        }
    }
}

impl EngineConfig {
    pub fn trades(&self, poi_type: PoiType) -> bool {
        match poi_type {
            PoiType::ExtremumOrderBlock => self.trade_extremum_ob,
            PoiType::InducementOrderBlock => self.trade_inducement_ob,
            PoiType::InducementSweep => self.trade_inducement_sweep,
            PoiType::ExtremumSweep => self.trade_extremum_sweep,
            PoiType::ChochInducement => self.trade_choch_inducement,
            PoiType::FairValueGap => self.trade_fvg,
            PoiType::BreakerBlock => self.trade_breaker,
        }
    }

    pub fn enabled_types(&self) -> Vec<PoiType> {
        PoiType::ALL
            .into_iter()
            .filter(|t| self.trades(*t))
            .collect()
    }

    pub fn with_all_trades(mut self) -> Self {
        self.trade_extremum_ob = true;
        self.trade_inducement_ob = true;
        self.trade_inducement_sweep = true;
        self.trade_extremum_sweep = true;
        self.trade_choch_inducement = true;
        self.trade_fvg = true;
        self.trade_breaker = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_rr.is_finite() || self.min_rr < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "min_rr must be >= 0, got {}",
                self.min_rr
            )));
        }
        if !self.fee_rate.is_finite() || self.fee_rate < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "fee_rate must be >= 0, got {}",
                self.fee_rate
            )));
        }
        if !self.lot_size.is_finite() || self.lot_size <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "lot_size must be > 0, got {}",
                self.lot_size
            )));
        }
        if !self.risk_budget.is_finite() || self.risk_budget <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "risk_budget must be > 0, got {}",
                self.risk_budget
            )));
        }
        if !self.break_even_rr.is_finite() || self.break_even_rr <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "break_even_rr must be > 0, got {}",
                self.break_even_rr
            )));
        }
        if self.imbalance_lookahead == 0 {
            return Err(EngineError::InvalidConfig(
                "imbalance_lookahead must be > 0".to_string(),
            ));
        }
        if self.fvg_offset > 2 {
            return Err(EngineError::InvalidConfig(format!(
                "fvg_offset must be 0, 1 or 2, got {}",
                self.fvg_offset
            )));
        }
        Ok(())
    }
}

/// Settings for the `backtest` binary: where candles live, which symbols to
/// run, and the engine config shared by every symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: String,
    pub symbols: Vec<String>,
    pub log_level: String,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };
        let flag = |key: &str| -> bool {
            matches!(env(key, "false").to_lowercase().as_str(), "true" | "1" | "yes")
        };

        let defaults = EngineConfig::default();
        let mut engine = EngineConfig {
            show_hidden_swings: flag("SHOW_HIDDEN_SWINGS"),
            show_fake_breaks: flag("SHOW_FAKE_BREAKS"),
            with_move: flag("WITH_MOVE"),
            sessions: flag("SESSIONS"),
            weekly: flag("WEEKLY"),
            min_rr: env("MIN_RR", "3").parse().unwrap_or(defaults.min_rr),
            fee_rate: env("FEE_RATE", "0").parse().unwrap_or(defaults.fee_rate),
            lot_size: env("LOT_SIZE", "1").parse().unwrap_or(defaults.lot_size),
            risk_budget: env("RISK_BUDGET", "100")
                .parse()
                .unwrap_or(defaults.risk_budget),
            imbalance_lookahead: env("IMBALANCE_LOOKAHEAD", "20")
                .parse()
                .unwrap_or(defaults.imbalance_lookahead),
            ..defaults
        };
        if flag("TRADE_ALL") {
            engine = engine.with_all_trades();
        }

        let symbols = env("SYMBOLS", "BTC-USD")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Config {
            data_dir: env("DATA_DIR", "data"),
            symbols,
            log_level: env("LOG_LEVEL", "info"),
            engine,
        }
    }
}
