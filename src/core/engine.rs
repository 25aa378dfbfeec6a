use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::poi::{Poi, PoiDetector};
use super::sessions::{session_ranges, weekly_ranges, SessionRange, WeeklyRange};
use super::simulator::{Position, PositionSimulator};
use super::structure::{iter_crosses, track_structure, Cross, CrossSlots, ExtremumRecord};
use super::swings::{Swing, SwingDetector};
use super::trend::{derive_trend, trend_at, TrendPoint};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::models::{CandleSeries, PerSide, Trend};

/// Everything derived from one candle series. Slot vectors are aligned to
/// the candle index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub swings: Vec<Option<Swing>>,
    pub inducements: CrossSlots,
    pub breaks: CrossSlots,
    pub extrema: Vec<ExtremumRecord>,
    pub trend: Vec<TrendPoint>,
    pub pois: Vec<Option<Poi>>,
    pub positions: Vec<Position>,
    pub sessions: Vec<SessionRange>,
    pub weeks: Vec<WeeklyRange>,
}

/// The display subset of an [`Analysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    pub swings: Vec<Option<Swing>>,
    pub inducements: CrossSlots,
    pub breaks: CrossSlots,
    pub trend: Vec<TrendPoint>,
    pub pois: Vec<Option<Poi>>,
}

impl Analysis {
    pub fn len(&self) -> usize {
        self.swings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swings.is_empty()
    }

    pub fn trend_at(&self, index: usize) -> Trend {
        trend_at(&self.trend, index)
    }

    pub fn confirmed_breaks(&self) -> Vec<&Cross> {
        let mut out: Vec<&Cross> = iter_crosses(&self.breaks)
            .filter(|c| c.is_confirmed)
            .collect();
        out.sort_by_key(|c| (c.to, c.from));
        out
    }

    pub fn tradeable_pois(&self) -> impl Iterator<Item = &Poi> {
        self.pois.iter().flatten().filter(|p| p.can_trade)
    }

    /// Swings that something else refers to: extrema, inducement anchors
    /// and POI anchors.
    fn referenced_swings(&self) -> HashSet<usize> {
        let mut keep: HashSet<usize> = HashSet::new();
        for s in self.swings.iter().flatten() {
            if s.is_any_extremum() {
                keep.insert(s.index);
                keep.extend(s.inducement.high);
                keep.extend(s.inducement.low);
            }
        }
        keep.extend(self.extrema.iter().flat_map(|e| [e.index, e.anchor]));
        keep.extend(iter_crosses(&self.inducements).filter(|c| c.is_confirmed).map(|c| c.from));
        keep.extend(self.pois.iter().flatten().map(|p| p.index));
        keep
    }

    pub fn view(&self, cfg: &EngineConfig) -> Annotations {
        let swings = if cfg.show_hidden_swings {
            self.swings.clone()
        } else {
            let keep = self.referenced_swings();
            self.swings
                .iter()
                .map(|s| s.as_ref().filter(|s| keep.contains(&s.index)).cloned())
                .collect()
        };

        let breaks = if cfg.show_fake_breaks {
            self.breaks.clone()
        } else {
            self.breaks
                .iter()
                .map(|slot| PerSide {
                    high: slot.high.clone().filter(|c| !c.is_fake),
                    low: slot.low.clone().filter(|c| !c.is_fake),
                })
                .collect()
        };

        Annotations {
            swings,
            inducements: self.inducements.clone(),
            breaks,
            trend: self.trend.clone(),
            pois: self.pois.clone(),
        }
    }
}

/// One engine per series. Holds only the config, so every `analyze` call
/// starts from fresh state.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyze(&self, candles: &CandleSeries) -> Result<Analysis> {
        if candles.is_empty() {
            return Err(EngineError::EmptySeries);
        }

        let series = SwingDetector::new().detect(candles);
        let mut swings = series.swings;
        let structure = track_structure(candles, &mut swings, &series.accepted);
        let trend = derive_trend(candles, &structure);
        let pois = PoiDetector::new(candles, &swings, &structure, &trend, &self.config)?.detect()?;
        let positions = PositionSimulator::new(&self.config).run(candles, &pois);

        let sessions = if self.config.sessions {
            session_ranges(candles)
        } else {
            Vec::new()
        };
        let weeks = if self.config.weekly {
            weekly_ranges(candles)
        } else {
            Vec::new()
        };

        debug!(
            "Analysis: {} candles, {} swings, {} POIs, {} positions",
            candles.len(),
            swings.iter().flatten().count(),
            pois.iter().flatten().count(),
            positions.len()
        );

        Ok(Analysis {
            swings,
            inducements: structure.inducements,
            breaks: structure.breaks,
            extrema: structure.extrema,
            trend,
            pois,
            positions,
            sessions,
            weeks,
        })
    }
}
