use serde::{Deserialize, Serialize};
use tracing::debug;

use super::poi::Poi;
use crate::config::EngineConfig;
use crate::models::{CandleSeries, Direction, OrderType, PoiType, PositionStatus};

/// Everything needed to open a position from one POI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub poi_index: usize,
    pub poi_type: PoiType,
    pub direction: Direction,
    pub order_type: OrderType,
    /// Candle on which the entry fills.
    pub fill_index: usize,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub rr: f64,
    pub quantity: f64,
}

impl TradePlan {
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub poi_index: usize,
    pub poi_type: PoiType,
    pub direction: Direction,
    pub open_index: usize,
    pub open_time: i64,
    pub open_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub close_index: Option<usize>,
    pub close_time: i64,
    pub close_price: Option<f64>,
    pub quantity: f64,
    pub lot_size: f64,
    /// Gross, before fees.
    pub pnl: f64,
    pub fee: f64,
    pub net_pnl: f64,
    pub rr: f64,
    pub status: PositionStatus,
    pub moved_to_breakeven: bool,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

/// Turns tradeable POIs into hypothetical positions.
pub struct PositionSimulator {
    pub min_rr: f64,
    pub fee_rate: f64,
    pub lot_size: f64,
    pub risk_budget: f64,
    pub with_move: bool,
    pub break_even_rr: f64,
}

impl PositionSimulator {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            min_rr: cfg.min_rr,
            fee_rate: cfg.fee_rate,
            lot_size: cfg.lot_size,
            risk_budget: cfg.risk_budget,
            with_move: cfg.with_move,
            break_even_rr: cfg.break_even_rr,
        }
    }

    fn fee(&self, price: f64, quantity: f64) -> f64 {
        price * quantity * self.lot_size * self.fee_rate
    }

    /// Entry, sizing and RR for `poi`, or `None` when it is not tradeable.
    pub fn plan(&self, candles: &CandleSeries, poi: &Poi) -> Option<TradePlan> {
        if !poi.can_trade {
            return None;
        }
        let take_profit = poi.take_profit?;
        let direction = poi.direction();
        let order_type = poi.order_type();

        let (fill_index, entry) = match order_type {
            OrderType::Limit => (poi.end_index?, poi.entry),
            OrderType::Market => {
                let next = poi.evaluation_index + 1;
                (next, candles.get(next)?.open)
            }
        };

        let s = direction.sign();
        // stop below and target above entry for longs, mirrored for shorts
        if (entry - poi.stop_loss) * s <= 0.0 || (take_profit - entry) * s <= 0.0 {
            return None;
        }

        let risk = (entry - poi.stop_loss).abs();
        let rr = (take_profit - entry).abs() / risk;
        if !rr.is_finite() || rr < self.min_rr {
            return None;
        }

        let quantity = (self.risk_budget / (risk * self.lot_size)).floor();
        if !quantity.is_finite() || quantity <= 0.0 {
            return None;
        }

        Some(TradePlan {
            poi_index: poi.index,
            poi_type: poi.poi_type,
            direction,
            order_type,
            fill_index,
            entry,
            stop_loss: poi.stop_loss,
            take_profit,
            rr,
            quantity,
        })
    }

    /// Walk forward from the fill candle. The stop is checked before the
    /// target inside a candle, and the breakeven move after both.
    pub fn execute(&self, candles: &CandleSeries, plan: &TradePlan) -> Position {
        let s = plan.direction.sign();
        let risk = plan.risk();
        let mut stop = plan.stop_loss;
        let mut moved = false;
        let mut exit: Option<(usize, f64, PositionStatus)> = None;

        for k in plan.fill_index..candles.len() {
            let c = &candles[k];
            let (adverse, favourable) = match plan.direction {
                Direction::Long => (c.low, c.high),
                Direction::Short => (c.high, c.low),
            };

            if (adverse - stop) * s <= 0.0 {
                let status = if moved {
                    PositionStatus::ClosedBreakeven
                } else {
                    PositionStatus::ClosedSl
                };
                exit = Some((k, stop, status));
                break;
            }
            if (favourable - plan.take_profit) * s >= 0.0 {
                exit = Some((k, plan.take_profit, PositionStatus::ClosedTp));
                break;
            }
            if self.with_move
                && !moved
                && (favourable - plan.entry) * s >= self.break_even_rr * risk
            {
                stop = plan.entry;
                moved = true;
            }
        }

        let open_fee = self.fee(plan.entry, plan.quantity);
        let last_time = candles.last().map_or(0, |c| c.time);
        let (close_index, close_time, close_price, pnl, fee, status) = match exit {
            Some((k, price, status)) => {
                let pnl = (price - plan.entry) * s * plan.quantity * self.lot_size;
                let fee = open_fee + self.fee(price, plan.quantity);
                (Some(k), candles[k].time, Some(price), pnl, fee, status)
            }
            None => (None, last_time, None, 0.0, open_fee, PositionStatus::Open),
        };

        Position {
            poi_index: plan.poi_index,
            poi_type: plan.poi_type,
            direction: plan.direction,
            open_index: plan.fill_index,
            open_time: candles.get(plan.fill_index).map_or(last_time, |c| c.time),
            open_price: plan.entry,
            stop_loss: stop,
            take_profit: plan.take_profit,
            close_index,
            close_time,
            close_price,
            quantity: plan.quantity,
            lot_size: self.lot_size,
            pnl,
            fee,
            net_pnl: pnl - fee,
            rr: plan.rr,
            status,
            moved_to_breakeven: moved,
        }
    }

    /// Simulate every tradeable POI in fill order.
    pub fn run(&self, candles: &CandleSeries, pois: &[Option<Poi>]) -> Vec<Position> {
        let mut plans: Vec<TradePlan> = pois
            .iter()
            .flatten()
            .filter_map(|poi| self.plan(candles, poi))
            .collect();
        plans.sort_by_key(|p| (p.fill_index, p.poi_index));

        let positions: Vec<Position> = plans.iter().map(|p| self.execute(candles, p)).collect();
        debug!(
            "Simulator: {} positions from {} tradeable POIs, {} still open",
            positions.len(),
            pois.iter().flatten().filter(|p| p.can_trade).count(),
            positions.iter().filter(|p| p.is_open()).count()
        );
        positions
    }
}
