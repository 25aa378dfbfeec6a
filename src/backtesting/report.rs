use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::engine::Analysis;
use crate::core::simulator::Position;
use crate::models::{CandleSeries, PositionStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeStats {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,

    // Period
    pub candles: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,

    // Structure
    pub swings: usize,
    pub confirmed_breaks: usize,
    pub pois: usize,
    pub tradeable_pois: usize,

    // Trades
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub open_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub total_fees: f64,
    pub avg_rr: f64,
    pub profit_factor: f64,

    // Risk
    pub max_drawdown: f64,

    // By POI type
    pub type_stats: BTreeMap<String, TypeStats>,

    pub positions: Vec<Position>,
}

impl BacktestReport {
    pub fn from_analysis(symbol: &str, candles: &CandleSeries, analysis: &Analysis) -> Self {
        let positions = &analysis.positions;
        let count = |status: PositionStatus| {
            positions.iter().filter(|p| p.status == status).count()
        };

        let winning = count(PositionStatus::ClosedTp);
        let losing = count(PositionStatus::ClosedSl);
        let breakeven = count(PositionStatus::ClosedBreakeven);
        let open = count(PositionStatus::Open);
        let closed = winning + losing + breakeven;
        let win_rate = if closed > 0 {
            winning as f64 / closed as f64 * 100.0
        } else {
            0.0
        };

        let total_pnl: f64 = positions.iter().map(|p| p.net_pnl).sum();
        let total_fees: f64 = positions.iter().map(|p| p.fee).sum();
        let avg_rr = if positions.is_empty() {
            0.0
        } else {
            positions.iter().map(|p| p.rr).sum::<f64>() / positions.len() as f64
        };

        let gross_win: f64 = positions.iter().map(|p| p.net_pnl).filter(|v| *v > 0.0).sum();
        let gross_loss: f64 = positions.iter().map(|p| p.net_pnl).filter(|v| *v < 0.0).sum();
        let profit_factor = if gross_loss < 0.0 {
            gross_win / gross_loss.abs()
        } else if gross_win > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let mut type_stats: BTreeMap<String, TypeStats> = BTreeMap::new();
        for p in positions {
            let entry = type_stats.entry(p.poi_type.to_string()).or_default();
            entry.trades += 1;
            entry.total_pnl += p.net_pnl;
            match p.status {
                PositionStatus::ClosedTp => entry.wins += 1,
                PositionStatus::ClosedSl => entry.losses += 1,
                _ => {}
            }
        }
        for stats in type_stats.values_mut() {
            let decided = stats.wins + stats.losses;
            stats.win_rate = if decided > 0 {
                stats.wins as f64 / decided as f64 * 100.0
            } else {
                0.0
            };
        }

        BacktestReport {
            symbol: symbol.to_string(),
            candles: candles.len(),
            start: candles.first().and_then(|c| c.datetime()),
            end: candles.last().and_then(|c| c.datetime()),
            swings: analysis.swings.iter().flatten().count(),
            confirmed_breaks: analysis.confirmed_breaks().len(),
            pois: analysis.pois.iter().flatten().count(),
            tradeable_pois: analysis.tradeable_pois().count(),
            total_trades: positions.len(),
            winning_trades: winning,
            losing_trades: losing,
            breakeven_trades: breakeven,
            open_trades: open,
            win_rate,
            total_pnl,
            total_fees,
            avg_rr,
            profit_factor,
            max_drawdown: max_drawdown(positions),
            type_stats,
            positions: positions.clone(),
        }
    }

    pub fn print_summary(&self) {
        let date = |d: Option<DateTime<Utc>>| {
            d.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string())
        };

        println!("\n{}", "=".repeat(70));
        println!("  BACKTEST REPORT: {}", self.symbol);
        println!("{}", "=".repeat(70));
        println!(
            "  Period:      {} to {} ({} candles)",
            date(self.start),
            date(self.end),
            self.candles
        );
        println!();
        println!("  STRUCTURE");
        println!("  ───────────────────────────────────");
        println!("  Swings:      {}", self.swings);
        println!("  Breaks:      {}", self.confirmed_breaks);
        println!("  POIs:        {} ({} tradeable)", self.pois, self.tradeable_pois);
        println!();
        println!("  TRADES");
        println!("  ───────────────────────────────────");
        println!("  Total:       {}", self.total_trades);
        println!(
            "  W/L/BE/Open: {} / {} / {} / {}",
            self.winning_trades, self.losing_trades, self.breakeven_trades, self.open_trades
        );
        println!("  Win Rate:    {:.1}%", self.win_rate);
        println!("  PnL:         {:+.2}", self.total_pnl);
        println!("  Fees:        {:.2}", self.total_fees);
        println!("  Avg RR:      {:.2}", self.avg_rr);
        println!("  Profit Factor: {:.2}", self.profit_factor);
        println!("  Max DD:      {:.2}", self.max_drawdown);

        if !self.type_stats.is_empty() {
            println!();
            println!("  BY POI TYPE");
            println!("  ───────────────────────────────────");
            for (poi_type, stats) in &self.type_stats {
                println!(
                    "  {:>10}: {} trades | WR {:.0}% | PnL {:+.2}",
                    poi_type, stats.trades, stats.win_rate, stats.total_pnl
                );
            }
        }

        println!("{}", "=".repeat(70));
    }
}

/// Largest peak-to-trough drop of cumulative net PnL, in close order.
/// Open positions count at the end with their entry fee.
fn max_drawdown(positions: &[Position]) -> f64 {
    let mut ordered: Vec<&Position> = positions.iter().collect();
    ordered.sort_by_key(|p| (p.close_index.unwrap_or(usize::MAX), p.open_index));

    let mut equity = 0.0f64;
    let mut peak = 0.0f64;
    let mut max_dd = 0.0f64;
    for p in ordered {
        equity += p.net_pnl;
        peak = peak.max(equity);
        max_dd = max_dd.max(peak - equity);
    }
    max_dd
}
