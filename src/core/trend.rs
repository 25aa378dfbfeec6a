use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::structure::{filter_nested, Cross, Structure};
use crate::models::{CandleSeries, Trend};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub time: i64,
    pub trend: Trend,
}

/// Fold confirmed breaks into one trend value per candle. Each break sets
/// the trend from its confirmation candle on; earlier candles stay neutral.
pub fn derive_trend(candles: &CandleSeries, structure: &Structure) -> Vec<TrendPoint> {
    let confirmed: Vec<Cross> = structure
        .confirmed_breaks()
        .into_iter()
        .cloned()
        .collect();
    let surviving = filter_nested(candles, &confirmed);

    // one break per confirmation candle: wider span wins, then earlier origin
    let mut by_to: BTreeMap<usize, Cross> = BTreeMap::new();
    for b in surviving {
        let Some(to) = b.to else { continue };
        let better = by_to.get(&to).map_or(true, |kept| {
            b.span() > kept.span() || (b.span() == kept.span() && b.from < kept.from)
        });
        if better {
            by_to.insert(to, b);
        }
    }

    let mut current = Trend::Neutral;
    let mut flips = 0;
    let points: Vec<TrendPoint> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if let Some(b) = by_to.get(&i) {
                let next = b.side.break_trend();
                if next != current {
                    flips += 1;
                }
                current = next;
            }
            TrendPoint {
                time: c.time,
                trend: current,
            }
        })
        .collect();

    debug!("Trend: {} breaks folded, {} changes", by_to.len(), flips);
    points
}

/// Trend at `index`, neutral when out of range.
pub fn trend_at(trend: &[TrendPoint], index: usize) -> Trend {
    trend.get(index).map_or(Trend::Neutral, |t| t.trend)
}
