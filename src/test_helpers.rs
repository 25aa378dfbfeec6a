use crate::config::EngineConfig;
use crate::models::{Candle, CandleSeries};

/// 2024-01-15T12:00:00Z
pub const BASE_TIME: i64 = 1_705_320_000;

/// Create candles from (open, high, low, close) tuples with auto-incrementing 1m timestamps.
pub fn make_candles(data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let candles: Vec<Candle> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle {
            time: BASE_TIME + i as i64 * 60,
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect();

    CandleSeries::new(candles)
}

/// Create n rising (bullish) candles starting from `start` price.
pub fn make_bullish_trend(n: usize, start: f64) -> CandleSeries {
    let data: Vec<_> = (0..n)
        .map(|i| {
            let open = start + i as f64 * 10.0;
            let close = open + 8.0;
            (open, close + 2.0, open - 1.0, close)
        })
        .collect();
    make_candles(&data)
}

/// Rows of a bullish structure: the low at 4 confirms when the high at 2 is
/// taken, the high at 9 confirms when the pullback low at 8 is taken, and
/// candle 12 closes above 9 for a break of structure.
pub const BULLISH_STRUCTURE: [(f64, f64, f64, f64); 13] = [
    (100.0, 102.0, 99.0, 101.0),   // 0
    (101.0, 106.0, 100.0, 105.0),  // 1
    (105.0, 110.0, 104.0, 109.0),  // 2 high
    (109.0, 109.5, 102.0, 103.0),  // 3
    (103.0, 104.0, 98.0, 99.0),    // 4 low
    (99.0, 106.0, 98.5, 105.5),    // 5
    (105.5, 112.0, 105.0, 111.5),  // 6 takes 110
    (111.5, 115.0, 111.0, 114.5),  // 7
    (114.5, 114.8, 108.0, 108.5),  // 8 pullback low
    (108.5, 118.0, 108.0, 117.5),  // 9 high
    (117.5, 117.8, 106.0, 107.0),  // 10 takes 108
    (107.0, 110.0, 105.0, 109.5),  // 11 low
    (109.5, 119.0, 109.0, 118.5),  // 12 closes above 118
];

pub fn make_bullish_structure() -> CandleSeries {
    make_candles(&BULLISH_STRUCTURE)
}

/// The bullish structure followed by an inside bar and a close below the
/// low at 11: a change of character at 14.
pub fn make_choch_structure() -> CandleSeries {
    let mut rows = BULLISH_STRUCTURE.to_vec();
    rows.push((118.5, 118.8, 112.0, 113.0)); // 13 inside 12
    rows.push((113.0, 113.5, 103.0, 104.0)); // 14 closes below 105
    make_candles(&rows)
}

/// A high at 2 leaves a bearish gap (2 -> 4), price returns to the zone
/// at 6 and falls to the low at 0 on 7.
pub const SUPPLY_ROWS: [(f64, f64, f64, f64); 8] = [
    (100.0, 101.0, 99.0, 100.5),  // 0 low
    (100.5, 103.0, 100.0, 102.5), // 1
    (107.0, 110.0, 106.0, 107.5), // 2 high
    (107.5, 108.0, 100.0, 100.5), // 3
    (100.5, 104.0, 99.0, 99.5),   // 4 gap below 106
    (99.5, 103.0, 99.2, 102.5),   // 5
    (102.5, 106.5, 102.0, 105.5), // 6 back into the zone
    (105.5, 106.0, 97.0, 97.5),   // 7 through 99
];

/// Engine config with every POI type tradable and a low RR floor.
pub fn default_test_config() -> EngineConfig {
    EngineConfig {
        min_rr: 0.5,
        show_hidden_swings: true,
        show_fake_breaks: true,
        ..EngineConfig::default().with_all_trades()
    }
}
