use smc_structure::models::{Candle, CandleSeries};

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

/// Rising highs and lows with two pullbacks; candle 12 closes above the
/// high at 9.
pub fn make_bullish_structure() -> CandleSeries {
    make_candles(&[
        (100.0, 102.0, 99.0, 101.0),
        (101.0, 106.0, 100.0, 105.0),
        (105.0, 110.0, 104.0, 109.0),
        (109.0, 109.5, 102.0, 103.0),
        (103.0, 104.0, 98.0, 99.0),
        (99.0, 106.0, 98.5, 105.5),
        (105.5, 112.0, 105.0, 111.5),
        (111.5, 115.0, 111.0, 114.5),
        (114.5, 114.8, 108.0, 108.5),
        (108.5, 118.0, 108.0, 117.5),
        (117.5, 117.8, 106.0, 107.0),
        (107.0, 110.0, 105.0, 109.5),
        (109.5, 119.0, 109.0, 118.5),
    ])
}

/// The bullish structure, an inside bar, then a close below the low at 11.
pub fn make_choch_structure() -> CandleSeries {
    let mut candles = make_bullish_structure();
    let tail = make_candles(&[
        (118.5, 118.8, 112.0, 113.0),
        (113.0, 113.5, 103.0, 104.0),
    ]);
    for (k, c) in tail.iter().enumerate() {
        candles.push(Candle {
            time: BASE_TIME + (13 + k as i64) * 60,
            ..*c
        });
    }
    candles
}

/// Random-walk candles from (body, upper wick, lower wick) steps. Each
/// candle opens at the previous close.
pub fn random_walk(steps: &[(f64, f64, f64)], start: f64) -> CandleSeries {
    let mut close = start;
    let data: Vec<_> = steps
        .iter()
        .map(|&(body, up, down)| {
            let open = close;
            close = open + body;
            let high = open.max(close) + up;
            let low = open.min(close) - down;
            (open, high, low, close)
        })
        .collect();
    make_candles(&data)
}
