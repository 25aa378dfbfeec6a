use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Side;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Unix time in seconds.
    pub time: i64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn total_range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.close.max(self.open)
    }

    pub fn lower_wick(&self) -> f64 {
        self.close.min(self.open) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn body_top(&self) -> f64 {
        self.close.max(self.open)
    }

    pub fn body_bottom(&self) -> f64 {
        self.close.min(self.open)
    }

    /// Price of the candle on the given side (high or low).
    pub fn price(&self, side: Side) -> f64 {
        match side {
            Side::High => self.high,
            Side::Low => self.low,
        }
    }

    pub fn wick(&self, side: Side) -> f64 {
        match side {
            Side::High => self.upper_wick(),
            Side::Low => self.lower_wick(),
        }
    }

    /// Fully contained in `outer`'s high/low range.
    pub fn is_inside(&self, outer: &Candle) -> bool {
        self.high <= outer.high && self.low >= outer.low
    }

    /// Finite prices with the open and close inside the high/low range.
    pub fn is_well_formed(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.high >= self.low
            && self.high >= self.body_top()
            && self.low <= self.body_bottom()
    }

    /// Inefficiency candle: the wick on `side` dominates both the body and
    /// the opposite wick.
    pub fn is_ifc(&self, side: Side) -> bool {
        let wick = self.wick(side);
        wick > self.body() && wick > self.wick(side.opposite())
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }
}

/// Time-ordered candle input for one symbol/timeframe.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn slice(&self, start: usize, end: usize) -> CandleSeries {
        let s = start.min(self.candles.len());
        let e = end.min(self.candles.len()).max(s);
        CandleSeries::new(self.candles[s..e].to_vec())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    /// Highest high over `start..=end` (clamped to the series).
    pub fn max_high(&self, start: usize, end: usize) -> f64 {
        self.window(start, end)
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Lowest low over `start..=end` (clamped to the series).
    pub fn min_low(&self, start: usize, end: usize) -> f64 {
        self.window(start, end)
            .iter()
            .map(|c| c.low)
            .fold(f64::INFINITY, f64::min)
    }

    /// Index of the most extreme candle on `side` over `start..=end`.
    /// Ties resolve to the earliest candle.
    pub fn extreme_index(&self, side: Side, start: usize, end: usize) -> Option<usize> {
        let window = self.window(start, end);
        let mut best: Option<usize> = None;
        for (offset, c) in window.iter().enumerate() {
            let better = match best {
                None => true,
                Some(b) => side.beyond(c.price(side), self.candles[b].price(side)),
            };
            if better {
                best = Some(start + offset);
            }
        }
        best
    }

    /// Whether any candle in `start..=end` trades beyond `level` on `side`.
    pub fn any_beyond(&self, side: Side, level: f64, start: usize, end: usize) -> bool {
        self.window(start, end)
            .iter()
            .any(|c| side.beyond(c.price(side), level))
    }

    fn window(&self, start: usize, end: usize) -> &[Candle] {
        if start > end || start >= self.candles.len() {
            return &[];
        }
        let e = end.min(self.candles.len() - 1);
        &self.candles[start..=e]
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
    }
}

impl From<Vec<Candle>> for CandleSeries {
    fn from(candles: Vec<Candle>) -> Self {
        Self::new(candles)
    }
}

impl std::ops::Index<usize> for CandleSeries {
    type Output = Candle;
    fn index(&self, index: usize) -> &Self::Output {
        &self.candles[index]
    }
}

impl IntoIterator for CandleSeries {
    type Item = Candle;
    type IntoIter = std::vec::IntoIter<Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
