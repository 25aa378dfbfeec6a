use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CandleSeries, PerSide, Side, SwingKind};

/// A pivot candidate. Mutable flags are owned by the structure tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swing {
    pub index: usize,
    pub time: i64,
    pub kind: SwingKind,
    pub high: f64,
    pub low: f64,
    /// Candle index at which the detector committed each side.
    pub registered: PerSide<Option<usize>>,
    pub is_extremum: PerSide<bool>,
    /// Index of the opposite-side swing paired with this extremum.
    pub inducement: PerSide<Option<usize>>,
    pub is_inducement_sweep: bool,
}

impl Swing {
    pub fn new(candles: &CandleSeries, index: usize, side: Side, registered_at: usize) -> Self {
        let c = &candles[index];
        let mut registered = PerSide::default();
        registered[side] = Some(registered_at);
        Self {
            index,
            time: c.time,
            kind: side.into(),
            high: c.high,
            low: c.low,
            registered,
            is_extremum: PerSide::default(),
            inducement: PerSide::default(),
            is_inducement_sweep: false,
        }
    }

    pub fn price(&self, side: Side) -> f64 {
        match side {
            Side::High => self.high,
            Side::Low => self.low,
        }
    }

    pub fn includes(&self, side: Side) -> bool {
        self.kind.includes(side)
    }

    pub fn is_any_extremum(&self) -> bool {
        self.is_extremum.high || self.is_extremum.low
    }
}

/// One side of a swing becoming visible to the tracker at candle `at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub at: usize,
    pub index: usize,
    pub side: Side,
}

/// Detector output: swing slots aligned to the candle index.
#[derive(Debug, Clone)]
pub struct SwingSeries {
    pub swings: Vec<Option<Swing>>,
    /// Candles the detector treated as valid input (well-formed, strictly
    /// increasing time). Inside bars count as accepted.
    pub accepted: Vec<bool>,
    pub inside_bars: usize,
    pub superseded: usize,
}

impl SwingSeries {
    pub fn count(&self) -> usize {
        self.swings.iter().flatten().count()
    }
}

/// Sorted by registration index, then swing index, high before low.
pub fn registrations(swings: &[Option<Swing>]) -> Vec<Registration> {
    let mut regs: Vec<Registration> = swings
        .iter()
        .flatten()
        .flat_map(|s| {
            s.kind.sides().iter().filter_map(move |&side| {
                s.registered[side].map(|at| Registration {
                    at,
                    index: s.index,
                    side,
                })
            })
        })
        .collect();
    regs.sort_by_key(|r| (r.at, r.index, r.side != Side::High));
    regs
}

/// Zig-zag pivot detector. A leg reverses only when a candle closes through
/// the pending extreme's opposite boundary; wicks through it are sweeps.
pub struct SwingDetector;

impl Default for SwingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SwingDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, candles: &CandleSeries) -> SwingSeries {
        let n = candles.len();
        let mut zz = ZigZag {
            candles,
            swings: vec![None; n],
            external: None,
            hunting: Side::High,
            pending: 0,
            leg: Vec::new(),
            last_emitted: None,
            superseded: 0,
        };
        let mut accepted = vec![false; n];
        let mut last_time: Option<i64> = None;
        let mut last_accepted = None;
        let mut inside_bars = 0;

        for i in 0..n {
            let c = &candles[i];
            if !c.is_well_formed() || last_time.is_some_and(|t| c.time <= t) {
                continue;
            }
            last_time = Some(c.time);
            accepted[i] = true;
            last_accepted = Some(i);

            let Some(ext) = zz.external else {
                // seed placeholder so the tracker has a starting anchor
                zz.emit(i, Side::High, i);
                zz.external = Some(i);
                zz.pending = i;
                continue;
            };
            if c.is_inside(&candles[ext]) {
                inside_bars += 1;
                continue;
            }
            zz.external = Some(i);
            zz.step(i);
        }

        if let Some(last) = last_accepted {
            zz.finish(last);
        }

        let series = SwingSeries {
            swings: zz.swings,
            accepted,
            inside_bars,
            superseded: zz.superseded,
        };
        debug!(
            "Swings: {} detected, {} inside bars skipped, {} superseded",
            series.count(),
            series.inside_bars,
            series.superseded
        );
        series
    }
}

struct ZigZag<'a> {
    candles: &'a CandleSeries,
    swings: Vec<Option<Swing>>,
    external: Option<usize>,
    /// Side of the extreme the current leg is heading for.
    hunting: Side,
    pending: usize,
    /// External candles since `pending`.
    leg: Vec<usize>,
    last_emitted: Option<(usize, Side)>,
    superseded: usize,
}

impl ZigZag<'_> {
    fn price(&self, index: usize, side: Side) -> f64 {
        self.candles[index].price(side)
    }

    fn step(&mut self, i: usize) {
        let side = self.hunting;
        let opp = side.opposite();
        let p = self.pending;
        let c = self.candles[i];

        if opp.beyond(c.close, self.price(p, opp)) {
            let outside = side.beyond(c.price(side), self.price(p, side));
            let top = if outside { i } else { p };
            self.emit(top, side, i);

            self.leg.push(i);
            let next = if outside {
                i
            } else {
                self.most_extreme_in_leg(opp).unwrap_or(i)
            };
            self.leg.retain(|&k| k > next);
            self.hunting = opp;
            self.pending = next;
        } else if side.beyond(c.price(side), self.price(p, side)) {
            self.pending = i;
            self.leg.clear();
        } else {
            self.leg.push(i);
        }
    }

    fn most_extreme_in_leg(&self, side: Side) -> Option<usize> {
        self.leg.iter().copied().reduce(|best, k| {
            if side.beyond(self.price(k, side), self.price(best, side)) {
                k
            } else {
                best
            }
        })
    }

    fn emit(&mut self, index: usize, side: Side, registered_at: usize) {
        if let Some((prev, prev_side)) = self.last_emitted {
            if prev_side == side {
                if prev == index {
                    return;
                }
                self.superseded += 1;
                if !side.beyond(self.price(index, side), self.price(prev, side)) {
                    return;
                }
                self.clear(prev, side);
            }
        }

        if let Some(s) = self.swings[index].as_mut() {
            s.kind = s.kind.with(side);
            s.registered[side] = Some(registered_at);
        } else {
            self.swings[index] = Some(Swing::new(self.candles, index, side, registered_at));
        }
        self.last_emitted = Some((index, side));
    }

    /// Drop one side of a swing. A double keeps its other side.
    fn clear(&mut self, index: usize, side: Side) {
        let remaining = self.swings[index].as_ref().map(|s| s.kind.without(side));
        match remaining {
            Some(Some(kind)) => {
                if let Some(s) = self.swings[index].as_mut() {
                    s.kind = kind;
                    s.registered[side] = None;
                }
            }
            Some(None) => self.swings[index] = None,
            None => {}
        }
    }

    fn finish(&mut self, last: usize) {
        let side = self.hunting;
        if self.last_emitted.map(|(_, s)| s) != Some(side) {
            self.emit(self.pending, side, last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_bullish_trend, make_candles};

    fn kinds(series: &SwingSeries) -> Vec<Option<SwingKind>> {
        series
            .swings
            .iter()
            .map(|s| s.as_ref().map(|s| s.kind))
            .collect()
    }

    #[test]
    fn rising_series_keeps_only_seed() {
        let candles = make_bullish_trend(5, 100.0);
        let series = SwingDetector::new().detect(&candles);
        assert_eq!(
            kinds(&series),
            vec![Some(SwingKind::High), None, None, None, None]
        );
    }

    #[test]
    fn inside_bar_then_breakout_and_breakdown() {
        let candles = make_candles(&[
            (9.0, 10.0, 8.0, 9.0),
            (8.5, 9.0, 7.0, 8.5),
            (10.0, 11.0, 9.0, 10.5),
            (8.0, 8.0, 6.0, 6.5),
        ]);
        let series = SwingDetector::new().detect(&candles);
        assert_eq!(
            kinds(&series),
            vec![None, None, Some(SwingKind::High), Some(SwingKind::Low)]
        );
        let high = series.swings[2].as_ref().unwrap();
        assert_eq!(high.registered.high, Some(3));
        assert_eq!(series.superseded, 1, "seed should be superseded");
    }

    #[test]
    fn inside_bars_produce_no_swings() {
        let candles = make_candles(&[
            (100.0, 110.0, 90.0, 105.0),
            (104.0, 108.0, 92.0, 95.0),
            (95.0, 107.0, 93.0, 100.0),
            (100.0, 106.0, 94.0, 96.0),
            (96.0, 105.0, 95.0, 104.0),
        ]);
        let series = SwingDetector::new().detect(&candles);
        assert_eq!(series.inside_bars, 4);
        assert!(series.swings[1..].iter().all(|s| s.is_none()));
    }

    #[test]
    fn wick_through_without_close_is_not_a_reversal() {
        let candles = make_candles(&[
            (100.0, 105.0, 99.0, 104.0),
            (104.0, 110.0, 103.0, 109.0),
            (109.0, 109.5, 101.0, 104.0), // wicks below 103, closes above
            (104.0, 112.0, 103.5, 111.0),
        ]);
        let series = SwingDetector::new().detect(&candles);
        assert_eq!(series.count(), 1, "only the seed survives: {:?}", kinds(&series));
    }

    #[test]
    fn reversal_picks_deepest_candle_of_the_leg() {
        let candles = make_candles(&[
            (100.0, 105.0, 99.0, 104.0),
            (104.0, 110.0, 103.0, 109.0), // high
            (109.0, 109.5, 98.0, 104.0),  // deepest wick, closes inside
            (104.0, 109.8, 100.0, 101.0), // closes below 103
            (101.0, 115.0, 100.5, 114.0), // closes above 106
        ]);
        let series = SwingDetector::new().detect(&candles);
        assert_eq!(series.swings[1].as_ref().map(|s| s.kind), Some(SwingKind::High));
        let low = series.swings[2].as_ref().expect("low swing at the deepest candle");
        assert_eq!(low.kind, SwingKind::Low);
        assert_eq!(low.registered.low, Some(4));
    }

    #[test]
    fn outside_candle_becomes_double() {
        let candles = make_candles(&[
            (100.0, 102.0, 99.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 108.0, 95.0, 96.0),  // outside: new high, closes below 100
            (97.0, 112.0, 96.5, 111.0),  // closes above 108 while 2 is still the low
        ]);
        let series = SwingDetector::new().detect(&candles);
        let double = series.swings[2].as_ref().unwrap();
        assert_eq!(double.kind, SwingKind::Double);
        assert_eq!(double.registered.high, Some(2));
        assert_eq!(double.registered.low, Some(3));
        assert!(series.swings[1].is_none());
    }

    #[test]
    fn malformed_and_stale_candles_are_ignored() {
        let mut candles = make_candles(&[
            (9.0, 10.0, 8.0, 9.0),
            (8.5, 9.0, 7.0, 8.5),
            (10.0, 11.0, 9.0, 10.5),
            (8.0, 8.0, 6.0, 6.5),
        ]);
        let mut bad = candles[1];
        bad.high = f64::NAN;
        let mut stale = candles[2];
        stale.time = candles[0].time;
        let mut raw: Vec<_> = candles.iter().copied().collect();
        raw.insert(1, bad);
        raw.insert(2, stale);
        candles = raw.into();
        let series = SwingDetector::new().detect(&candles);
        assert!(!series.accepted[1]);
        assert!(!series.accepted[2]);
        assert!(series.swings[1].is_none() && series.swings[2].is_none());
        assert_eq!(series.swings[4].as_ref().map(|s| s.kind), Some(SwingKind::High));
    }

    #[test]
    fn registrations_order_high_first() {
        let candles = make_candles(&[
            (100.0, 102.0, 99.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 108.0, 95.0, 96.0),
            (97.0, 112.0, 96.5, 111.0),
        ]);
        let series = SwingDetector::new().detect(&candles);
        let regs = registrations(&series.swings);
        let at_two: Vec<_> = regs.iter().filter(|r| r.index == 2).map(|r| r.side).collect();
        assert_eq!(at_two, vec![Side::High, Side::Low]);
        assert!(regs.windows(2).all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn registrations_sort_by_time_then_index() {
        let candles = make_candles(&[(10.0, 11.0, 9.0, 10.5); 4]);
        let mut swings: Vec<Option<Swing>> = vec![None; 4];
        let mut double = Swing::new(&candles, 1, Side::High, 3);
        double.kind = double.kind.with(Side::Low);
        double.registered.low = Some(3);
        swings[1] = Some(double);
        swings[0] = Some(Swing::new(&candles, 0, Side::Low, 3));
        swings[2] = Some(Swing::new(&candles, 2, Side::High, 2));

        let order: Vec<_> = registrations(&swings)
            .iter()
            .map(|r| (r.at, r.index, r.side))
            .collect();
        assert_eq!(
            order,
            vec![
                (2, 2, Side::High),
                (3, 0, Side::Low),
                (3, 1, Side::High),
                (3, 1, Side::Low),
            ]
        );
    }
}
