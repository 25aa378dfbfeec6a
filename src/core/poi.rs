use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::imbalance::{fair_value_gap, find_imbalance};
use super::structure::{iter_crosses, ExtremumSpan, Structure};
use super::swings::Swing;
use super::trend::{trend_at, TrendPoint};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{Candle, CandleSeries, CrossKind, Direction, OrderType, PoiType, Side};

/// A tradeable zone anchored to the structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    /// Anchor candle (the swing for swing-anchored types).
    pub index: usize,
    pub time: i64,
    pub side: Side,
    pub poi_type: PoiType,
    pub start_candle: usize,
    pub last_orderblock_candle: usize,
    pub last_imbalance_candle: usize,
    pub top: f64,
    pub bottom: f64,
    /// Limit price: the zone edge nearest the market.
    pub entry: f64,
    pub stop_loss: f64,
    /// Candle at which the structural preconditions are met.
    pub evaluation_index: usize,
    pub can_test: bool,
    pub can_trade: bool,
    pub take_profit: Option<f64>,
    /// First candle after the imbalance that traded back into the zone.
    pub end_index: Option<usize>,
    pub is_smt: bool,
    pub reasons: Vec<String>,
}

impl Poi {
    pub fn direction(&self) -> Direction {
        self.side.trade_direction()
    }

    pub fn order_type(&self) -> OrderType {
        self.poi_type.order_type()
    }
}

fn touches(c: &Candle, side: Side, entry: f64) -> bool {
    match side {
        Side::High => c.high >= entry,
        Side::Low => c.low <= entry,
    }
}

#[derive(Debug, Clone, Copy)]
struct Zone {
    top: f64,
    bottom: f64,
    last_orderblock: usize,
    last_imbalance: usize,
}

#[derive(Debug, Clone, Copy)]
struct BreakerSource {
    zone: Zone,
    confirmed_at: usize,
}

/// A POI before the eligibility pass.
struct Draft {
    poi_type: PoiType,
    index: usize,
    side: Side,
    zone: Zone,
    stop_loss: f64,
    evaluation_index: usize,
    genuine: bool,
    reasons: Vec<String>,
}

impl Draft {
    fn new(
        poi_type: PoiType,
        index: usize,
        side: Side,
        zone: Zone,
        evaluation_index: usize,
    ) -> Self {
        let stop_loss = match side {
            Side::High => zone.top,
            Side::Low => zone.bottom,
        };
        Self {
            poi_type,
            index,
            side,
            zone,
            stop_loss,
            evaluation_index,
            genuine: true,
            reasons: Vec::new(),
        }
    }

    fn reject(&mut self, reason: impl Into<String>) {
        self.genuine = false;
        self.reasons.push(reason.into());
    }
}

type Builder = fn(&PoiDetector<'_>, usize) -> Result<Option<Poi>>;

const BUILDERS: [(PoiType, Builder); 7] = [
    (PoiType::ExtremumOrderBlock, extremum_order_block as Builder),
    (PoiType::InducementOrderBlock, inducement_order_block as Builder),
    (PoiType::InducementSweep, inducement_sweep as Builder),
    (PoiType::ExtremumSweep, extremum_sweep as Builder),
    (PoiType::ChochInducement, choch_inducement as Builder),
    (PoiType::FairValueGap, fair_value_gap_zone as Builder),
    (PoiType::BreakerBlock, breaker_block as Builder),
];

/// Builds POIs from finished structure. Lookups are keyed by
/// `(candle index, side)` so each builder is a pure function of one anchor.
pub struct PoiDetector<'a> {
    candles: &'a CandleSeries,
    swings: &'a [Option<Swing>],
    trend: &'a [TrendPoint],
    config: &'a EngineConfig,
    /// Confirmed extremum -> confirmation index.
    confirmed_extremum: HashMap<(usize, Side), usize>,
    /// Inducement anchor -> confirmation index of its extremum.
    inducement_of: HashMap<(usize, Side), usize>,
    /// Wick-only inducement take -> anchor.
    inducement_sweeps: HashMap<(usize, Side), usize>,
    /// Break-scan liquidity candle -> broken extremum.
    liquidity: HashMap<(usize, Side), usize>,
    /// Origin of a change of character -> confirmation index.
    choch_origins: HashMap<(usize, Side), usize>,
    breakers: HashMap<(usize, Side), BreakerSource>,
    /// Extremum flag history per swing side.
    spans: HashMap<(usize, Side), ExtremumSpan>,
}

impl<'a> PoiDetector<'a> {
    pub fn new(
        candles: &'a CandleSeries,
        swings: &'a [Option<Swing>],
        structure: &Structure,
        trend: &'a [TrendPoint],
        config: &'a EngineConfig,
    ) -> Result<Self> {
        let mut det = Self {
            candles,
            swings,
            trend,
            config,
            confirmed_extremum: HashMap::new(),
            inducement_of: HashMap::new(),
            inducement_sweeps: HashMap::new(),
            liquidity: HashMap::new(),
            choch_origins: HashMap::new(),
            breakers: HashMap::new(),
            spans: structure
                .spans
                .iter()
                .map(|p| ((p.index, p.side), *p))
                .collect(),
        };

        for r in &structure.extrema {
            det.confirmed_extremum
                .entry((r.index, r.side))
                .or_insert(r.confirmed_at);
            det.inducement_of
                .entry((r.anchor, r.side.opposite()))
                .or_insert(r.confirmed_at);
        }

        for idm in structure.confirmed_inducements().filter(|c| c.is_sweep) {
            if let Some(to) = idm.to {
                det.inducement_sweeps.entry((to, idm.side)).or_insert(idm.from);
            }
        }

        for b in iter_crosses(&structure.breaks) {
            if let Some(lq) = b.liquidity_candle {
                det.liquidity.entry((lq, b.side)).or_insert(b.from);
            }
        }

        for b in structure.confirmed_breaks() {
            let Some(to) = b.to else { continue };
            let origin_side = b.side.opposite();
            let Some(origin) = det.origin_swing(b.from, to, origin_side) else {
                continue;
            };

            if b.kind == CrossKind::ChangeOfCharacter {
                det.choch_origins.entry((origin, origin_side)).or_insert(to);
            }

            // the broken extremum's own order block, closed through
            if let Some(zone) = det.order_block(b.from, b.side)? {
                let close = det.candles[to].close;
                let far_edge = match b.side {
                    Side::High => zone.top,
                    Side::Low => zone.bottom,
                };
                if b.side.beyond(close, far_edge) {
                    det.breakers.entry((origin, origin_side)).or_insert(BreakerSource {
                        zone,
                        confirmed_at: to,
                    });
                }
            }
        }

        Ok(det)
    }

    fn swing(&self, index: usize) -> Option<&Swing> {
        self.swings.get(index)?.as_ref()
    }

    /// Most extreme swing on `side` strictly between `from` and `to`.
    fn origin_swing(&self, from: usize, to: usize, side: Side) -> Option<usize> {
        ((from + 1)..to)
            .filter(|&k| self.swing(k).is_some_and(|s| s.includes(side)))
            .reduce(|best, k| {
                if side.beyond(self.candles[k].price(side), self.candles[best].price(side)) {
                    k
                } else {
                    best
                }
            })
    }

    /// Zone from `anchor` to the start of the first imbalance after it. The
    /// imbalance must point away from the anchor on `side`.
    fn order_block(&self, anchor: usize, side: Side) -> Result<Option<Zone>> {
        let n = self.candles.len();
        if anchor + 2 >= n {
            return Ok(None);
        }
        let end = (anchor + 1 + self.config.imbalance_lookahead).min(n);
        let Some(imb) = find_imbalance(self.candles, anchor, end)? else {
            return Ok(None);
        };
        if imb.side != side {
            return Ok(None);
        }
        Ok(Some(Zone {
            top: self.candles.max_high(anchor, imb.first),
            bottom: self.candles.min_low(anchor, imb.first),
            last_orderblock: imb.first,
            last_imbalance: imb.last,
        }))
    }

    fn is_extremum_at(&self, index: usize, side: Side, at: usize) -> bool {
        self.spans.get(&(index, side)).is_some_and(|p| p.covers(at))
    }

    /// Nearest opposite extremum beyond `entry` that is visible and untaken
    /// at `eval`.
    fn take_profit(&self, side: Side, entry: f64, eval: usize) -> Option<f64> {
        let target = side.opposite();
        let last = eval.min(self.candles.len().saturating_sub(1));
        (0..=last)
            .filter_map(|s| {
                let sw = self.swing(s)?;
                if !sw.includes(target)
                    || !self.is_extremum_at(s, target, eval)
                    || !sw.registered[target].is_some_and(|r| r <= eval)
                {
                    return None;
                }
                let price = sw.price(target);
                if !target.beyond(price, entry)
                    || self.candles.any_beyond(target, price, s + 1, eval)
                {
                    return None;
                }
                Some(price)
            })
            .min_by(|a, b| (a - entry).abs().total_cmp(&(b - entry).abs()))
    }

    fn finish(&self, draft: Draft) -> Poi {
        let n = self.candles.len();
        let Draft {
            poi_type,
            index,
            side,
            zone,
            stop_loss,
            evaluation_index: eval,
            genuine,
            mut reasons,
        } = draft;
        let required = side.required_trend();
        let entry = match side {
            Side::High => zone.bottom,
            Side::Low => zone.top,
        };

        let eval_trend = trend_at(self.trend, eval);
        let can_test = genuine && eval_trend == required;
        if genuine && !can_test {
            reasons.push(format!(
                "trend {} at {}, zone needs {}",
                eval_trend, eval, required
            ));
        }

        let end_index =
            ((zone.last_imbalance + 1)..n).find(|&k| touches(&self.candles[k], side, entry));
        let is_smt = end_index.is_some_and(|e| e <= eval);
        if let Some(e) = end_index.filter(|_| is_smt) {
            reasons.push(format!("zone touched at {} before structure at {}", e, eval));
        }

        let take_profit = self.take_profit(side, entry, eval);
        if take_profit.is_none() {
            reasons.push("no untaken target beyond entry".to_string());
        }

        let flipped = if can_test && n > 0 {
            let until = end_index.unwrap_or(n - 1);
            ((eval + 1)..=until).find(|&k| trend_at(self.trend, k) != required)
        } else {
            None
        };
        if let Some(k) = flipped {
            reasons.push(format!("trend flipped at {} before the zone was reached", k));
        }

        let enabled = self.config.trades(poi_type);
        if !enabled {
            reasons.push(format!("trading disabled for {}", poi_type));
        }

        Poi {
            index,
            time: self.candles[index].time,
            side,
            poi_type,
            start_candle: index,
            last_orderblock_candle: zone.last_orderblock,
            last_imbalance_candle: zone.last_imbalance,
            top: zone.top,
            bottom: zone.bottom,
            entry,
            stop_loss,
            evaluation_index: eval,
            can_test,
            can_trade: can_test && enabled && take_profit.is_some() && !is_smt && flipped.is_none(),
            take_profit,
            end_index,
            is_smt,
            reasons,
        }
    }

    /// Slot priority: tradeable first, then types with trading enabled.
    fn rank(&self, poi: &Poi) -> (bool, bool) {
        (poi.can_trade, self.config.trades(poi.poi_type))
    }

    /// One slot per candle. Every type is built; the trade toggles only
    /// decide `can_trade`. A slot keeps its first POI unless a later one
    /// ranks higher.
    pub fn detect(&self) -> Result<Vec<Option<Poi>>> {
        let n = self.candles.len();
        let mut slots: Vec<Option<Poi>> = vec![None; n];
        for i in 0..n {
            for (_, build) in &BUILDERS {
                let Some(poi) = build(self, i)? else { continue };
                let slot = &mut slots[i];
                let replace = match slot {
                    None => true,
                    Some(held) => self.rank(&poi) > self.rank(held),
                };
                if replace {
                    *slot = Some(poi);
                }
            }
        }

        let built = slots.iter().flatten().count();
        let tradeable = slots.iter().flatten().filter(|p| p.can_trade).count();
        debug!(
            "POIs: {} built, {} tradeable ({} types enabled)",
            built,
            tradeable,
            self.config.enabled_types().len()
        );
        Ok(slots)
    }
}

fn extremum_order_block(det: &PoiDetector<'_>, i: usize) -> Result<Option<Poi>> {
    let Some(swing) = det.swing(i) else {
        return Ok(None);
    };
    for &side in swing.kind.sides() {
        let confirmed = det.confirmed_extremum.get(&(i, side)).copied();
        if confirmed.is_none() && !swing.is_extremum[side] {
            continue;
        }
        let Some(zone) = det.order_block(i, side)? else {
            continue;
        };
        let mut draft = Draft::new(
            PoiType::ExtremumOrderBlock,
            i,
            side,
            zone,
            confirmed.unwrap_or(i),
        );
        if confirmed.is_none() {
            draft.reject("extremum not confirmed");
        }
        return Ok(Some(det.finish(draft)));
    }
    Ok(None)
}

fn inducement_order_block(det: &PoiDetector<'_>, i: usize) -> Result<Option<Poi>> {
    for side in Side::BOTH {
        let Some(&eval) = det.inducement_of.get(&(i, side)) else {
            continue;
        };
        if !det.swing(i).is_some_and(|s| s.includes(side)) {
            continue;
        }
        if let Some(zone) = det.order_block(i, side)? {
            let draft = Draft::new(PoiType::InducementOrderBlock, i, side, zone, eval);
            return Ok(Some(det.finish(draft)));
        }
    }
    Ok(None)
}

/// Shared by both sweep types: the sweep candle must be a swing on the swept
/// side and print an inefficiency wick there.
fn sweep_zone(
    det: &PoiDetector<'_>,
    poi_type: PoiType,
    i: usize,
    side: Side,
) -> Result<Option<Poi>> {
    if !det.swing(i).is_some_and(|s| s.includes(side)) {
        return Ok(None);
    }
    let Some(zone) = det.order_block(i, side)? else {
        return Ok(None);
    };
    let candle = &det.candles[i];
    let mut draft = Draft::new(poi_type, i, side, zone, i);
    draft.stop_loss = candle.price(side);
    if !candle.is_ifc(side) {
        draft.reject("sweep candle is not an inefficiency candle");
    }
    Ok(Some(det.finish(draft)))
}

fn inducement_sweep(det: &PoiDetector<'_>, i: usize) -> Result<Option<Poi>> {
    for side in Side::BOTH {
        if det.inducement_sweeps.contains_key(&(i, side)) {
            if let Some(poi) = sweep_zone(det, PoiType::InducementSweep, i, side)? {
                return Ok(Some(poi));
            }
        }
    }
    Ok(None)
}

fn extremum_sweep(det: &PoiDetector<'_>, i: usize) -> Result<Option<Poi>> {
    for side in Side::BOTH {
        if det.liquidity.contains_key(&(i, side)) {
            if let Some(poi) = sweep_zone(det, PoiType::ExtremumSweep, i, side)? {
                return Ok(Some(poi));
            }
        }
    }
    Ok(None)
}

fn choch_inducement(det: &PoiDetector<'_>, i: usize) -> Result<Option<Poi>> {
    for side in Side::BOTH {
        let Some(&eval) = det.choch_origins.get(&(i, side)) else {
            continue;
        };
        if let Some(zone) = det.order_block(i, side)? {
            let draft = Draft::new(PoiType::ChochInducement, i, side, zone, eval);
            return Ok(Some(det.finish(draft)));
        }
    }
    Ok(None)
}

fn fair_value_gap_zone(det: &PoiDetector<'_>, i: usize) -> Result<Option<Poi>> {
    let last = i + 2 - det.config.fvg_offset.min(2);
    if last >= det.candles.len() {
        return Ok(None);
    }
    let Some(imb) = fair_value_gap(det.candles, last) else {
        return Ok(None);
    };
    let zone = Zone {
        top: imb.top,
        bottom: imb.bottom,
        last_orderblock: i,
        last_imbalance: imb.last,
    };
    let draft = Draft::new(PoiType::FairValueGap, i, imb.side, zone, imb.last);
    Ok(Some(det.finish(draft)))
}

fn breaker_block(det: &PoiDetector<'_>, i: usize) -> Result<Option<Poi>> {
    for side in Side::BOTH {
        let Some(src) = det.breakers.get(&(i, side)) else {
            continue;
        };
        // the flipped zone is only retested after the break closes through it
        let zone = Zone {
            last_imbalance: src.confirmed_at,
            ..src.zone
        };
        let mut draft = Draft::new(PoiType::BreakerBlock, i, side, zone, src.confirmed_at);
        draft.stop_loss = det.candles[i].price(side);
        return Ok(Some(det.finish(draft)));
    }
    Ok(None)
}
