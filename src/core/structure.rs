use serde::{Deserialize, Serialize};
use tracing::debug;

use super::swings::{registrations, Swing};
use crate::models::{CandleSeries, CrossKind, PerSide, Side};

/// A structural line from an anchor swing to the candle that resolved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cross {
    pub from: usize,
    pub to: Option<usize>,
    /// Boundary the line polices.
    pub side: Side,
    pub kind: CrossKind,
    pub is_fake: bool,
    pub is_confirmed: bool,
    /// Resolved by a wick only (inducements) or swept before confirming (breaks).
    pub is_sweep: bool,
    pub liquidity_candle: Option<usize>,
}

impl Cross {
    fn pending_inducement(from: usize, side: Side) -> Self {
        Self {
            from,
            to: None,
            side,
            kind: CrossKind::Inducement,
            is_fake: false,
            is_confirmed: false,
            is_sweep: false,
            liquidity_candle: None,
        }
    }

    pub fn span(&self) -> usize {
        self.to.map_or(0, |to| to.saturating_sub(self.from))
    }
}

/// Crosses aligned to the candle index, one slot per side.
pub type CrossSlots = Vec<PerSide<Option<Cross>>>;

pub fn iter_crosses(slots: &[PerSide<Option<Cross>>]) -> impl Iterator<Item = &Cross> {
    slots
        .iter()
        .flat_map(|ps| [ps.high.as_ref(), ps.low.as_ref()])
        .flatten()
}

/// A confirmed extremum and the inducement that confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtremumRecord {
    pub index: usize,
    pub side: Side,
    pub anchor: usize,
    pub confirmed_at: usize,
}

/// Candles during which a swing side carried the extremum flag: from its
/// promotion up to, not including, its demotion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtremumSpan {
    pub index: usize,
    pub side: Side,
    pub from: usize,
    pub until: Option<usize>,
}

impl ExtremumSpan {
    pub fn covers(&self, at: usize) -> bool {
        self.from <= at && self.until.map_or(true, |u| u > at)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Structure {
    /// Inducement crosses keyed by anchor swing index.
    pub inducements: CrossSlots,
    /// Break crosses keyed by the broken extremum's index.
    pub breaks: CrossSlots,
    pub extrema: Vec<ExtremumRecord>,
    pub spans: Vec<ExtremumSpan>,
    pub internal_removed: usize,
}

impl Structure {
    /// Confirmed breaks ordered by confirmation index.
    pub fn confirmed_breaks(&self) -> Vec<&Cross> {
        let mut out: Vec<&Cross> = iter_crosses(&self.breaks)
            .filter(|c| c.is_confirmed)
            .collect();
        out.sort_by_key(|c| (c.to, c.from));
        out
    }

    pub fn fake_breaks(&self) -> impl Iterator<Item = &Cross> {
        iter_crosses(&self.breaks).filter(|c| c.is_fake)
    }

    pub fn confirmed_inducements(&self) -> impl Iterator<Item = &Cross> {
        iter_crosses(&self.inducements).filter(|c| c.is_confirmed)
    }
}

/// `[min low, max high]` over the cross's candles.
fn price_range(candles: &CandleSeries, cross: &Cross) -> Option<(f64, f64)> {
    let to = cross.to?;
    Some((candles.min_low(cross.from, to), candles.max_high(cross.from, to)))
}

/// `inner` starts after and resolves before `outer`, on the same side, and
/// stays inside its price range.
pub fn is_nested(candles: &CandleSeries, outer: &Cross, inner: &Cross) -> bool {
    if outer.side != inner.side || outer.from >= inner.from {
        return false;
    }
    let (Some(outer_to), Some(inner_to)) = (outer.to, inner.to) else {
        return false;
    };
    if inner_to >= outer_to {
        return false;
    }
    match (price_range(candles, outer), price_range(candles, inner)) {
        (Some((olo, ohi)), Some((ilo, ihi))) => ilo >= olo && ihi <= ohi,
        _ => false,
    }
}

/// Drop every confirmed break nested inside another confirmed break.
pub fn filter_nested(candles: &CandleSeries, breaks: &[Cross]) -> Vec<Cross> {
    breaks
        .iter()
        .filter(|b| !breaks.iter().any(|outer| is_nested(candles, outer, b)))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    anchor: Option<usize>,
    confirmed: bool,
}

#[derive(Debug, Clone, Copy)]
struct BreakScan {
    from: usize,
    level: f64,
    liquidity_candle: Option<usize>,
}

/// Extremum/inducement tracker and break classifier, run as one pass over
/// the candle index so each confirmation is visible to the next candle.
pub struct StructureTracker<'a> {
    candles: &'a CandleSeries,
    swings: &'a mut [Option<Swing>],
    accepted: &'a [bool],
    extremum: PerSide<Option<Candidate>>,
    last_swing: PerSide<Option<usize>>,
    confirmed_at: PerSide<Option<usize>>,
    /// Last anchor that confirmed an extremum of each side.
    consumed: PerSide<Option<usize>>,
    scans: PerSide<Option<BreakScan>>,
    last_break_side: Option<Side>,
    fake_retired: PerSide<bool>,
    confirmed_breaks: Vec<(usize, Side)>,
    /// Candle currently being processed.
    at: usize,
    out: Structure,
}

impl<'a> StructureTracker<'a> {
    pub fn new(
        candles: &'a CandleSeries,
        swings: &'a mut [Option<Swing>],
        accepted: &'a [bool],
    ) -> Self {
        let n = candles.len();
        Self {
            candles,
            swings,
            accepted,
            extremum: PerSide::default(),
            last_swing: PerSide::default(),
            confirmed_at: PerSide::default(),
            consumed: PerSide::default(),
            scans: PerSide::default(),
            last_break_side: None,
            fake_retired: PerSide::default(),
            confirmed_breaks: Vec::new(),
            at: 0,
            out: Structure {
                inducements: vec![PerSide::default(); n],
                breaks: vec![PerSide::default(); n],
                ..Default::default()
            },
        }
    }

    pub fn run(mut self) -> Structure {
        let regs = registrations(&*self.swings);
        let mut next = 0;

        for i in 0..self.candles.len() {
            self.at = i;
            while next < regs.len() && regs[next].at == i {
                self.on_swing(regs[next].index, regs[next].side);
                next += 1;
            }
            if !self.accepted.get(i).copied().unwrap_or(false) {
                continue;
            }
            for side in Side::BOTH {
                self.step_scan(side, i);
            }
            for side in Side::BOTH {
                self.check_confirmation(side, i);
            }
        }

        for side in Side::BOTH {
            if let Some(scan) = self.scans[side].take() {
                self.retire(scan, side);
            }
        }

        debug!(
            "Structure: {} extrema confirmed, {} inducements, {} breaks ({} fake), {} internal removed",
            self.out.extrema.len(),
            self.out.confirmed_inducements().count(),
            self.out.confirmed_breaks().len(),
            self.out.fake_breaks().count(),
            self.out.internal_removed
        );
        self.out
    }

    fn price(&self, index: usize, side: Side) -> f64 {
        self.candles[index].price(side)
    }

    fn unflag(&mut self, index: usize, side: Side) {
        if let Some(s) = self.swings[index].as_mut() {
            s.is_extremum[side] = false;
            s.inducement[side] = None;
        }
        let at = self.at;
        if let Some(span) = self
            .out
            .spans
            .iter_mut()
            .rev()
            .find(|p| p.index == index && p.side == side && p.until.is_none())
        {
            span.until = Some(at);
        }
    }

    fn drop_pending(&mut self, anchor: usize, anchor_side: Side) {
        let slot = &mut self.out.inducements[anchor][anchor_side];
        if slot.as_ref().is_some_and(|c| !c.is_confirmed) {
            *slot = None;
        }
    }

    /// Most recent opposite swing before `index` not already spent on a
    /// confirmation of `side`.
    fn fresh_anchor(&self, side: Side, index: usize) -> Option<usize> {
        let consumed = self.consumed[side];
        self.last_swing[side.opposite()]
            .filter(|&a| a < index && consumed.map_or(true, |c| a > c))
    }

    fn on_swing(&mut self, s: usize, side: Side) {
        let opp = side.opposite();
        self.last_swing[side] = Some(s);

        if self.confirmed_at[opp].is_some_and(|c| c >= s) {
            return;
        }

        let price = self.price(s, side);
        let promote = match self.extremum[side] {
            None => true,
            Some(cur) => side.beyond(price, self.price(cur.index, side)),
        };
        if !promote {
            return;
        }

        let anchor = self.fresh_anchor(side, s);
        if let Some(prev) = self.extremum[side] {
            if !prev.confirmed {
                self.unflag(prev.index, side);
                // LL-HH-HH: an extremum formed after the opposite one leaves
                // its inducement line in place.
                let keep = self.extremum[opp].is_some_and(|o| prev.index > o.index);
                if let Some(a) = prev.anchor.filter(|&a| !keep && Some(a) != anchor) {
                    self.drop_pending(a, opp);
                }
            }
        }

        self.extremum[side] = Some(Candidate {
            index: s,
            anchor,
            confirmed: false,
        });
        if let Some(sw) = self.swings[s].as_mut() {
            sw.is_extremum[side] = true;
            sw.inducement[side] = anchor;
        }
        self.out.spans.push(ExtremumSpan {
            index: s,
            side,
            from: self.at,
            until: None,
        });
        if let Some(a) = anchor {
            let slot = &mut self.out.inducements[a][opp];
            if slot.is_none() {
                *slot = Some(Cross::pending_inducement(a, opp));
            }
        }
    }

    fn check_confirmation(&mut self, side: Side, i: usize) {
        let Some(cand) = self.extremum[side] else {
            return;
        };
        if cand.confirmed || i <= cand.index {
            return;
        }
        let Some(anchor) = cand.anchor else {
            return;
        };

        let opp = side.opposite();
        let level = self.price(anchor, opp);
        let c = self.candles[i];
        if !opp.beyond(c.price(opp), level) {
            return;
        }

        let is_sweep = !opp.beyond(c.close, level);
        if let Some(cross) = self.out.inducements[anchor][opp].as_mut() {
            cross.to = Some(i);
            cross.is_confirmed = true;
            cross.is_sweep = is_sweep;
        }
        if is_sweep {
            if let Some(sw) = self.swings[i].as_mut() {
                if sw.includes(opp) {
                    sw.is_inducement_sweep = true;
                }
            }
        }

        self.extremum[side] = Some(Candidate {
            confirmed: true,
            ..cand
        });
        self.confirmed_at[side] = Some(i);
        self.consumed[side] = Some(anchor);
        self.out.extrema.push(ExtremumRecord {
            index: cand.index,
            side,
            anchor,
            confirmed_at: i,
        });

        // the opposite extremum search restarts from here
        if let Some(o) = self.extremum[opp].take() {
            if !o.confirmed {
                self.unflag(o.index, opp);
                if let Some(oa) = o.anchor {
                    self.drop_pending(oa, side);
                }
            }
        }

        self.open_scan(cand.index, side, i);
    }

    fn open_scan(&mut self, from: usize, side: Side, upto: usize) {
        if let Some(old) = self.scans[side].take() {
            self.retire(old, side);
        }
        self.scans[side] = Some(BreakScan {
            from,
            level: self.price(from, side),
            liquidity_candle: None,
        });
        for k in (from + 1)..=upto {
            if !self.accepted[k] {
                continue;
            }
            if self.step_scan(side, k) {
                break;
            }
        }
    }

    /// Advance the open scan on `side` by candle `k`. Returns true when the
    /// break confirmed.
    fn step_scan(&mut self, side: Side, k: usize) -> bool {
        let c = self.candles[k];
        let Some(scan) = self.scans[side].as_mut() else {
            return false;
        };
        if k <= scan.from {
            return false;
        }
        if side.beyond(c.close, scan.level) {
            let scan = *scan;
            self.scans[side] = None;
            self.confirm_break(scan, side, k);
            return true;
        }
        if side.beyond(c.price(side), scan.level) {
            scan.liquidity_candle = Some(k);
            scan.level = c.price(side);
        }
        false
    }

    fn classify(&self, side: Side) -> CrossKind {
        match self.last_break_side {
            None => CrossKind::BreakOfStructure,
            Some(prev) if prev != side => CrossKind::ChangeOfCharacter,
            Some(_) if self.fake_retired[side] => CrossKind::ChangeOfCharacter,
            Some(_) => CrossKind::BreakOfStructure,
        }
    }

    fn confirm_break(&mut self, scan: BreakScan, side: Side, k: usize) {
        let cross = Cross {
            from: scan.from,
            to: Some(k),
            side,
            kind: self.classify(side),
            is_fake: false,
            is_confirmed: true,
            is_sweep: scan.liquidity_candle.is_some(),
            liquidity_candle: scan.liquidity_candle,
        };

        let candles = self.candles;
        let breaks = &mut self.out.breaks;
        let before = self.confirmed_breaks.len();
        self.confirmed_breaks.retain(|&(from, s)| {
            let nested = breaks[from][s]
                .as_ref()
                .is_some_and(|inner| is_nested(candles, &cross, inner));
            if nested {
                breaks[from][s] = None;
            }
            !nested
        });
        self.out.internal_removed += before - self.confirmed_breaks.len();

        self.out.breaks[scan.from][side] = Some(cross);
        self.confirmed_breaks.push((scan.from, side));
        self.last_break_side = Some(side);
        self.fake_retired = PerSide::default();
    }

    /// Close a scan that never confirmed. Only a swept scan leaves a trace.
    fn retire(&mut self, scan: BreakScan, side: Side) {
        let Some(lq) = scan.liquidity_candle else {
            return;
        };
        self.out.breaks[scan.from][side] = Some(Cross {
            from: scan.from,
            to: Some(lq),
            side,
            kind: self.classify(side),
            is_fake: true,
            is_confirmed: false,
            is_sweep: true,
            liquidity_candle: Some(lq),
        });
        self.fake_retired[side] = true;
    }
}

/// Run the tracker over detector output, updating swing flags in place.
pub fn track_structure(
    candles: &CandleSeries,
    swings: &mut [Option<Swing>],
    accepted: &[bool],
) -> Structure {
    StructureTracker::new(candles, swings, accepted).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::swings::SwingDetector;
    use crate::test_helpers::{
        make_bullish_structure, make_candles, make_choch_structure, BULLISH_STRUCTURE,
    };

    fn run(candles: &CandleSeries) -> (Vec<Option<Swing>>, Structure) {
        let series = SwingDetector::new().detect(candles);
        let mut swings = series.swings;
        let structure = track_structure(candles, &mut swings, &series.accepted);
        (swings, structure)
    }

    #[test]
    fn bullish_structure_confirms_extrema() {
        let candles = make_bullish_structure();
        let (swings, structure) = run(&candles);

        let extrema: Vec<_> = structure
            .extrema
            .iter()
            .map(|e| (e.index, e.side, e.anchor, e.confirmed_at))
            .collect();
        assert_eq!(
            extrema,
            vec![
                (4, Side::Low, 2, 6),
                (9, Side::High, 8, 10),
                (11, Side::Low, 9, 12),
            ]
        );

        let idm = structure.inducements[8].low.as_ref().expect("inducement at 8");
        assert!(idm.is_confirmed);
        assert_eq!(idm.to, Some(10));
        assert!(!idm.is_sweep, "candle 10 closed below the inducement");

        assert!(swings[9].as_ref().unwrap().is_extremum.high);
        assert_eq!(swings[9].as_ref().unwrap().inducement.high, Some(8));
        assert!(!swings[7].as_ref().unwrap().is_extremum.high, "7 was superseded by 9");
    }

    #[test]
    fn close_above_confirmed_high_is_break_of_structure() {
        let candles = make_bullish_structure();
        let (_, structure) = run(&candles);

        let bos = structure.breaks[9].high.as_ref().expect("break of the high at 9");
        assert_eq!(bos.kind, CrossKind::BreakOfStructure);
        assert_eq!(bos.to, Some(12));
        assert!(bos.is_confirmed);
        assert!(!bos.is_fake);
        assert_eq!(structure.confirmed_breaks().len(), 1);
    }

    #[test]
    fn opposite_side_break_is_change_of_character() {
        let candles = make_choch_structure();
        let (_, structure) = run(&candles);

        let choch = structure.breaks[11].low.as_ref().expect("break of the low at 11");
        assert_eq!(choch.kind, CrossKind::ChangeOfCharacter);
        assert_eq!(choch.to, Some(14));
        let kinds: Vec<_> = structure.confirmed_breaks().iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![CrossKind::BreakOfStructure, CrossKind::ChangeOfCharacter]
        );
    }

    #[test]
    fn swept_scan_left_open_is_fake() {
        let mut rows = BULLISH_STRUCTURE.to_vec();
        rows.push((118.5, 118.8, 104.0, 110.0)); // wicks under 105, closes back
        let candles = make_candles(&rows);
        let (_, structure) = run(&candles);

        let fake = structure.breaks[11].low.as_ref().expect("fake break of 11");
        assert!(fake.is_fake);
        assert!(!fake.is_confirmed);
        assert_eq!(fake.liquidity_candle, Some(13));
        assert_eq!(structure.fake_breaks().count(), 1);
    }

    #[test]
    fn pending_inducement_is_dropped_when_opposite_confirms() {
        let candles = make_bullish_structure();
        let (swings, structure) = run(&candles);
        // 12 was promoted with anchor 11 and discarded when 11 confirmed
        assert!(structure.inducements[11].low.is_none());
        assert!(!swings[12].as_ref().unwrap().is_extremum.high);
    }

    #[test]
    fn nested_break_inside_wider_break() {
        let candles = make_candles(&[
            (10.0, 20.0, 5.0, 15.0),
            (15.0, 16.0, 9.0, 12.0),
            (12.0, 14.0, 10.0, 13.0),
            (13.0, 15.0, 11.0, 14.5),
            (14.5, 21.0, 14.0, 20.5),
        ]);
        let outer = Cross {
            from: 0,
            to: Some(4),
            side: Side::High,
            kind: CrossKind::BreakOfStructure,
            is_fake: false,
            is_confirmed: true,
            is_sweep: false,
            liquidity_candle: None,
        };
        let inner = Cross {
            from: 1,
            to: Some(3),
            ..outer.clone()
        };
        assert!(is_nested(&candles, &outer, &inner));
        assert!(!is_nested(&candles, &inner, &outer));

        let low_side = Cross {
            side: Side::Low,
            ..inner.clone()
        };
        assert!(!is_nested(&candles, &outer, &low_side));

        let kept = filter_nested(&candles, &[outer.clone(), inner]);
        assert_eq!(kept, vec![outer]);
    }

    fn manual_swings(
        candles: &CandleSeries,
        marks: &[(usize, Side, usize)],
    ) -> Vec<Option<Swing>> {
        let mut swings = vec![None; candles.len()];
        for &(index, side, registered_at) in marks {
            swings[index] = Some(Swing::new(candles, index, side, registered_at));
        }
        swings
    }

    fn span(structure: &Structure, index: usize, side: Side) -> ExtremumSpan {
        *structure
            .spans
            .iter()
            .rev()
            .find(|p| p.index == index && p.side == side)
            .expect("span recorded")
    }

    #[test]
    fn spans_close_when_an_extremum_is_superseded() {
        let candles = make_bullish_structure();
        let (swings, structure) = run(&candles);

        let nine_registered = swings[9].as_ref().unwrap().registered.high;
        assert_eq!(span(&structure, 7, Side::High).until, nine_registered);
        assert_eq!(span(&structure, 9, Side::High).until, None);
        assert!(span(&structure, 9, Side::High).covers(candles.len() - 1));
        assert!(structure
            .spans
            .iter()
            .all(|p| p.until.map_or(true, |u| p.from <= u)));
    }

    #[test]
    fn swing_older_than_opposite_confirmation_is_ignored() {
        let candles = make_candles(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 105.0, 100.0, 104.5), // 1 high
            (104.5, 104.8, 95.0, 95.5),   // 2 low, takes 99 and confirms 1
            (95.5, 103.0, 95.2, 102.5),
            (102.5, 106.0, 102.0, 105.5), // 4 closes above 105
        ]);
        let mut swings = manual_swings(
            &candles,
            &[(0, Side::Low, 1), (1, Side::High, 2), (2, Side::Low, 3)],
        );
        let accepted = vec![true; candles.len()];
        let structure = track_structure(&candles, &mut swings, &accepted);

        let extrema: Vec<_> = structure
            .extrema
            .iter()
            .map(|e| (e.index, e.side, e.anchor, e.confirmed_at))
            .collect();
        assert_eq!(extrema, vec![(1, Side::High, 0, 2)]);
        assert!(!swings[2].as_ref().unwrap().is_extremum.low);
        assert!(structure.inducements[1].high.is_none());

        let bos = structure.breaks[1].high.as_ref().expect("break of the high at 1");
        assert_eq!(bos.kind, CrossKind::BreakOfStructure);
        assert_eq!(bos.to, Some(4));
    }

    #[test]
    fn higher_high_after_the_low_keeps_earlier_inducement() {
        let candles = make_candles(&[
            (91.0, 93.0, 90.0, 92.0),    // 0 low
            (92.0, 100.0, 91.0, 99.0),   // 1 high
            (99.0, 99.5, 95.0, 96.0),    // 2 higher low
            (96.0, 105.0, 95.5, 104.0),  // 3 higher high
            (104.0, 104.5, 100.0, 101.0),
        ]);
        let mut swings = manual_swings(
            &candles,
            &[
                (0, Side::Low, 1),
                (1, Side::High, 2),
                (2, Side::Low, 3),
                (3, Side::High, 4),
            ],
        );
        let accepted = vec![true; candles.len()];
        let structure = track_structure(&candles, &mut swings, &accepted);

        let kept = structure.inducements[0].low.as_ref().expect("line under 0 kept");
        assert!(!kept.is_confirmed);
        let fresh = structure.inducements[2].low.as_ref().expect("line under 2");
        assert!(!fresh.is_confirmed);

        assert!(!swings[1].as_ref().unwrap().is_extremum.high);
        let high = swings[3].as_ref().unwrap();
        assert!(high.is_extremum.high);
        assert_eq!(high.inducement.high, Some(2));
        assert_eq!(span(&structure, 1, Side::High).until, Some(4));
    }

    #[test]
    fn break_after_retired_fake_is_change_of_character() {
        let candles = make_candles(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 100.9, 99.5, 100.8),
            (102.0, 104.0, 101.0, 103.5), // 2 closes above 101
            (103.5, 106.0, 103.0, 105.0),
            (105.0, 107.0, 104.0, 104.5), // 4 wicks above 106
            (104.5, 108.0, 104.0, 107.5),
            (107.5, 110.0, 107.0, 109.5), // 6 closes above 108
            (109.5, 112.0, 109.0, 111.5), // 7 closes above 110
        ]);
        let mut swings = vec![None; candles.len()];
        let accepted = vec![true; candles.len()];
        let mut tracker = StructureTracker::new(&candles, &mut swings, &accepted);

        tracker.open_scan(0, Side::High, 0);
        assert!(!tracker.step_scan(Side::High, 1));
        assert!(tracker.step_scan(Side::High, 2));
        tracker.open_scan(3, Side::High, 3);
        assert!(!tracker.step_scan(Side::High, 4));
        // replacing the swept scan retires it as fake
        tracker.open_scan(5, Side::High, 5);
        assert!(tracker.step_scan(Side::High, 6));
        tracker.open_scan(6, Side::High, 6);
        assert!(tracker.step_scan(Side::High, 7));

        let breaks = &tracker.out.breaks;
        let first = breaks[0].high.as_ref().unwrap();
        assert_eq!(first.kind, CrossKind::BreakOfStructure);
        assert_eq!(first.to, Some(2));

        let fake = breaks[3].high.as_ref().expect("fake break of 3");
        assert!(fake.is_fake);
        assert_eq!(fake.liquidity_candle, Some(4));

        let choch = breaks[5].high.as_ref().unwrap();
        assert_eq!(choch.kind, CrossKind::ChangeOfCharacter);
        assert_eq!(choch.to, Some(6));

        let next = breaks[6].high.as_ref().unwrap();
        // a confirmed break clears the fake
        assert_eq!(next.kind, CrossKind::BreakOfStructure);
    }

    #[test]
    fn wider_break_removes_nested_break_during_the_pass() {
        let candles = make_candles(&[
            (10.0, 20.0, 5.0, 15.0),
            (15.0, 16.0, 9.0, 12.0),
            (12.0, 14.0, 10.0, 13.0),
            (13.0, 17.0, 11.0, 16.5),  // 3 closes above 16
            (16.5, 21.0, 14.0, 20.5),  // 4 closes above 20
        ]);
        let mut swings = vec![None; candles.len()];
        let accepted = vec![true; candles.len()];
        let mut tracker = StructureTracker::new(&candles, &mut swings, &accepted);

        tracker.open_scan(1, Side::High, 2);
        assert!(tracker.step_scan(Side::High, 3));
        assert!(tracker.out.breaks[1].high.is_some());

        tracker.open_scan(0, Side::High, 3);
        assert!(tracker.step_scan(Side::High, 4));

        assert!(tracker.out.breaks[1].high.is_none(), "inner break removed");
        assert_eq!(tracker.out.breaks[0].high.as_ref().unwrap().to, Some(4));
        assert_eq!(tracker.out.internal_removed, 1);
        assert_eq!(tracker.confirmed_breaks, vec![(0, Side::High)]);
    }
}
