use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }

    /// Signed multiplier for price deltas: +1 for longs, -1 for shorts.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
            Trend::Neutral => write!(f, "neutral"),
        }
    }
}

/// Which boundary of price a swing, cross or zone refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    High,
    Low,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::High => write!(f, "high"),
            Side::Low => write!(f, "low"),
        }
    }
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::High, Side::Low];

    pub fn opposite(self) -> Side {
        match self {
            Side::High => Side::Low,
            Side::Low => Side::High,
        }
    }

    /// `a` lies beyond `b` on this side (higher for High, lower for Low).
    pub fn beyond(self, a: f64, b: f64) -> bool {
        match self {
            Side::High => a > b,
            Side::Low => a < b,
        }
    }

    /// Trade direction of a zone sitting on this side of price.
    pub fn trade_direction(self) -> Direction {
        match self {
            Side::High => Direction::Short,
            Side::Low => Direction::Long,
        }
    }

    /// Trend a zone on this side needs in order to be traded.
    pub fn required_trend(self) -> Trend {
        match self {
            Side::High => Trend::Bearish,
            Side::Low => Trend::Bullish,
        }
    }

    /// Trend established by breaking an extremum on this side.
    pub fn break_trend(self) -> Trend {
        match self {
            Side::High => Trend::Bullish,
            Side::Low => Trend::Bearish,
        }
    }
}

/// A value kept separately for the high and the low side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub high: T,
    pub low: T,
}

impl<T> Index<Side> for PerSide<T> {
    type Output = T;
    fn index(&self, side: Side) -> &T {
        match side {
            Side::High => &self.high,
            Side::Low => &self.low,
        }
    }
}

impl<T> IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::High => &mut self.high,
            Side::Low => &mut self.low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
    Double,
}

impl fmt::Display for SwingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwingKind::High => write!(f, "high"),
            SwingKind::Low => write!(f, "low"),
            SwingKind::Double => write!(f, "double"),
        }
    }
}

impl SwingKind {
    pub fn includes(self, side: Side) -> bool {
        matches!(
            (self, side),
            (SwingKind::Double, _) | (SwingKind::High, Side::High) | (SwingKind::Low, Side::Low)
        )
    }

    /// Sides in processing order (high before low for doubles).
    pub fn sides(self) -> &'static [Side] {
        match self {
            SwingKind::High => &[Side::High],
            SwingKind::Low => &[Side::Low],
            SwingKind::Double => &Side::BOTH,
        }
    }

    pub fn with(self, side: Side) -> SwingKind {
        if self.includes(side) {
            self
        } else {
            SwingKind::Double
        }
    }

    /// Remaining kind after dropping `side`, `None` when nothing is left.
    pub fn without(self, side: Side) -> Option<SwingKind> {
        match (self, side) {
            (SwingKind::Double, Side::High) => Some(SwingKind::Low),
            (SwingKind::Double, Side::Low) => Some(SwingKind::High),
            (kind, side) if kind.includes(side) => None,
            (kind, _) => Some(kind),
        }
    }
}

impl From<Side> for SwingKind {
    fn from(side: Side) -> Self {
        match side {
            Side::High => SwingKind::High,
            Side::Low => SwingKind::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossKind {
    Inducement,
    BreakOfStructure,
    ChangeOfCharacter,
}

impl fmt::Display for CrossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossKind::Inducement => write!(f, "IDM"),
            CrossKind::BreakOfStructure => write!(f, "BOS"),
            CrossKind::ChangeOfCharacter => write!(f, "CHoCH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoiType {
    ExtremumOrderBlock,
    InducementOrderBlock,
    InducementSweep,
    ExtremumSweep,
    ChochInducement,
    FairValueGap,
    BreakerBlock,
}

impl fmt::Display for PoiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PoiType {
    pub const ALL: [PoiType; 7] = [
        PoiType::ExtremumOrderBlock,
        PoiType::InducementOrderBlock,
        PoiType::InducementSweep,
        PoiType::ExtremumSweep,
        PoiType::ChochInducement,
        PoiType::FairValueGap,
        PoiType::BreakerBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoiType::ExtremumOrderBlock => "OB_EXT",
            PoiType::InducementOrderBlock => "OB_IDM",
            PoiType::InducementSweep => "IDM_IFC",
            PoiType::ExtremumSweep => "EXT_LQ_IFC",
            PoiType::ChochInducement => "CHOCH_IDM",
            PoiType::FairValueGap => "FVG",
            PoiType::BreakerBlock => "BREAKER",
        }
    }

    /// How a simulated position enters this zone.
    pub fn order_type(self) -> OrderType {
        match self {
            PoiType::InducementSweep | PoiType::ExtremumSweep => OrderType::Market,
            _ => OrderType::Limit,
        }
    }

    /// Whether the zone must be anchored on a swing of the same side.
    pub fn is_swing_anchored(self) -> bool {
        !matches!(self, PoiType::FairValueGap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    ClosedTp,
    ClosedSl,
    ClosedBreakeven,
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStatus::Open => write!(f, "open"),
            PositionStatus::ClosedTp => write!(f, "closed_tp"),
            PositionStatus::ClosedSl => write!(f, "closed_sl"),
            PositionStatus::ClosedBreakeven => write!(f, "closed_breakeven"),
        }
    }
}
