use chrono::{Datelike, NaiveDate, Timelike};
use chrono_tz::US::Eastern;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::models::{Candle, CandleSeries};

/// Trading sessions in US/Eastern wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    Asia,
    London,
    NewYork,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Asia => write!(f, "asia"),
            Session::London => write!(f, "london"),
            Session::NewYork => write!(f, "new_york"),
        }
    }
}

impl Session {
    pub const ALL: [Session; 3] = [Session::Asia, Session::London, Session::NewYork];

    /// (start, end) as minutes of the Eastern day.
    pub fn window(self) -> (u32, u32) {
        match self {
            Session::Asia => (20 * 60, 0),
            Session::London => (2 * 60, 5 * 60),
            Session::NewYork => (7 * 60, 10 * 60),
        }
    }

    pub fn contains(self, minute_of_day: u32) -> bool {
        let (start, end) = self.window();
        if start < end {
            minute_of_day >= start && minute_of_day < end
        } else {
            // wraps midnight (Asia 20:00 - 00:00)
            minute_of_day >= start || minute_of_day < end
        }
    }

    /// Session a candle opens in, with the Eastern calendar date.
    pub fn of(candle: &Candle) -> Option<(Session, NaiveDate)> {
        let et = candle.datetime()?.with_timezone(&Eastern);
        let minute = et.hour() * 60 + et.minute();
        Session::ALL
            .into_iter()
            .find(|s| s.contains(minute))
            .map(|s| (s, et.date_naive()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRange {
    pub session: Session,
    pub date: NaiveDate,
    pub start_index: usize,
    pub end_index: usize,
    pub high: f64,
    pub low: f64,
}

/// High/low of every session run in the series. Consecutive candles of the
/// same session and Eastern date form one range.
pub fn session_ranges(candles: &CandleSeries) -> Vec<SessionRange> {
    let mut out: Vec<SessionRange> = Vec::new();
    let mut current: Option<SessionRange> = None;

    for (i, c) in candles.iter().enumerate() {
        if !c.is_well_formed() {
            continue;
        }
        let Some((session, date)) = Session::of(c) else {
            out.extend(current.take());
            continue;
        };
        match current.as_mut() {
            Some(r) if r.session == session && r.date == date => {
                r.end_index = i;
                r.high = r.high.max(c.high);
                r.low = r.low.min(c.low);
            }
            _ => {
                out.extend(current.take());
                current = Some(SessionRange {
                    session,
                    date,
                    start_index: i,
                    end_index: i,
                    high: c.high,
                    low: c.low,
                });
            }
        }
    }
    out.extend(current);

    debug!("Sessions: {} ranges", out.len());
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRange {
    pub year: i32,
    pub week: u32,
    pub start_index: usize,
    pub end_index: usize,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

/// One range per ISO week (UTC).
pub fn weekly_ranges(candles: &CandleSeries) -> Vec<WeeklyRange> {
    let mut out: Vec<WeeklyRange> = Vec::new();

    for (i, c) in candles.iter().enumerate() {
        if !c.is_well_formed() {
            continue;
        }
        let Some(dt) = c.datetime() else { continue };
        let iso = dt.iso_week();
        match out.last_mut() {
            Some(w) if w.year == iso.year() && w.week == iso.week() => {
                w.end_index = i;
                w.close = c.close;
                w.high = w.high.max(c.high);
                w.low = w.low.min(c.low);
            }
            _ => out.push(WeeklyRange {
                year: iso.year(),
                week: iso.week(),
                start_index: i,
                end_index: i,
                open: c.open,
                close: c.close,
                high: c.high,
                low: c.low,
            }),
        }
    }

    debug!("Weekly: {} ranges", out.len());
    out
}
