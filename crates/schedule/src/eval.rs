//! Parsed schedule expressions and `next_fire` evaluation (spec §4.A).

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::error::ScheduleError;
use crate::grammar::{self, FieldKind, Matcher, Occurrence, FIELD_ORDER};

/// How far forward `next_fire` will search before giving up on a schedule
/// that can never match (e.g. `year` pinned to a value already in the
/// past combined with a `day_of_week`/`day` pair that never coincides).
/// A brute-force minute-stepping search has no natural termination for
/// such expressions, so this bounds the cost instead of looping forever.
const SEARCH_HORIZON_DAYS: i64 = 8 * 366;

/// A fully parsed 8-field schedule. Each field holds the [`Matcher`] built
/// from its token; omitted trailing fields default to [`Matcher::Any`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleExpression {
    pub raw: String,
    pub second: Matcher,
    pub minute: Matcher,
    pub hour: Matcher,
    pub day_of_week: Matcher,
    pub week: Matcher,
    pub day: Matcher,
    pub month: Matcher,
    pub year: Matcher,
}

impl ScheduleExpression {
    /// Parse a schedule string. The string must already have its `?`
    /// wildcards resolved (see [`crate::wildcard::resolve_wildcards`]) —
    /// a bare `?` surviving to this point is reported as
    /// [`ScheduleError::UnresolvedWildcard`].
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let current_year = current_year();
        let fields = grammar::tokenize_positional(raw)?;

        let mut parsed: Vec<Matcher> = Vec::with_capacity(FIELD_ORDER.len());
        for (idx, field) in FIELD_ORDER.iter().enumerate() {
            let matcher = if idx < fields.len() {
                grammar::parse_field(&fields[idx], *field, current_year)?
            } else {
                Matcher::Any
            };
            parsed.push(matcher);
        }

        Ok(Self {
            raw: raw.to_string(),
            second: parsed[0].clone(),
            minute: parsed[1].clone(),
            hour: parsed[2].clone(),
            day_of_week: parsed[3].clone(),
            week: parsed[4].clone(),
            day: parsed[5].clone(),
            month: parsed[6].clone(),
            year: parsed[7].clone(),
        })
    }

    /// First instant strictly after `after`, in `tz`, at which every field
    /// matches. Returns `None` if nothing matches within
    /// [`SEARCH_HORIZON_DAYS`] of `after`.
    pub fn next_fire(&self, after: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz: Tz = after.timezone();
        let horizon = after + Duration::days(SEARCH_HORIZON_DAYS);

        let mut cursor = (after + Duration::minutes(1))
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))?;

        while cursor <= horizon {
            let date = cursor.date_naive();
            if self.date_and_hour_match(date, cursor.hour() as i64) && self.minute_matches(cursor.minute() as i64)
            {
                if let Some(sec) = self.first_matching_second() {
                    // `.single()` would return `None` (and stop the whole
                    // search via `?`) on a DST gap/fold minute; `.earliest()`
                    // resolves the ambiguity instead, so a fire candidate
                    // that lands in a gap/fold is still found rather than
                    // silently dropped.
                    if let Some(fire) = tz
                        .with_ymd_and_hms(date.year(), date.month(), date.day(), cursor.hour(), cursor.minute(), sec as u32)
                        .earliest()
                    {
                        if fire > after {
                            return Some(fire);
                        }
                    }
                }
            }
            cursor += Duration::minutes(1);
        }
        None
    }

    fn date_and_hour_match(&self, date: NaiveDate, hour: i64) -> bool {
        field_matches(FieldKind::Year, &self.year, date.year() as i64, date)
            && field_matches(FieldKind::Month, &self.month, date.month() as i64, date)
            && field_matches(FieldKind::Day, &self.day, date.day() as i64, date)
            && field_matches(FieldKind::Week, &self.week, date.iso_week().week() as i64, date)
            && field_matches(
                FieldKind::DayOfWeek,
                &self.day_of_week,
                date.weekday().num_days_from_monday() as i64,
                date,
            )
            && field_matches(FieldKind::Hour, &self.hour, hour, date)
    }

    fn minute_matches(&self, minute: i64) -> bool {
        // date argument is unused for non-day_of_week fields.
        field_matches(FieldKind::Minute, &self.minute, minute, NaiveDate::MIN)
    }

    /// Smallest second in `0..60` matching `self.second`, if any.
    fn first_matching_second(&self) -> Option<i64> {
        (0..60).find(|s| field_matches(FieldKind::Second, &self.second, *s, NaiveDate::MIN))
    }
}

fn current_year() -> i64 {
    chrono::Utc::now().year() as i64
}

fn interval_floor(field: FieldKind) -> i64 {
    match field {
        FieldKind::Second | FieldKind::Minute | FieldKind::Hour | FieldKind::DayOfWeek => 0,
        FieldKind::Week | FieldKind::Day | FieldKind::Month => 1,
        FieldKind::Year => 1970,
    }
}

fn field_matches(field: FieldKind, matcher: &Matcher, value: i64, date: NaiveDate) -> bool {
    match matcher {
        Matcher::Any => true,
        Matcher::Value(v) => *v == value,
        Matcher::Range(lo, hi) => value >= *lo && value <= *hi,
        Matcher::Interval(n) => (value - interval_floor(field)).rem_euclid(*n) == 0,
        Matcher::List(list) => list.iter().any(|m| field_matches(field, m, value, date)),
        Matcher::NthWeekday { weekday, occurrence } => {
            field == FieldKind::DayOfWeek && value == *weekday && occurrence_matches(*occurrence, date)
        }
    }
}

fn occurrence_matches(occurrence: Occurrence, date: NaiveDate) -> bool {
    match occurrence {
        Occurrence::Nth(n) => ((date.day() - 1) / 7 + 1) == n,
        Occurrence::Last => date.day() + 7 > days_in_month(date.year(), date.month()),
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("valid calendar date");
    let first_of_this = NaiveDate::from_ymd_opt(year, month, 1).expect("valid calendar date");
    (first_of_next - first_of_this).num_days() as u32
}
