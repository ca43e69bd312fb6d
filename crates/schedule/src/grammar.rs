//! 8-field schedule grammar (spec §4.A): tokens, field ranges, and the
//! per-field matcher built from a parsed token.

use crate::error::ScheduleError;

/// Positional field, in the order the grammar assigns them:
/// `second minute hour day_of_week week day month year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Second,
    Minute,
    Hour,
    DayOfWeek,
    Week,
    Day,
    Month,
    Year,
}

/// Positional order the grammar assigns fields in, leftmost first.
pub const FIELD_ORDER: [FieldKind; 8] = [
    FieldKind::Second,
    FieldKind::Minute,
    FieldKind::Hour,
    FieldKind::DayOfWeek,
    FieldKind::Week,
    FieldKind::Day,
    FieldKind::Month,
    FieldKind::Year,
];

impl FieldKind {
    /// Whether `?` is permitted in this field (spec §4.A).
    pub fn allows_question_mark(&self) -> bool {
        matches!(self, FieldKind::Second | FieldKind::Minute | FieldKind::Hour)
    }

    /// Inclusive `(min, max)` range for this field. `current_year` anchors
    /// the open-ended `year >= current` constraint (spec §4.A); used only
    /// for range-checking explicit year tokens, not as an upper bound on
    /// evaluation (`Any`/`Interval` on `year` run forward indefinitely,
    /// bounded only by the evaluator's search horizon).
    pub fn range(&self, current_year: i64) -> (i64, i64) {
        match self {
            FieldKind::Second | FieldKind::Minute => (0, 59),
            FieldKind::Hour => (0, 23),
            FieldKind::DayOfWeek => (0, 6),
            FieldKind::Week => (1, 53),
            FieldKind::Day => (1, 31),
            FieldKind::Month => (1, 12),
            FieldKind::Year => (current_year, current_year + 100),
        }
    }
}

/// Which occurrence of a weekday within its month an `NthWeekday` matcher
/// pins to (e.g. "2nd mon" = the second Monday of the month).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    Nth(u32),
    Last,
}

/// A single field's resolved matching rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    Any,
    Value(i64),
    /// `*/N` — every Nth value starting from the field's range floor.
    Interval(i64),
    Range(i64, i64),
    /// Day-of-week only: "2nd mon", "last fri", etc.
    NthWeekday { weekday: i64, occurrence: Occurrence },
    List(Vec<Matcher>),
}

const WEEKDAY_NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

fn weekday_from_name(s: &str) -> Option<i64> {
    WEEKDAY_NAMES
        .iter()
        .position(|w| w.eq_ignore_ascii_case(s))
        .map(|i| i as i64)
}

fn occurrence_from_ordinal(s: &str) -> Option<Occurrence> {
    if s.eq_ignore_ascii_case("last") {
        return Some(Occurrence::Last);
    }
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let n: u32 = digits.parse().ok()?;
    if n == 0 || n > 5 {
        return None;
    }
    Some(Occurrence::Nth(n))
}

/// Resolve a single atom (no comma, no range, no interval) to an integer,
/// accepting day-of-week names for [`FieldKind::DayOfWeek`].
fn resolve_atom(s: &str, field: FieldKind, current_year: i64) -> Result<i64, ScheduleError> {
    if field == FieldKind::DayOfWeek {
        if let Some(v) = weekday_from_name(s) {
            return Ok(v);
        }
    }
    let v: i64 = s
        .parse()
        .map_err(|_| ScheduleError::InvalidToken(s.to_string(), field))?;
    let (lo, hi) = field.range(current_year);
    if v < lo || v > hi {
        return Err(ScheduleError::OutOfRange(v, field, lo, hi));
    }
    Ok(v)
}

/// Parse one comma-separated component (no further commas inside) into a
/// [`Matcher`]. `raw` may be a plain value, a range `A-B`, an interval
/// `*/N`, `*`, or (day-of-week only) an "Nth weekday" composite that has
/// already been space-normalized by [`crate::wildcard::normalize_underscore_tokens`]
/// (e.g. "2nd mon").
fn parse_component(raw: &str, field: FieldKind, current_year: i64) -> Result<Matcher, ScheduleError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ScheduleError::EmptyField(field));
    }
    if raw == "*" {
        return Ok(Matcher::Any);
    }
    if raw == "?" {
        return Err(if field.allows_question_mark() {
            ScheduleError::UnresolvedWildcard(field)
        } else {
            ScheduleError::WildcardNotAllowed(field)
        });
    }
    if let Some(step) = raw.strip_prefix("*/") {
        let n: i64 = step
            .parse()
            .map_err(|_| ScheduleError::InvalidInterval(raw.to_string()))?;
        if n < 1 {
            return Err(ScheduleError::InvalidInterval(raw.to_string()));
        }
        return Ok(Matcher::Interval(n));
    }
    if field == FieldKind::DayOfWeek {
        if let Some((ord, wd)) = raw.split_once(' ') {
            if let (Some(occurrence), Some(weekday)) =
                (occurrence_from_ordinal(ord), weekday_from_name(wd))
            {
                return Ok(Matcher::NthWeekday { weekday, occurrence });
            }
            return Err(ScheduleError::InvalidToken(raw.to_string(), field));
        }
    }
    if let Some((a, b)) = raw.split_once('-') {
        // Guard against a bare negative number being mistaken for a range.
        if !a.is_empty() && !b.is_empty() {
            let lo = resolve_atom(a, field, current_year)?;
            let hi = resolve_atom(b, field, current_year)?;
            return Ok(Matcher::Range(lo, hi));
        }
    }
    Ok(Matcher::Value(resolve_atom(raw, field, current_year)?))
}

/// Parse a full field string (comma-list permitted) into a [`Matcher`].
pub fn parse_field(raw: &str, field: FieldKind, current_year: i64) -> Result<Matcher, ScheduleError> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() == 1 {
        return parse_component(parts[0], field, current_year);
    }
    let matchers = parts
        .into_iter()
        .map(|p| parse_component(p, field, current_year))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Matcher::List(matchers))
}

/// Split a (already underscore-normalized) schedule string into its
/// positional field strings, honoring the day-of-week "Nth weekday"
/// composite's embedded space (spec §9 "Schedule token with spaces").
///
/// Trailing positions may be omitted; this only returns as many entries
/// as the input actually provides (spec §4.A "Trailing positions may be
/// omitted").
pub fn tokenize_positional(schedule: &str) -> Result<Vec<String>, ScheduleError> {
    let words: Vec<&str> = schedule.split_whitespace().collect();
    if words.is_empty() {
        return Err(ScheduleError::EmptySchedule);
    }

    let mut fields = Vec::with_capacity(8);
    let mut i = 0;
    let mut field_idx = 0;

    while i < words.len() && field_idx < FIELD_ORDER.len() {
        let field = FIELD_ORDER[field_idx];
        if field == FieldKind::DayOfWeek && i + 1 < words.len() {
            let (ord, wd) = (words[i], words[i + 1]);
            // Only a comma-free ordinal+weekday pair merges into one field;
            // any comma list at this position is a plain day-of-week list.
            if !ord.contains(',')
                && occurrence_from_ordinal(ord).is_some()
                && weekday_from_name(wd).is_some()
            {
                fields.push(format!("{ord} {wd}"));
                i += 2;
                field_idx += 1;
                continue;
            }
        }
        fields.push(words[i].to_string());
        i += 1;
        field_idx += 1;
    }

    if i < words.len() {
        return Err(ScheduleError::TooManyFields(
            words.iter().map(|s| s.to_string()).collect(),
        ));
    }

    Ok(fields)
}
