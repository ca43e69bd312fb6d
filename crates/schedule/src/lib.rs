//! 8-field cron-like schedule grammar: parsing, `?` wildcard resolution,
//! and `next_fire` evaluation.
//!
//! Field order is `second minute hour day_of_week week day month year`.
//! Trailing fields may be omitted (default `*`). `?` is permitted only in
//! `second`/`minute`/`hour` and must be resolved via [`resolve_schedule`]
//! before the schedule is stored or evaluated.

pub mod error;
pub mod eval;
pub mod grammar;
pub mod wildcard;

pub use error::ScheduleError;
pub use eval::ScheduleExpression;
pub use grammar::{FieldKind, Matcher, Occurrence};

/// Normalize underscore-joined "Nth weekday" tokens and resolve any `?`
/// wildcards, returning the canonical schedule string ready for storage
/// and parsing. Idempotent: re-running this on its own output is a no-op.
use chrono::Datelike;

pub fn resolve_schedule(raw: &str) -> Result<String, ScheduleError> {
    let normalized = wildcard::normalize_underscore_tokens(raw);
    wildcard::resolve_wildcards(&normalized)
}

/// Validate a schedule string without resolving wildcards — used by the
/// job validator to reject malformed grammar up front, independent of
/// whichever random values a later [`resolve_schedule`] call would pick.
/// A bare `?` in second/minute/hour is accepted here (it's the point of
/// the field) and rejected only by [`ScheduleExpression::parse`], which
/// runs after resolution.
pub fn check_grammar(raw: &str) -> Result<(), ScheduleError> {
    let normalized = wildcard::normalize_underscore_tokens(raw);
    let fields = grammar::tokenize_positional(&normalized)?;
    let current_year = chrono::Utc::now().year() as i64;
    for (idx, field) in grammar::FIELD_ORDER.iter().enumerate() {
        if idx >= fields.len() {
            break;
        }
        let token = &fields[idx];
        if token == "?" {
            if !field.allows_question_mark() {
                return Err(ScheduleError::WildcardNotAllowed(*field));
            }
            continue;
        }
        grammar::parse_field(token, *field, current_year)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};
    use chrono_tz::UTC;

    #[test]
    fn every_five_minutes_at_second_25() {
        let expr = ScheduleExpression::parse("25 */5").unwrap();
        let after = UTC.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let next = expr.next_fire(after).unwrap();
        assert_eq!((next.minute(), next.second()), (0, 25));

        let after2 = UTC.with_ymd_and_hms(2026, 1, 1, 0, 1, 0).unwrap();
        let next2 = expr.next_fire(after2).unwrap();
        assert_eq!((next2.minute(), next2.second()), (5, 25));
    }

    #[test]
    fn wildcard_second_resolves_to_fixed_value_every_five_minutes() {
        let resolved = resolve_schedule("? */5").unwrap();
        let expr = ScheduleExpression::parse(&resolved).unwrap();
        let after = UTC.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let first = expr.next_fire(after).unwrap();
        let second = expr.next_fire(first).unwrap();
        // Same resolved second every time it fires, five minutes apart.
        assert_eq!(first.second(), second.second());
        assert_eq!((second.minute() - first.minute()).rem_euclid(60), 5);
    }

    #[test]
    fn wildcard_second_resolves_to_fixed_value_every_seven_minutes() {
        let resolved = resolve_schedule("? */7").unwrap();
        let expr = ScheduleExpression::parse(&resolved).unwrap();
        let after = UTC.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let first = expr.next_fire(after).unwrap();
        let second = expr.next_fire(first).unwrap();
        assert_eq!(first.second(), second.second());
        assert_eq!((second.minute() - first.minute()).rem_euclid(60), 7);
    }

    #[test]
    fn underscore_normalization_is_idempotent() {
        let once = wildcard::normalize_underscore_tokens("0 0 9 2nd_mon * * * *");
        let twice = wildcard::normalize_underscore_tokens(&once);
        assert_eq!(once, twice);
        assert_eq!(once, "0 0 9 2nd mon * * * *");
    }

    #[test]
    fn nth_weekday_matches_second_monday() {
        let expr = ScheduleExpression::parse("0 0 9 2nd mon * * * *").unwrap();
        // 2026-01-12 is the second Monday of January 2026.
        let after = UTC.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let next = expr.next_fire(after).unwrap();
        assert_eq!(next.day(), 12);
        assert_eq!(next.month(), 1);
    }

    #[test]
    fn last_friday_matches_final_occurrence() {
        let expr = ScheduleExpression::parse("0 0 17 last fri * * * *").unwrap();
        let after = UTC.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let next = expr.next_fire(after).unwrap();
        assert_eq!(next.day(), 30);
        assert_eq!(next.month(), 1);
    }

    #[test]
    fn question_mark_outside_allowed_fields_is_rejected() {
        let err = check_grammar("0 0 9 ? * * * *").unwrap_err();
        assert!(matches!(err, ScheduleError::WildcardNotAllowed(FieldKind::DayOfWeek)));
    }

    #[test]
    fn trailing_fields_default_to_any() {
        let expr = ScheduleExpression::parse("0 30 8").unwrap();
        assert_eq!(expr.month, Matcher::Any);
        assert_eq!(expr.year, Matcher::Any);
    }

    #[test]
    fn too_many_fields_is_rejected() {
        let err = check_grammar("0 0 0 0 0 0 0 0 0").unwrap_err();
        assert!(matches!(err, ScheduleError::TooManyFields(_)));
    }

    #[test]
    fn out_of_range_value_is_rejected() {
        let err = check_grammar("90 0 0").unwrap_err();
        assert!(matches!(err, ScheduleError::OutOfRange(90, FieldKind::Second, 0, 59)));
    }
}
