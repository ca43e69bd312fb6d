//! `?` wildcard resolution and underscore/space token normalization
//! (spec §4.A, §9).

use rand::Rng;

use crate::error::ScheduleError;
use crate::grammar::{self, FieldKind, FIELD_ORDER};

/// Replace underscores with spaces, but only inside tokens that look like
/// an "Nth weekday" composite (`2nd_mon`, `last_fri`). Plain tokens that
/// happen to contain an underscore for some other reason are left alone.
///
/// Applied once at ingress. Idempotent: a token with no underscore left
/// to split on is returned unchanged, so normalizing an already-normalized
/// schedule is a no-op (spec §9's double-substitution round trip).
pub fn normalize_underscore_tokens(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| match word.split_once('_') {
            Some((ord, wd)) if is_ordinal_weekday_pair(ord, wd) => format!("{ord} {wd}"),
            _ => word.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_ordinal_weekday_pair(ord: &str, wd: &str) -> bool {
    let ordinal_ok = ord.eq_ignore_ascii_case("last") || is_ordinal(ord);
    let weekday_ok = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"]
        .iter()
        .any(|w| w.eq_ignore_ascii_case(wd));
    ordinal_ok && weekday_ok
}

fn is_ordinal(s: &str) -> bool {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(n) = s.strip_suffix(suffix) {
            return !n.is_empty() && n.chars().all(|c| c.is_ascii_digit());
        }
    }
    false
}

/// Resolve every `?` in the second/minute/hour positions of `schedule` to
/// a concrete random value drawn once from that field's range, returning
/// the rewritten schedule string. Fields other than second/minute/hour
/// never contain `?` by the time this runs — [`grammar::parse_component`]
/// rejects it there.
///
/// `schedule` is expected to already be underscore-normalized.
pub fn resolve_wildcards(schedule: &str) -> Result<String, ScheduleError> {
    let mut fields = grammar::tokenize_positional(schedule)?;
    let mut rng = rand::thread_rng();

    for (idx, field) in FIELD_ORDER.iter().enumerate() {
        if idx >= fields.len() {
            break;
        }
        if fields[idx] != "?" {
            continue;
        }
        if !field.allows_question_mark() {
            return Err(ScheduleError::WildcardNotAllowed(*field));
        }
        let (lo, hi) = field.range(current_year(*field));
        let resolved = rng.gen_range(lo..=hi);
        fields[idx] = resolved.to_string();
    }

    Ok(fields.join(" "))
}

fn current_year(field: FieldKind) -> i64 {
    // Only second/minute/hour ever reach here; their range doesn't
    // depend on the anchor year, so any value works.
    debug_assert!(field.allows_question_mark());
    2000
}
