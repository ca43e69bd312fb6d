use thiserror::Error;

use crate::grammar::FieldKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("field {0:?} has no content")]
    EmptyField(FieldKind),

    #[error("'{0}' is not a valid token for field {1:?}")]
    InvalidToken(String, FieldKind),

    #[error("'{0}' is out of range for field {1:?} ({2}-{3})")]
    OutOfRange(i64, FieldKind, i64, i64),

    #[error("interval step in '{0}' must be >= 1")]
    InvalidInterval(String),

    #[error("'?' is only permitted in second, minute, or hour — found in {0:?}")]
    WildcardNotAllowed(FieldKind),

    #[error("schedule contains unresolved '?' wildcard in {0:?} — resolve before evaluating")]
    UnresolvedWildcard(FieldKind),

    #[error("schedule has too many positional fields (max 8): {0:?}")]
    TooManyFields(Vec<String>),

    #[error("schedule string is empty")]
    EmptySchedule,
}
