//! Identity and ordering types.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote-assigned message identity.
///
/// Monotonically increasing per account. Zero is never a real message and
/// is used by the service to mean "nothing".
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// Wrap a raw id without validation.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Wrap a raw id, rejecting zero and negatives.
    pub fn positive(value: i64) -> Result<Self, ValidationError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidMessageId(value))
        }
    }

    /// Raw integer value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whether this id can be acknowledged.
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

/// Notification priority, -2 (lowest) to 2 (emergency).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Priority(i8);

impl Priority {
    /// Lowest accepted priority.
    pub const MIN: i64 = -2;
    /// Highest accepted priority.
    pub const MAX: i64 = 2;

    /// Normal priority. The service treats this as "not set".
    pub const NORMAL: Priority = Priority(0);

    /// Raw integer value.
    pub fn value(&self) -> i64 {
        i64::from(self.0)
    }

    /// Whether this is the default priority (omitted on the wire).
    pub fn is_normal(&self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i64> for Priority {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as i8))
        } else {
            Err(ValidationError::PriorityOutOfRange(value))
        }
    }
}

impl From<Priority> for i64 {
    fn from(p: Priority) -> Self {
        p.value()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Priority({})", self.0)
    }
}
