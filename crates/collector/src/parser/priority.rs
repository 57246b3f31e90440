use thiserror::Error;
use super::model::Priority;

/// Longest accepted priority token including the opening `<` (three digits).
pub const PRIORITY_MAX_LEN: usize = 5;

const PRI_PART_START: u8 = b'<';
const PRI_PART_END: u8 = b'>';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriorityError {
    #[error("Empty line")]
    Empty,

    #[error("Priority must start with '<'")]
    NoStart,

    #[error("Priority is missing its closing '>'")]
    NoEnd,

    #[error("Priority has no digits")]
    TooShort,

    #[error("Priority is longer than {PRIORITY_MAX_LEN} bytes")]
    TooLong,

    #[error("Non-digit byte {0:#04x} in priority")]
    NonDigit(u8),

    #[error("Priority value {0} is out of range")]
    OutOfRange(u16),
}

/// Parse the leading `<PRI>` token.
///
/// Returns the decoded priority and the index of the first byte after `>`.
pub fn parse_priority(line: &[u8]) -> Result<(Priority, usize), PriorityError> {
    let first = *line.first().ok_or(PriorityError::Empty)?;
    if first != PRI_PART_START {
        return Err(PriorityError::NoStart);
    }

    let mut value: u16 = 0;
    for (i, &c) in line.iter().enumerate().skip(1) {
        if i >= PRIORITY_MAX_LEN {
            return Err(PriorityError::TooLong);
        }
        if c == PRI_PART_END {
            if i == 1 {
                return Err(PriorityError::TooShort);
            }
            let pri = u8::try_from(value)
                .ok()
                .and_then(Priority::from_value)
                .ok_or(PriorityError::OutOfRange(value))?;
            return Ok((pri, i + 1));
        }
        if !c.is_ascii_digit() {
            return Err(PriorityError::NonDigit(c));
        }
        value = value * 10 + u16::from(c - b'0');
    }

    Err(PriorityError::NoEnd)
}
