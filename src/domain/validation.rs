use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty {
        field: &'static str,
    },
    Length {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },
    TooMany {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },
    InvalidPhoneNumber {
        input: String,
    },
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },
    UnsupportedMessageType {
        channel: &'static str,
        message_type: &'static str,
    },
    InvertedRange {
        start: &'static str,
        end: &'static str,
    },
    Conflict {
        first: &'static str,
        second: &'static str,
    },
    NothingToUpdate,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::Length {
                field,
                min,
                max,
                actual,
            } => write!(
                f,
                "{field} length out of range: {actual} (expected {min}..={max})"
            ),
            Self::TooMany { field, max, actual } => {
                write!(f, "too many {field}: {actual} (max {max})")
            }
            Self::OutOfRange {
                field,
                min,
                max,
                actual,
            } => write!(
                f,
                "{field} out of range: {actual} (expected {min}..={max})"
            ),
            Self::InvalidPhoneNumber { input } => write!(f, "invalid phone number: {input}"),
            Self::InvalidFormat { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::UnsupportedMessageType {
                channel,
                message_type,
            } => write!(
                f,
                "channel {channel} does not support message type {message_type}"
            ),
            Self::InvertedRange { start, end } => {
                write!(f, "{start} must not be later than {end}")
            }
            Self::Conflict { first, second } => {
                write!(f, "{first} and {second} must differ")
            }
            Self::NothingToUpdate => write!(f, "update request carries no changes"),
        }
    }
}

impl std::error::Error for ValidationError {}
