use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Film,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => f.write_str("user"),
            Entity::Film => f.write_str("film"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyField,
    InvalidFormat,
    MissingField,
    FutureDate,
    TooLong,
    NotPositive,
    NotFound,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EmptyField => "empty_field",
            ErrorKind::InvalidFormat => "invalid_format",
            ErrorKind::MissingField => "missing_field",
            ErrorKind::FutureDate => "future_date",
            ErrorKind::TooLong => "too_long",
            ErrorKind::NotPositive => "not_positive",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} must not be in the future: {date}")]
    FutureDate { field: &'static str, date: NaiveDate },

    #[error("{field} must be at most {max} characters, got {len}")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("{entity} with id {id} not found")]
    NotFound { entity: Entity, id: u64 },

    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

impl Error {
    pub fn not_found(entity: Entity, id: u64) -> Self {
        Error::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyField { .. } => ErrorKind::EmptyField,
            Error::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Error::MissingField { .. } => ErrorKind::MissingField,
            Error::FutureDate { .. } => ErrorKind::FutureDate,
            Error::TooLong { .. } => ErrorKind::TooLong,
            Error::NotPositive { .. } => ErrorKind::NotPositive,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Database(_) | Error::Codec(_) => ErrorKind::Storage,
        }
    }

    /// True for the field validation kinds, which the caller can fix by changing the payload.
    pub fn is_validation(&self) -> bool {
        !matches!(self.kind(), ErrorKind::NotFound | ErrorKind::Storage)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
