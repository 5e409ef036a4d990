/*!
The error type shared by the encoder, the decoder and the writer.

Every failure is terminal for the call that raised it, and the instance that
raised it is left unusable.
*/

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid additional info {1} for major type {0}")]
    InvalidAdditionalInfo(u8, u8),

    #[error("Indefinite length is not permitted for major type {0}")]
    InvalidIndefinite(u8),

    #[error("Break stop code outside of an indefinite-length item")]
    UnexpectedBreak,

    #[error("Indefinite-length string contains an invalid chunk of major type {0}")]
    InvalidChunk(u8),

    #[error("Invalid simple value {0}")]
    InvalidSimple(u8),

    #[error(transparent)]
    InvalidUtf8(#[from] core::str::Utf8Error),

    #[error("Not enough data for encoded value")]
    NotEnoughData,

    #[error("Map is missing the value for its final key")]
    PartialMap,

    #[error("Additional data after the end of the root item")]
    AdditionalItems,

    #[error("Cannot encode value of type {0}")]
    Unencodable(&'static str),

    #[error("A map key of type {0} cannot be used in an object")]
    InvalidKey(&'static str),

    #[error("Invalid date/time: {0}")]
    InvalidDate(String),

    #[error("Maximum nesting depth of {0} exceeded")]
    MaxDepth(usize),

    #[error("Integer {0} is outside the encodable range")]
    IntegerOutOfRange(i128),

    #[error("Length {0} exceeds the addressable range")]
    LengthOutOfRange(u64),

    #[error("Unsafe map key {0}")]
    UnsafeKey(String),

    #[error("Circular reference detected")]
    CircularReference,

    #[error("Instance is unusable after a previous error")]
    Poisoned,

    #[error("{0}")]
    Custom(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input.
    Syntax,
    /// The input ended early.
    TooLittleData,
    /// The input continued after the root item.
    TooMuchData,
    /// A value could not be represented.
    Type,
    /// A depth or numeric range limit was reached.
    ResourceLimit,
    /// A key or reference was rejected to protect the consumer.
    Safety,
    /// The instance raised earlier, or a caller-supplied function failed.
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAdditionalInfo(..)
            | Self::InvalidIndefinite(_)
            | Self::UnexpectedBreak
            | Self::InvalidChunk(_)
            | Self::InvalidSimple(_)
            | Self::InvalidUtf8(_) => ErrorKind::Syntax,
            Self::NotEnoughData | Self::PartialMap => ErrorKind::TooLittleData,
            Self::AdditionalItems => ErrorKind::TooMuchData,
            Self::Unencodable(_) | Self::InvalidKey(_) | Self::InvalidDate(_) => ErrorKind::Type,
            Self::MaxDepth(_) | Self::IntegerOutOfRange(_) | Self::LengthOutOfRange(_) => {
                ErrorKind::ResourceLimit
            }
            Self::UnsafeKey(_) | Self::CircularReference => ErrorKind::Safety,
            Self::Poisoned | Self::Custom(_) => ErrorKind::Other,
        }
    }
}
