//! Error handling for the Sheaf columnar container.
//!
//! Every fallible operation in the Sheaf crates returns a [`SheafResult`].
//! The error kinds form a stable taxonomy: each on-wire inconsistency a
//! reader or writer can encounter maps to exactly one [`SheafError`]
//! variant, so callers can match on the failure class without parsing
//! message strings.

/// Convenience alias for results produced by the Sheaf crates.
pub type SheafResult<T> = Result<T, SheafError>;

/// The error type shared by all Sheaf crates.
///
/// The first nine variants correspond to on-wire conditions; they are part
/// of the codec contract and stable across releases. [`InvalidArgument`]
/// covers caller contract violations that never appear on the wire, such
/// as serializing against an unmapped descriptor ID.
///
/// [`InvalidArgument`]: SheafError::InvalidArgument
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SheafError {
    /// A read or write ran past the end of the supplied bytes.
    #[error("buffer too short: {0}")]
    BufferTooShort(String),

    /// The CRC32 of an envelope body does not match its trailing checksum.
    #[error("checksum mismatch: {0}")]
    ChecksumMismatch(String),

    /// The envelope was written by a protocol version this reader predates.
    #[error("format too old: {0}")]
    FormatTooOld(String),

    /// The envelope requires a protocol version newer than this reader.
    #[error("format too new: {0}")]
    FormatTooNew(String),

    /// An on-disk enumeration value is not recognized.
    #[error("unknown enum value: {0}")]
    UnknownEnum(String),

    /// A locator carries a type tag this reader does not support.
    #[error("unsupported locator type: {0}")]
    UnsupportedLocatorType(String),

    /// A frame header is inconsistent with its contents.
    #[error("corrupt frame: {0}")]
    CorruptFrame(String),

    /// A list, URL, or frame exceeds the limits of its wire encoding.
    #[error("size overflow: {0}")]
    SizeOverflow(String),

    /// A feature flag has a negative logical value.
    #[error("invalid feature flag: {0}")]
    InvalidFeatureFlag(String),

    /// The caller violated an API contract off the wire.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Constructs a [`SheafError`], with the variant named up front:
/// `sheaf_err!(CorruptFrame: "negative frame size {size}")`.
///
/// Without a variant the error defaults to
/// [`SheafError::InvalidArgument`].
#[macro_export]
macro_rules! sheaf_err {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::SheafError::$variant(format!($fmt $(, $arg)*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::SheafError::InvalidArgument(format!($fmt $(, $arg)*))
    };
}

/// Returns early with a [`SheafError`] built by [`sheaf_err!`].
#[macro_export]
macro_rules! sheaf_bail {
    ($($tt:tt)+) => {
        return Err($crate::sheaf_err!($($tt)+))
    };
}
