use std::error::Error;
use std::fmt;

pub type Result<T, E = ColchunkError> = std::result::Result<T, E>;

/// Broad classification of why decoding failed.
///
/// Every kind is fatal to the column chunk being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Page header is missing a required field, is missing the sub-header for
    /// its page type, or has an unsupported page type.
    MalformedHeader,
    /// No decompressor available for the column's codec.
    UnsupportedCodec,
    /// Decompressed page length differs from the header's declared size.
    DecompressionMismatch,
    /// Assembled rows differ from the row group's row count.
    RowCountMismatch,
    /// Read past the end of dense values, or a dictionary index out of range.
    BoundsViolation,
    /// Internal contract broken by a caller.
    PreconditionViolation,
    /// Data page v2 declares nulls without definition levels.
    MissingLevels,
    /// Corrupt page body or inconsistent metadata.
    InvalidData,
    NotImplemented,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MalformedHeader => "malformed header",
            Self::UnsupportedCodec => "unsupported codec",
            Self::DecompressionMismatch => "decompression mismatch",
            Self::RowCountMismatch => "row count mismatch",
            Self::BoundsViolation => "bounds violation",
            Self::PreconditionViolation => "precondition violation",
            Self::MissingLevels => "missing levels",
            Self::InvalidData => "invalid data",
            Self::NotImplemented => "not implemented",
            Self::Other => "error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug)]
pub struct ColchunkError {
    inner: Box<ColchunkErrorInner>,
}

#[derive(Debug)]
struct ColchunkErrorInner {
    kind: ErrorKind,
    msg: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ColchunkError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Other, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        ColchunkError {
            inner: Box::new(ColchunkErrorInner {
                kind,
                msg: msg.into(),
                source: None,
            }),
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        let kind = source
            .downcast_ref::<ColchunkError>()
            .map(|e| e.kind())
            .unwrap_or(ErrorKind::Other);

        ColchunkError {
            inner: Box::new(ColchunkErrorInner {
                kind,
                msg: msg.into(),
                source: Some(source),
            }),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn get_msg(&self) -> &str {
        &self.inner.msg
    }
}

impl fmt::Display for ColchunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.msg)?;
        if let Some(source) = &self.inner.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl Error for ColchunkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

pub trait ResultExt<T, E> {
    /// Wrap the error with a message.
    ///
    /// The kind of a wrapped `ColchunkError` carries over to the new error.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Same as `context`, but with a lazily built message.
    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: Fn() -> String;

    /// Wrap the error with a message, classifying it as `kind`.
    fn context_kind(self, kind: ErrorKind, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| ColchunkError::with_source(msg, Box::new(e)))
    }

    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: Fn() -> String,
    {
        self.map_err(|e| ColchunkError::with_source(f(), Box::new(e)))
    }

    fn context_kind(self, kind: ErrorKind, msg: &'static str) -> Result<T> {
        self.map_err(|e| {
            let mut err = ColchunkError::with_source(msg, Box::new(e));
            err.inner.kind = kind;
            err
        })
    }
}

pub trait OptionExt<T> {
    /// Error if the option is None, naming the missing value.
    fn required(self, msg: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(ColchunkError::new(format!("Missing required value: {msg}"))),
        }
    }
}

#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)+) => {{
        let msg = format!($($arg)+);
        return Err($crate::ColchunkError::with_kind(
            $crate::ErrorKind::NotImplemented,
            format!("Not yet implemented: {msg}"),
        ));
    }};
}
