use crate::Variance;

pub type Result<T> = std::result::Result<T, ReifyError>;

/// Contract violations raised by the reification layer.
///
/// These are generator or programmer errors: a well-behaved call site never triggers one, so
/// callers are expected to surface them rather than recover. Expected absence (no stored
/// descriptor, no pending witness) is modelled with `Option` and never appears here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReifyError {
    #[error("parameterized descriptor requires at least one type argument")]
    EmptyArguments,
    #[error("intersection descriptor requires at least two bounds, got {0}")]
    IntersectionTooSmall(usize),
    #[error("wildcard descriptor requires at least one bound")]
    EmptyWildcardBounds,
    #[error("method witness requires at least one type argument")]
    EmptyMethodWitness,
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cannot compare `{expected}` with `{actual}` ({variance:?}): {reason}")]
    InvalidComparison {
        expected: String,
        actual: String,
        variance: Variance,
        reason: &'static str,
    },
    #[error("cannot project `{descriptor}`: {reason}")]
    UnsupportedProjection {
        descriptor: String,
        reason: &'static str,
    },
    #[error("deferred constructor arguments were already flushed")]
    AlreadyFlushed,
    #[error("object already carries the maximum of {max} supertype descriptors")]
    TooManySupertypes { max: usize },
    #[error("invalid signature `{signature}`: {reason}")]
    InvalidSignature {
        signature: String,
        reason: &'static str,
    },
    #[error("unknown class `{0}`")]
    UnknownClass(String),
}
