use core::fmt;

/// Result alias for `blockgraph`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph construction, partition I/O and clustering.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty (no constraints, no variables, no edges).
    EmptyInput,

    /// Length mismatch between two sequences that must agree.
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A node was registered twice in the same batch.
    DuplicateNode {
        /// Offending node id.
        id: usize,
    },

    /// A node id was referenced but never registered.
    UnknownNode {
        /// Offending node id.
        id: usize,
    },

    /// An edge from a node to itself was requested.
    SelfLoop {
        /// Offending node id.
        id: usize,
    },

    /// Node ids are not dense: `id` is below the largest id but was never added.
    MissingNode {
        /// First missing node id.
        id: usize,
    },

    /// Underlying I/O failure (open, read, write).
    Io {
        /// Kind reported by the operating system.
        kind: std::io::ErrorKind,
        /// Human readable description.
        message: String,
    },

    /// A partition file ended before every node had a label.
    TruncatedPartition {
        /// Number of labels required.
        expected: usize,
        /// Number of labels found.
        found: usize,
    },

    /// A token in a text file could not be parsed.
    Parse {
        /// 1-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// Failure reported by the host matrix accessor, passed through unchanged.
    Matrix(String),

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::DuplicateNode { id } => write!(f, "node {id} registered twice"),
            Error::UnknownNode { id } => write!(f, "node {id} was never registered"),
            Error::SelfLoop { id } => write!(f, "self-loop on node {id}"),
            Error::MissingNode { id } => write!(f, "node ids are not dense: {id} is missing"),
            Error::Io { kind, message } => write!(f, "i/o error ({kind:?}): {message}"),
            Error::TruncatedPartition { expected, found } => {
                write!(f, "partition has {found} labels, expected {expected}")
            }
            Error::Parse { line, token } => write!(f, "line {line}: cannot parse '{token}'"),
            Error::Matrix(msg) => write!(f, "matrix access failed: {msg}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
