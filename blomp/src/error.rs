use thiserror::Error;

/// Errors produced while building, encoding or decoding a block tree.
#[derive(Error, Debug)]
pub enum Error {
    /// A block was derived deeper than the configured maximum depth. This
    /// is a bug in the geometry derivation, not bad input.
    #[error("block depth {depth} exceeds the maximum depth {max_depth}")]
    ConfigInvariantViolation { depth: u32, max_depth: u32 },

    #[error("corrupt blomp data: {0}")]
    CorruptData(Corruption),

    #[error("bit {position} is out of bounds for a stream of {len} bits")]
    OutOfBounds { position: u64, len: u64 },

    #[error("image dimensions differ, expected {}x{}, found {}x{}", expected.0, expected.1, found.0, found.1)]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("invalid block tree description: {0}")]
    InvalidDescriptor(String),

    /// The image is too large to render into memory.
    #[error("{width}x{height} image exceeds the limit of {limit} pixels")]
    TooLarge { width: u32, height: u32, limit: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What exactly was wrong with a file or bit stream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    #[error("incorrect identifier, got {0:?}")]
    InvalidIdentifier([u8; 4]),

    #[error("root block is not a parent block")]
    RootNotParent,

    #[error("bit stream ended in the middle of the block tree")]
    Truncated,

    #[error("parent bit set on a block that cannot be subdivided")]
    InvalidSubdivision,

    #[error("header field `{0}` is out of range")]
    InvalidHeader(&'static str),
}

impl Error {
    /// Fatal errors point at a broken invariant and must abort the whole
    /// operation; everything else can be reported and recovered from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ConfigInvariantViolation { .. })
    }

    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Error::CorruptData(_))
    }
}

impl From<Corruption> for Error {
    fn from(value: Corruption) -> Self {
        Error::CorruptData(value)
    }
}

/// Maps an early end of input to [`Corruption::Truncated`], other I/O
/// failures pass through unchanged.
pub(crate) fn truncated_on_eof(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::CorruptData(Corruption::Truncated)
    } else {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
