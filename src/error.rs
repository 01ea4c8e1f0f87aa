use std::{error::Error, fmt, io};

/// The runtime's result type.
pub type Result<T> = std::result::Result<T, RuntimeErr>;

/// Everything that can go wrong while driving an engine.
#[derive(Debug)]
pub enum RuntimeErr {
    /// A batch size of zero was requested.
    ZeroBatchSize,
    /// The sample matrix has no rows, or its rows have no columns.
    EmptyMatrix,
    /// The row count is not a multiple of the batch size.
    NotDivisible { rows: usize, batch_size: u32 },
    /// A row's width differs from the width of the first row.
    RowLength {
        row: usize,
        got: usize,
        expected: usize,
    },
    /// Data and labels hold a different amount of samples.
    CountMismatch { data: usize, labels: usize },
    /// A dataset was encoded with a batch size the engine does not use.
    BatchSizeMismatch { got: u32, expected: u32 },
    /// A required entry point is not exported by the engine.
    MissingExport(String),
    /// An entry point returned no value, or a value of the wrong kind.
    InvalidReturn { export: String, got: &'static str },
    /// The engine failed while running an entry point.
    Trap { export: String, detail: String },
    /// A byte range falls outside the engine's memory.
    OutOfBounds {
        offset: usize,
        len: usize,
        memory: usize,
    },
    /// A weights bundle addresses a layer that doesn't exist or isn't trainable.
    UnknownLayer { layer: u32 },
    WeightsLengthMismatch {
        layer: u32,
        got: usize,
        expected: usize,
    },
    BiasLengthMismatch {
        layer: u32,
        got: usize,
        expected: usize,
    },
    /// Invalid configuration, caught before touching the engine.
    InvalidConfig(String),
    Shape(ndarray::ShapeError),
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for RuntimeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBatchSize => write!(f, "batch size must be greater than zero"),
            Self::EmptyMatrix => write!(f, "sample matrix is empty"),
            Self::NotDivisible { rows, batch_size } => write!(
                f,
                "{rows} rows can't be split in batches of {batch_size} samples"
            ),
            Self::RowLength { row, got, expected } => write!(
                f,
                "row {row} has {got} entries, expected {expected}"
            ),
            Self::CountMismatch { data, labels } => write!(
                f,
                "data has {data} samples but labels have {labels}"
            ),
            Self::BatchSizeMismatch { got, expected } => write!(
                f,
                "dataset is encoded with batch size {got}, the engine expects {expected}"
            ),
            Self::MissingExport(name) => write!(f, "engine does not export `{name}`"),
            Self::InvalidReturn { export, got } => {
                write!(f, "`{export}` returned {got}")
            }
            Self::Trap { export, detail } => write!(f, "`{export}` trapped: {detail}"),
            Self::OutOfBounds {
                offset,
                len,
                memory,
            } => write!(
                f,
                "range {offset}..{} is outside of the {memory} bytes of engine memory",
                offset.saturating_add(*len)
            ),
            Self::UnknownLayer { layer } => {
                write!(f, "layer {layer} doesn't exist or has no weights")
            }
            Self::WeightsLengthMismatch {
                layer,
                got,
                expected,
            } => write!(
                f,
                "weights length mismatch for layer {layer}: got {got}, expected {expected}"
            ),
            Self::BiasLengthMismatch {
                layer,
                got,
                expected,
            } => write!(
                f,
                "bias length mismatch for layer {layer}: got {got}, expected {expected}"
            ),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Shape(e) => write!(f, "shape error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for RuntimeErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Shape(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ndarray::ShapeError> for RuntimeErr {
    fn from(value: ndarray::ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<io::Error> for RuntimeErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RuntimeErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl RuntimeErr {
    /// Whether the error was raised by shape validation, before any memory was written.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::ZeroBatchSize
                | Self::EmptyMatrix
                | Self::NotDivisible { .. }
                | Self::RowLength { .. }
                | Self::CountMismatch { .. }
                | Self::BatchSizeMismatch { .. }
        )
    }
}
