use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{left} has {left_len} entries but {right} has {right_len}")]
    MismatchedLengths {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    #[error("hidden_units must list at least two widths, got {0}")]
    TooFewHiddenUnits(usize),

    #[error("dropout rate must lie in [0, 1), got {0}")]
    InvalidDropout(f64),

    #[error("sequence length must be positive")]
    InvalidSequenceLength,

    #[error("at least one recurrent layer is required")]
    InvalidLayerCount,

    #[error("train fraction must lie in (0, 1), got {0}")]
    InvalidTrainFraction(f64),

    #[error("batch size must be positive")]
    InvalidBatchSize,

    #[error("target column {0:?} not found in series")]
    UnknownTargetColumn(String),

    #[error("row {row} has {got} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("{slice} slice has {rows} rows, at least {needed} are needed")]
    SliceTooShort {
        slice: &'static str,
        rows: usize,
        needed: usize,
    },

    #[error("{slice} slice of {rows} rows yields no windows of length {seq_length}")]
    EmptyWindowSet {
        slice: &'static str,
        rows: usize,
        seq_length: usize,
    },
}
