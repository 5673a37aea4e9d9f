use thiserror::Error;

/// Error type for diagnostic resolution and grid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagError {
    #[error("Unknown diagnostic '{name}'. Use the catalogue listing to see available diagnostics")]
    UnknownDiagnostic { name: String },

    #[error("Cannot compute '{required_by}': requirement '{requirement}' is neither a field of the dataset nor a known diagnostic")]
    UnresolvableRequirement {
        requirement: String,
        required_by: String,
    },

    #[error("Cannot build the vertical grid from coordinate '{coordinate}': {reason}")]
    MissingGridMetadata { coordinate: String, reason: String },

    #[error("Cyclic diagnostic requirements: {}", chain.join(" -> "))]
    CyclicRequirement { chain: Vec<String> },

    #[error("Field '{name}' not found in dataset")]
    FieldNotFound { name: String },

    #[error("Fields '{left}' {left_dims:?} and '{right}' {right_dims:?} do not share dimensions and shape")]
    DimensionMismatch {
        left: String,
        right: String,
        left_dims: Vec<String>,
        right_dims: Vec<String>,
    },

    #[error("Field '{field}' has no '{dimension}' dimension")]
    MissingDimension { field: String, dimension: String },

    #[error("Mask shape {got:?} does not match the shape {expected:?} of field '{field}'")]
    MaskShapeMismatch {
        field: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Cannot merge datasets: '{name}' holds different values in each")]
    MergeConflict { name: String },

    #[error("Field '{name}' is malformed: {reason}")]
    MalformedField { name: String, reason: String },

    #[error("Invalid catalogue: {0}")]
    InvalidCatalogue(String),

    /// The formula of a diagnostic failed.
    #[error("Failed to compute '{name}'")]
    Evaluation {
        name: String,
        #[source]
        source: Box<DiagError>,
    },
}

/// Convenience type for `Result<T, DiagError>`.
pub type DiagResult<T> = Result<T, DiagError>;
