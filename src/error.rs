use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdError {
    // Neighbor search
    #[error("Number of neighbors for atom {atom} exceeds the capacity of {capacity}")]
    NeighborCapacityExceeded { atom: usize, capacity: usize },

    // Geometry
    #[error("Simulation box is degenerate (determinant {determinant:e})")]
    DegenerateBox { determinant: f64 },

    // System setup
    #[error("Atom count mismatch for {field}: expected {expected}, found {found}")]
    AtomCountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Atom {atom} has non-positive or non-finite mass {mass}")]
    NonPositiveMass { atom: usize, mass: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Physics
    #[error("Potential energy became non-finite at step {step}")]
    NonFiniteEnergy { step: usize },

    // File I/O
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),
}

pub type Result<T> = std::result::Result<T, MdError>;
