use thiserror::Error;

/// Configuration problems that make generation impossible.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldGenError {
    #[error("no biomes configured")]
    NoBiomes,

    /// Biomes that cannot produce a finite value, or that can never raise a
    /// column above the solid ground height.
    #[error("degenerate biome set: {0}")]
    DegenerateBiomes(String),

    #[error("invalid world dimensions: {0}")]
    InvalidDimensions(String),
}
