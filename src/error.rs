use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GaError {
    /// Invalid run parameters, raised before any generation runs
    #[error("Configuration error: {0}")]
    Config(String),

    /// The constrained initializer could not place a turbine
    #[error("Could not place turbine {turbine} after {attempts} attempts")]
    RetryExhausted { turbine: usize, attempts: usize },

    /// Out-of-range value given to encode/decode or to `num_bits`
    #[error("Domain error: {0}")]
    Domain(String),
}

pub type Result<T> = std::result::Result<T, GaError>;
