//! Errors raised by effects: configuration problems detected when an effect
//! or selector is declared, and data problems detected at `initialize` /
//! `prepare` time. Data errors always carry the offending effect id.
use thiserror::Error;

pub type EffectResult<T> = Result<T, EffectError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EffectError {
    // ---- Data containers ----
    #[error("Time index must be strictly increasing: {prev} is followed by {next}")]
    UnsortedIndex { prev: i64, next: i64 },

    #[error("Time index must not be empty")]
    EmptyIndex,

    #[error("Non-finite value at row {row}, column {column}: {value}")]
    NonFiniteData { row: usize, column: usize, value: f64 },

    #[error("Duplicate column name '{column}'")]
    DuplicateColumn { column: String },

    #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch { context: &'static str, expected: usize, found: usize },

    // ---- Selectors ----
    #[error("Selector of effect '{effect}' lists column '{column}' more than once")]
    DuplicateSelectorEntry { effect: String, column: String },

    #[error("Selector of effect '{effect}' has an empty name list; use NoInput")]
    EmptyNameSelector { effect: String },

    #[error("Effect '{effect}' selects column '{column}', which is not in the frame")]
    MissingColumn { effect: String, column: String },

    // ---- Priors & parameters ----
    #[error("Invalid prior {prior}: {reason}")]
    InvalidPrior { prior: String, reason: &'static str },

    #[error("Invalid distribution parameters: {reason}")]
    Distribution { reason: String },

    #[error("Missing parameter '{name}'")]
    MissingParam { name: String },

    #[error("Parameter vector has length {found}, layout expects {expected}")]
    ParamLength { expected: usize, found: usize },

    // ---- Effect configuration ----
    #[error("Invalid option '{option}' for effect '{effect}': {reason}")]
    InvalidOption { effect: String, option: String, reason: String },

    #[error("Unknown option '{option}' for {kind} effect")]
    UnknownOption { kind: &'static str, option: String },

    #[error("Chained step '{step}' has kind {kind}, which is not a column-wise transform")]
    InvalidChainStep { step: String, kind: &'static str },

    #[error("Chained effect has no steps")]
    EmptyChain,

    #[error("Duplicate chained step name '{step}'")]
    DuplicateStep { step: String },

    #[error("Likelihood-augmentation effect '{effect}' cannot wrap a {kind} effect")]
    InvalidWrappedEffect { effect: String, kind: &'static str },

    // ---- Evaluation ----
    #[error("Effect '{effect}' was applied before initialize")]
    NotInitialized { effect: String },

    #[error("Composite effect '{effect}' needs upstream component '{base}'")]
    MissingUpstream { effect: String, base: String },

    #[error(
        "Effect '{effect}' forbids horizon drift: fitted on {fit_len} periods from {fit_start}, \
         given {len} periods from {start}"
    )]
    HorizonDrift { effect: String, fit_start: i64, fit_len: usize, start: i64, len: usize },

    #[error("Invalid augmentation data for effect '{effect}': {reason}")]
    InvalidAugmentation { effect: String, reason: String },
}

impl From<statrs::StatsError> for EffectError {
    fn from(err: statrs::StatsError) -> EffectError {
        EffectError::Distribution { reason: err.to_string() }
    }
}
