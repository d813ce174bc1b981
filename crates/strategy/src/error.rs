use thiserror::Error;

/// Errors resolving a strategy for a symbol.
///
/// Both are configuration problems; the trade cycle treats them as an
/// abort for the symbol, not a crash.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No strategy mapped for regime '{0}' and no 'default' mapping")]
    UnmappedRegime(String),

    #[error("Strategy '{0}' is not registered")]
    UnknownStrategy(String),
}
