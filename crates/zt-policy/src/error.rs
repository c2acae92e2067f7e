use thiserror::Error;

/// Policy-repository access failures. Note there is deliberately no
/// "compile failed" or "eval failed" variant here — §4.6 treats those as
/// "apply the embedded default", never as a caller-visible error.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy store error: {0}")]
    Store(String),
}
