pub type KinemaResult<T> = Result<T, KinemaError>;

/// Error taxonomy for the scene/animation/rendering core.
///
/// `InvalidGeometry`, `FamilyMismatch` and `TargetDetached` are the
/// structural errors callers are expected to match on; the remaining
/// variants carry context strings for diagnostics.
#[derive(thiserror::Error, Debug)]
pub enum KinemaError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("family mismatch: {0}")]
    FamilyMismatch(String),

    #[error("target detached: {0}")]
    TargetDetached(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KinemaError {
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    pub fn family_mismatch(msg: impl Into<String>) -> Self {
        Self::FamilyMismatch(msg.into())
    }

    pub fn target_detached(msg: impl Into<String>) -> Self {
        Self::TargetDetached(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}
