use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollupError {
    #[error("required tool unavailable: {0}")]
    MissingTool(String),
    #[error("manifest not found: {0}")]
    ManifestMissing(String),
    #[error("local file missing: {0}")]
    MissingLocalFile(String),
    #[error("remote asset unavailable: tag={tag} asset={asset}: {reason}")]
    MissingRemoteAsset {
        tag: String,
        asset: String,
        reason: String,
    },
    #[error("identifier has no numeric token: {0}")]
    NoNumericToken(String),
    #[error("config invalid: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupErrorCode {
    E001MissingTool,
    E002ManifestMissing,
    E003MissingLocalFile,
    E004MissingRemoteAsset,
    E005NoNumericToken,
    E006InvalidConfig,
}

impl RollupErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E001MissingTool => "E001_MISSING_TOOL",
            Self::E002ManifestMissing => "E002_MANIFEST_MISSING",
            Self::E003MissingLocalFile => "E003_MISSING_LOCAL_FILE",
            Self::E004MissingRemoteAsset => "E004_MISSING_REMOTE_ASSET",
            Self::E005NoNumericToken => "E005_NO_NUMERIC_TOKEN",
            Self::E006InvalidConfig => "E006_INVALID_CONFIG",
        }
    }
}

impl RollupError {
    pub fn code(&self) -> RollupErrorCode {
        match self {
            Self::MissingTool(_) => RollupErrorCode::E001MissingTool,
            Self::ManifestMissing(_) => RollupErrorCode::E002ManifestMissing,
            Self::MissingLocalFile(_) => RollupErrorCode::E003MissingLocalFile,
            Self::MissingRemoteAsset { .. } => RollupErrorCode::E004MissingRemoteAsset,
            Self::NoNumericToken(_) => RollupErrorCode::E005NoNumericToken,
            Self::InvalidConfig(_) => RollupErrorCode::E006InvalidConfig,
        }
    }

    /// Startup failures that abort before any stage runs.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingTool(_) | Self::ManifestMissing(_) | Self::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_strings() {
        let err = RollupError::MissingLocalFile("daily_20240101.ndjson".into());
        assert_eq!(err.code().as_str(), "E003_MISSING_LOCAL_FILE");
        assert!(!err.is_precondition());
        assert!(RollupError::ManifestMissing("manifest.json".into()).is_precondition());
    }
}
