use std::fmt;

/// Custom error types for the Home Guardian application.
///
/// The security service itself never fails on well-formed input; every error
/// here originates in a collaborator (state storage, image classification,
/// camera frames, configuration) and is propagated to the caller unchanged.

/// Main error type for Home Guardian operations.
#[derive(Debug)]
pub enum HomeGuardianError {
    /// Errors raised while persisting or loading security state.
    RepositoryError(RepositoryError),

    /// Errors raised by the image classifier.
    ClassifierError(ClassifierError),

    /// Errors related to camera frames and snapshots.
    ImageError(ImageError),

    /// Configuration and setup errors.
    ConfigError(ConfigError),
}

/// Errors specific to the persistence boundary.
#[derive(Debug)]
pub enum RepositoryError {
    /// The state file exists but could not be read.
    ReadFailed { path: String, reason: String },

    /// The state file could not be written.
    WriteFailed { path: String, reason: String },

    /// The state file contents are not valid security state.
    Corrupted { path: String, reason: String },
}

/// Errors specific to image classification.
#[derive(Debug)]
pub enum ClassifierError {
    /// Model configuration or weights could not be loaded.
    ModelLoadFailed { path: String, reason: String },

    /// Labels file could not be read or parsed.
    LabelsLoadFailed { path: String, reason: String },

    /// Neural network inference failed.
    InferenceFailed { reason: String },
}

/// Errors specific to camera frames.
#[derive(Debug)]
pub enum ImageError {
    /// The camera directory could not be listed.
    SourceUnavailable { path: String, reason: String },

    /// The camera directory holds no usable frames.
    NoFrames { path: String },

    /// A frame could not be opened or decoded.
    ReadFailed { path: String, reason: String },

    /// A snapshot could not be written.
    SaveFailed { path: String, reason: String },
}

/// Errors related to configuration and application setup.
#[derive(Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    MissingEnvVar { var_name: String },

    /// Invalid configuration values provided.
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

// Implement Display trait for user-friendly error messages
impl fmt::Display for HomeGuardianError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HomeGuardianError::RepositoryError(e) => write!(f, "Repository error: {}", e),
            HomeGuardianError::ClassifierError(e) => write!(f, "Classifier error: {}", e),
            HomeGuardianError::ImageError(e) => write!(f, "Image error: {}", e),
            HomeGuardianError::ConfigError(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::ReadFailed { path, reason } => {
                write!(f, "Failed to read security state from '{}': {}", path, reason)
            }
            RepositoryError::WriteFailed { path, reason } => {
                write!(f, "Failed to write security state to '{}': {}", path, reason)
            }
            RepositoryError::Corrupted { path, reason } => {
                write!(f, "Security state in '{}' is corrupted: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierError::ModelLoadFailed { path, reason } => {
                write!(f, "Failed to load model from '{}': {}", path, reason)
            }
            ClassifierError::LabelsLoadFailed { path, reason } => {
                write!(f, "Failed to load labels from '{}': {}", path, reason)
            }
            ClassifierError::InferenceFailed { reason } => {
                write!(f, "Neural network inference failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::SourceUnavailable { path, reason } => {
                write!(f, "Failed to open camera source '{}': {}", path, reason)
            }
            ImageError::NoFrames { path } => {
                write!(f, "No camera frames found in '{}'", path)
            }
            ImageError::ReadFailed { path, reason } => {
                write!(f, "Failed to read frame from '{}': {}", path, reason)
            }
            ImageError::SaveFailed { path, reason } => {
                write!(f, "Failed to save snapshot to '{}': {}", path, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingEnvVar { var_name } => {
                write!(f, "Required environment variable '{}' is not set", var_name)
            }
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, reason
                )
            }
        }
    }
}

// Implement std::error::Error trait
impl std::error::Error for HomeGuardianError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HomeGuardianError::RepositoryError(e) => Some(e),
            HomeGuardianError::ClassifierError(e) => Some(e),
            HomeGuardianError::ImageError(e) => Some(e),
            HomeGuardianError::ConfigError(e) => Some(e),
        }
    }
}

impl std::error::Error for RepositoryError {}
impl std::error::Error for ClassifierError {}
impl std::error::Error for ImageError {}
impl std::error::Error for ConfigError {}

// Conversion traits for easy error propagation
impl From<RepositoryError> for HomeGuardianError {
    fn from(err: RepositoryError) -> Self {
        HomeGuardianError::RepositoryError(err)
    }
}

impl From<ClassifierError> for HomeGuardianError {
    fn from(err: ClassifierError) -> Self {
        HomeGuardianError::ClassifierError(err)
    }
}

impl From<ImageError> for HomeGuardianError {
    fn from(err: ImageError) -> Self {
        HomeGuardianError::ImageError(err)
    }
}

impl From<ConfigError> for HomeGuardianError {
    fn from(err: ConfigError) -> Self {
        HomeGuardianError::ConfigError(err)
    }
}

/// Result alias used by the security service.
pub type Result<T> = std::result::Result<T, HomeGuardianError>;
