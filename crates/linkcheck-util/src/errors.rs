use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all linkcheck operations.
#[derive(Debug, Error, Diagnostic)]
pub enum LinkcheckError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (e.g. Linkcheck.toml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Linkcheck.toml for syntax errors"))]
    Manifest { message: String },

    /// Dependency resolution failed: the root artifact set could not be
    /// resolved into a classpath at all (missing POM, unreachable
    /// repository, cyclic parent chain). This is fatal to the run.
    #[error("Dependency resolution failed: {message}")]
    ResolutionFailed { message: String },

    /// A class file could not be parsed as a well-formed JVM class.
    /// Recoverable: the offending entry is skipped and logged.
    #[error("Malformed class file {class_name}: {message}")]
    MalformedClassFile { class_name: String, message: String },

    /// A class file declares a major version this reader does not
    /// understand the bytecode layout of. Recoverable: skipped and logged.
    #[error("Unsupported class file version {major} in {class_name}")]
    UnsupportedClassFileVersion { class_name: String, major: u16 },

    /// An archive (JAR/ZIP) could not be opened or read.
    #[error("Archive error reading {path}: {message}")]
    Archive { path: String, message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type LinkcheckResult<T> = miette::Result<T>;
