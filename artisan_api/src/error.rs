use std::fmt::{Debug, Write};
use std::{borrow::Cow, panic::Location};

use strum_macros::IntoStaticStr;

use crate::config::ReconcileError;

/// User provided input was invalid or inconsistent with the observed ring.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvalidInputError {
    #[error("Failed to read input file '{path}'")]
    ReadInputFile { path: String },
    #[error("Failed to parse ring rules from '{path}'")]
    ParseRingRules { path: String },
    #[error("Failed to parse ring snapshot from '{path}'")]
    ParseRingSnapshot { path: String },
    #[error("Failed to parse swift-ring-builder output")]
    ParseBuilderOutput,
    #[error("Failed to decode builder file '{path}'")]
    DecodeBuilderFile { path: String },
    #[error("Either an input snapshot or a builder file must be provided")]
    MissingRingSource,
    #[error("Executing commands requires a builder file")]
    MissingBuilderFile,
    #[error("Rule file does not match the observed ring: {0}")]
    InconsistentRing(#[from] ReconcileError),
    #[error("Removal of undeclared devices was not confirmed")]
    ConfirmationDeclined,
}

/// The tool failed to run because the execution environment was misconfigured.
#[derive(Debug, Eq, thiserror::Error, PartialEq)]
pub enum ExecutionEnvironmentMisconfigurationError {
    #[error("Failed to find required binary '{binary}'")]
    MissingBinary { binary: &'static str },
}

/// Running the external tool or producing output failed.
#[derive(Debug, Eq, thiserror::Error, PartialEq)]
pub enum ExecutionError {
    #[error("Failed to execute '{binary}'")]
    CommandCouldNotExecute { binary: &'static str },
    #[error("'{binary}' failed: {explanation}")]
    CommandFailed {
        binary: &'static str,
        explanation: String,
    },
    #[error("Builder file and swift-ring-builder output disagree")]
    SnapshotMismatch,
    #[error("Failed to write output to '{path}'")]
    WriteOutput { path: String },
    #[error("Failed to read confirmation from the operator")]
    ReadConfirmation,
}

#[derive(Debug, Eq, thiserror::Error, PartialEq)]
pub enum InternalError {
    #[error("Internal error: {0}")]
    Internal(&'static str),
    #[error("Failed to serialize output")]
    SerializeOutput,
}

/// Each variant of `ErrorKind` corresponds to a different category of error.
#[derive(Debug, thiserror::Error, IntoStaticStr, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// The rule file, the ring snapshot or the combination of both is invalid.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    /// A required binary is missing or not usable.
    #[error(transparent)]
    ExecutionEnvironmentMisconfiguration(#[from] ExecutionEnvironmentMisconfigurationError),

    /// Running `swift-ring-builder` or writing results failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A bug was encountered.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug)]
struct ArtisanErrorInner {
    kind: ErrorKind,
    location: &'static Location<'static>,
    source: Option<anyhow::Error>,
    context: Vec<(Cow<'static, str>, &'static Location<'static>)>,
}

pub struct ArtisanError(Box<ArtisanErrorInner>);
impl ArtisanError {
    #[track_caller]
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        ArtisanError(Box::new(ArtisanErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: None,
            context: Vec::new(),
        }))
    }

    #[track_caller]
    pub fn with_source(kind: impl Into<ErrorKind>, source: anyhow::Error) -> Self {
        ArtisanError(Box::new(ArtisanErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: Some(source),
            context: Vec::new(),
        }))
    }

    #[track_caller]
    pub fn internal(msg: &'static str) -> Self {
        Self::new(InternalError::Internal(msg))
    }

    /// Returns a reference to the inner ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    /// Returns the category name of the error, e.g. `invalid-input`.
    pub fn category(&self) -> &'static str {
        <&'static str>::from(&self.0.kind)
    }
}

impl From<ReconcileError> for ArtisanError {
    #[track_caller]
    fn from(value: ReconcileError) -> Self {
        ArtisanError::new(InvalidInputError::from(value))
    }
}

pub trait ReportError<T, K> {
    /// Convert this error into a structured ArtisanError.
    fn structured(self, kind: K) -> Result<T, ArtisanError>;
}

impl<T, K> ReportError<T, K> for Option<T>
where
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, ArtisanError> {
        match self {
            Some(t) => Ok(t),
            None => Err(ArtisanError::new(kind)),
        }
    }
}

impl<T, E, K> ReportError<T, K> for Result<T, E>
where
    E: Into<anyhow::Error>,
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, ArtisanError> {
        match self {
            Ok(o) => Ok(o),
            Err(e) => Err(ArtisanError::with_source(kind, e.into())),
        }
    }
}

pub trait ArtisanResultExt<T> {
    /// Attach a context message to the error.
    fn message(self, context: impl Into<Cow<'static, str>>) -> Result<T, ArtisanError>;
}

impl<T> ArtisanResultExt<T> for Result<T, ArtisanError> {
    #[track_caller]
    fn message(mut self, context: impl Into<Cow<'static, str>>) -> Result<T, ArtisanError> {
        if let Err(ref mut e) = self {
            e.0.context.push((context.into(), Location::caller()));
        }
        self
    }
}

impl Debug for ArtisanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.0.kind,
            self.0.location.file(),
            self.0.location.line()
        )?;

        if !self.0.context.is_empty() {
            writeln!(f, "\n\nContext:")?;
            for (i, (context, location)) in self.0.context.iter().enumerate() {
                for (j, line) in context.split('\n').enumerate() {
                    if j == 0 {
                        write!(f, "{: >5}: ", i)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                writeln!(f, " at {}:{}", location.file(), location.line())?;
            }
        }

        if let Some(ref source) = self.0.source {
            writeln!(f, "\n\nCaused by:")?;
            let mut index = 0;
            let mut source: Option<&dyn std::error::Error> = Some(source.as_ref());
            while let Some(e) = source {
                for (i, line) in e.to_string().split('\n').enumerate() {
                    if i == 0 {
                        write!(f, "{: >5}: ", index)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                f.write_char('\n')?;
                source = e.source();
                index += 1;
            }
        }
        Ok(())
    }
}
