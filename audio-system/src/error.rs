//! Error taxonomy for the playback front end.
//!
//! Every error here is recoverable: a failed call leaves the caches and
//! registries exactly as they were, and the caller decides whether to retry.

use std::panic::Location;

use audio_backend::BackendError;
use thiserror::Error;

/// A backend call that returned a failure, annotated with the operation that
/// issued it and where in this crate the call was made.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("backend call `{op}` failed at {location}: {source}")]
pub struct BackendFailure {
    pub op: &'static str,
    pub location: &'static Location<'static>,
    #[source]
    pub source: BackendError,
}

impl BackendFailure {
    pub fn is_invalid_handle(&self) -> bool {
        self.source.is_invalid_handle()
    }
}

/// Attaches the operation name and call site to raw backend results.
pub(crate) trait BackendResultExt<T> {
    fn during(self, op: &'static str) -> Result<T, BackendFailure>;
}

impl<T> BackendResultExt<T> for Result<T, BackendError> {
    #[track_caller]
    fn during(self, op: &'static str) -> Result<T, BackendFailure> {
        match self {
            Ok(value) => Ok(value),
            Err(source) => {
                let location = Location::caller();
                tracing::error!(op, %location, error = %source, "backend error");
                Err(BackendFailure { op, location, source })
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayError {
    #[error("sound `{0}` is not loaded")]
    NotLoaded(String),
    #[error("looping sound `{0}` is already playing")]
    AlreadyPlaying(String),
    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StopError {
    #[error("sound `{0}` is not playing")]
    NotPlaying(String),
    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FadeError {
    #[error("sound `{0}` is not playing")]
    NotPlaying(String),
    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    #[error("sound `{0}` is not playing")]
    NotPlaying(String),
    #[error("sound `{0}` is not a 3D sound")]
    NotPositional(String),
    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("event `{0}` is not loaded")]
    UnknownEvent(String),
    #[error("event `{name}` has no instance {index}")]
    UnknownInstance { name: String, index: usize },
    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("an audio engine is already live in this process")]
    AlreadyConstructed,
    #[error("audio engine is not initialized")]
    NotInitialized,
    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid engine config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing() -> Result<(), BackendError> {
        Err(BackendError::FileNotFound("missing.wav".into()))
    }

    #[test]
    fn failure_records_operation_and_call_site() {
        let line = line!() + 1;
        let err = failing().during("create_sound").unwrap_err();
        assert_eq!(err.op, "create_sound");
        assert_eq!(err.location.line(), line);
        assert!(err.location.file().ends_with("error.rs"));
        assert_eq!(err.source, BackendError::FileNotFound("missing.wav".into()));
    }

    #[test]
    fn failure_message_names_the_operation() {
        let err = failing().during("load_bank").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("load_bank"), "{msg}");
        assert!(msg.contains("missing.wav"), "{msg}");
    }

    #[test]
    fn per_operation_errors_wrap_backend_failures() {
        let failure = failing().during("play_sound").unwrap_err();
        let err: PlayError = failure.clone().into();
        assert_eq!(err, PlayError::Backend(failure));
    }
}
