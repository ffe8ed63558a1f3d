//! Error types
//!
//! Two families live here:
//! - [`ErrorCode`]: the closed set of codes the native engine reports
//! - [`Error`]: host-side failures (lifecycle misuse, invalid configuration)

use std::fmt;

use libc::c_int;
use serde::{Deserialize, Serialize};

use crate::sys;

// ============================================================================
// Native error codes
// ============================================================================

/// Failure code reported by the native engine for opens and record writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCode {
    #[default]
    NoError,
    NotUniqueMessageStore,
    RootNotFound,
    OpenFailure,
    IndexLoadFailure,
    UnknownRecordType,
}

impl ErrorCode {
    /// Map a raw native code into the taxonomy.
    ///
    /// Returns `None` for values outside the closed set.
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            sys::NO_ERROR => Some(ErrorCode::NoError),
            sys::ERROR_NOT_UNIQUE_MSG_STORE => Some(ErrorCode::NotUniqueMessageStore),
            sys::ERROR_ROOT_NOT_FOUND => Some(ErrorCode::RootNotFound),
            sys::ERROR_OPEN => Some(ErrorCode::OpenFailure),
            sys::ERROR_INDEX_LOAD => Some(ErrorCode::IndexLoadFailure),
            sys::ERROR_UNKNOWN_RECORD => Some(ErrorCode::UnknownRecordType),
            _ => None,
        }
    }

    /// Like [`ErrorCode::from_raw`], but folds unrecognized values into
    /// `UnknownRecordType` and logs them.
    pub(crate) fn from_raw_lossy(raw: c_int) -> Self {
        Self::from_raw(raw).unwrap_or_else(|| {
            log::warn!("[PST] Native engine reported unrecognized error code {}", raw);
            ErrorCode::UnknownRecordType
        })
    }

    /// Raw value as understood by the native engine
    pub fn as_raw(self) -> c_int {
        match self {
            ErrorCode::NoError => sys::NO_ERROR,
            ErrorCode::NotUniqueMessageStore => sys::ERROR_NOT_UNIQUE_MSG_STORE,
            ErrorCode::RootNotFound => sys::ERROR_ROOT_NOT_FOUND,
            ErrorCode::OpenFailure => sys::ERROR_OPEN,
            ErrorCode::IndexLoadFailure => sys::ERROR_INDEX_LOAD,
            ErrorCode::UnknownRecordType => sys::ERROR_UNKNOWN_RECORD,
        }
    }

    pub fn is_error(self) -> bool {
        self != ErrorCode::NoError
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NoError => "no error",
            ErrorCode::NotUniqueMessageStore => "message store is not unique",
            ErrorCode::RootNotFound => "root folder not found",
            ErrorCode::OpenFailure => "cannot open file",
            ErrorCode::IndexLoadFailure => "cannot load index",
            ErrorCode::UnknownRecordType => "unknown record type",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Host-side errors
// ============================================================================

/// The kind of owning handle an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Export,
    Pst,
    Record,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Export => f.write_str("export"),
            Handle::Pst => f.write_str("pst"),
            Handle::Record => f.write_str("record"),
        }
    }
}

/// Configuration field rejected by validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Mode,
    OutputMode,
    ContactMode,
    DeletedMode,
    FileNameLen,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigField::Mode => "mode",
            ConfigField::OutputMode => "output_mode",
            ConfigField::ContactMode => "contact_mode",
            ConfigField::DeletedMode => "deleted_mode",
            ConfigField::FileNameLen => "file_name_len",
        };
        f.write_str(s)
    }
}

/// An export configuration failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {value}")]
pub struct ConfigError {
    pub field: ConfigField,
    pub value: i64,
}

impl ConfigError {
    pub(crate) fn new(field: ConfigField, value: impl Into<i64>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Errors raised by the boundary layer itself
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} already destroyed")]
    AlreadyDestroyed(Handle),

    #[error("invalid export configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("native engine refused to create an export context")]
    ExportRejected,

    #[error("{live} records still reference this pst; destroy them first")]
    RecordsOutstanding { live: usize },

    #[error("record {index} is an alias; only its owning wrapper may destroy it")]
    NotOwner { index: usize },

    #[error("pst has been destroyed")]
    ArchiveClosed,

    #[error("record and export belong to different engines")]
    EngineMismatch,

    #[error("string contains an interior NUL byte: {0}")]
    InteriorNul(#[from] std::ffi::NulError),

    #[error("native allocation failed")]
    OutOfMemory,
}
