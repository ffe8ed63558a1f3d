//! Export configuration and validation
//!
//! [`ExportConfig`] is the loosely typed value a caller fills in (or loads
//! from JSON); its fields carry the raw integers the native engine expects.
//! [`ExportConfig::validate`] turns it into [`ExportSettings`], where every
//! option is a closed enum.

use std::ops::BitOr;

use libc::{c_char, c_int};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigField};
use crate::sys;

// ============================================================================
// Typed options
// ============================================================================

/// Output layout produced by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One archive file per folder in a flat directory
    Normal,
    /// Directory tree in KMail's on-disk layout
    KMail,
    /// Mirrored folder tree, one combined archive file per directory
    Recurse(RecurseFlavor),
    /// Mirrored folder tree, one file per message; attachments are written as
    /// `{message-number}-{attachment-name}`; see [`ExportSettings::sub_mode`]
    Separate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecurseFlavor {
    #[default]
    Default,
    Thunderbird,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparateFlavor {
    /// MH style, no extensions on message files
    Mh,
    /// Message files get an `.eml` style extension
    Ex,
    /// Messages written as `.msg`
    Msg,
}

/// MH/EX/MSG sub-mode flags, passed to the engine as given
///
/// The flags are cumulative: readpst's `-e` sets MH and EX, `-m` sets all
/// three. The engine also reads the MH flag outside the Separate layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeparateFlags {
    pub mh: bool,
    pub ex: bool,
    pub msg: bool,
}

impl SeparateFlags {
    /// Most specific flavor set, if any
    pub fn flavor(self) -> Option<SeparateFlavor> {
        if self.msg {
            Some(SeparateFlavor::Msg)
        } else if self.ex {
            Some(SeparateFlavor::Ex)
        } else if self.mh {
            Some(SeparateFlavor::Mh)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Normal,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactMode {
    #[default]
    VCard,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletedMode {
    #[default]
    Exclude,
    Include,
}

/// Set of item types to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputTypes(c_int);

impl OutputTypes {
    pub const EMAIL: Self = Self(sys::OTMODE_EMAIL);
    pub const APPOINTMENT: Self = Self(sys::OTMODE_APPOINTMENT);
    pub const JOURNAL: Self = Self(sys::OTMODE_JOURNAL);
    pub const CONTACT: Self = Self(sys::OTMODE_CONTACT);
    pub const ALL: Self = Self(0xff);
    pub const NONE: Self = Self(0);

    pub fn from_bits(bits: c_int) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> c_int {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for OutputTypes {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for OutputTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ============================================================================
// Raw configuration
// ============================================================================

/// Export configuration as supplied by a caller
///
/// Defaults match the engine's built-in defaults: normal mode, vCard
/// contacts, deleted items excluded, every item type, UTF-8 preferred and
/// ten characters reserved for numbered file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub mode: i32,
    pub mode_mh: bool,
    pub mode_ex: bool,
    pub mode_msg: bool,
    pub mode_thunder: bool,
    pub output_mode: i32,
    pub contact_mode: i32,
    pub deleted_mode: i32,
    pub output_type_mode: i32,
    pub overwrite: bool,
    pub prefer_utf8: bool,
    pub file_name_len: i32,
    /// Attachment extension filter; `None` or empty disables filtering
    pub acceptable_extensions: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: sys::MODE_NORMAL,
            mode_mh: false,
            mode_ex: false,
            mode_msg: false,
            mode_thunder: false,
            output_mode: sys::OUTPUT_NORMAL,
            contact_mode: sys::CMODE_VCARD,
            deleted_mode: sys::DMODE_EXCLUDE,
            output_type_mode: OutputTypes::ALL.bits(),
            overwrite: false,
            prefer_utf8: true,
            file_name_len: 10,
            acceptable_extensions: None,
        }
    }
}

impl ExportConfig {
    /// Set the attachment extension filter, e.g. `"pdf,doc"`
    pub fn with_extensions(mut self, extensions: &str) -> Self {
        self.acceptable_extensions = Some(extensions.to_string());
        self
    }

    /// Check every field and produce the typed settings
    ///
    /// Fields are checked in a fixed order (mode, output mode, contact mode,
    /// deleted mode, file name length); the first failure is returned. The
    /// remaining fields carry no range and pass through unchanged.
    pub fn validate(&self) -> Result<ExportSettings, ConfigError> {
        let mode = match self.mode {
            sys::MODE_NORMAL => Mode::Normal,
            sys::MODE_KMAIL => Mode::KMail,
            sys::MODE_RECURSE => Mode::Recurse(if self.mode_thunder {
                RecurseFlavor::Thunderbird
            } else {
                RecurseFlavor::Default
            }),
            sys::MODE_SEPARATE => Mode::Separate,
            other => return Err(ConfigError::new(ConfigField::Mode, other)),
        };

        let output_mode = match self.output_mode {
            sys::OUTPUT_NORMAL => OutputMode::Normal,
            sys::OUTPUT_QUIET => OutputMode::Quiet,
            other => return Err(ConfigError::new(ConfigField::OutputMode, other)),
        };

        let contact_mode = match self.contact_mode {
            sys::CMODE_VCARD => ContactMode::VCard,
            sys::CMODE_LIST => ContactMode::List,
            other => return Err(ConfigError::new(ConfigField::ContactMode, other)),
        };

        let deleted_mode = match self.deleted_mode {
            sys::DMODE_EXCLUDE => DeletedMode::Exclude,
            sys::DMODE_INCLUDE => DeletedMode::Include,
            other => return Err(ConfigError::new(ConfigField::DeletedMode, other)),
        };

        let file_name_len = u32::try_from(self.file_name_len)
            .map_err(|_| ConfigError::new(ConfigField::FileNameLen, self.file_name_len))?;

        Ok(ExportSettings {
            mode,
            sub_mode: SeparateFlags {
                mh: self.mode_mh,
                ex: self.mode_ex,
                msg: self.mode_msg,
            },
            output_mode,
            contact_mode,
            deleted_mode,
            output_types: OutputTypes::from_bits(self.output_type_mode),
            overwrite: self.overwrite,
            prefer_utf8: self.prefer_utf8,
            file_name_len,
            acceptable_extensions: self
                .acceptable_extensions
                .clone()
                .filter(|e| !e.is_empty()),
        })
    }
}

impl From<&ExportSettings> for ExportConfig {
    fn from(s: &ExportSettings) -> Self {
        let (mode, mode_thunder) = match s.mode {
            Mode::Normal => (sys::MODE_NORMAL, false),
            Mode::KMail => (sys::MODE_KMAIL, false),
            Mode::Recurse(flavor) => (sys::MODE_RECURSE, flavor == RecurseFlavor::Thunderbird),
            Mode::Separate => (sys::MODE_SEPARATE, false),
        };
        Self {
            mode,
            mode_mh: s.sub_mode.mh,
            mode_ex: s.sub_mode.ex,
            mode_msg: s.sub_mode.msg,
            mode_thunder,
            output_mode: match s.output_mode {
                OutputMode::Normal => sys::OUTPUT_NORMAL,
                OutputMode::Quiet => sys::OUTPUT_QUIET,
            },
            contact_mode: match s.contact_mode {
                ContactMode::VCard => sys::CMODE_VCARD,
                ContactMode::List => sys::CMODE_LIST,
            },
            deleted_mode: match s.deleted_mode {
                DeletedMode::Exclude => sys::DMODE_EXCLUDE,
                DeletedMode::Include => sys::DMODE_INCLUDE,
            },
            output_type_mode: s.output_types.bits(),
            overwrite: s.overwrite,
            prefer_utf8: s.prefer_utf8,
            file_name_len: s.file_name_len.min(i32::MAX as u32) as i32,
            acceptable_extensions: s.acceptable_extensions.clone(),
        }
    }
}

// ============================================================================
// Validated settings
// ============================================================================

/// A configuration that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub mode: Mode,
    pub sub_mode: SeparateFlags,
    pub output_mode: OutputMode,
    pub contact_mode: ContactMode,
    pub deleted_mode: DeletedMode,
    pub output_types: OutputTypes,
    pub overwrite: bool,
    pub prefer_utf8: bool,
    pub file_name_len: u32,
    /// Never `Some("")`
    pub acceptable_extensions: Option<String>,
}

impl ExportSettings {
    /// Flavor of the Separate layout; `None` in other modes
    pub fn separate_flavor(&self) -> Option<SeparateFlavor> {
        match self.mode {
            Mode::Separate => self.sub_mode.flavor(),
            _ => None,
        }
    }

    /// Native form of these settings
    ///
    /// `extensions` is the transferred filter string, or null.
    pub(crate) fn to_native(&self, extensions: *mut c_char) -> sys::pst_export_conf {
        let raw = ExportConfig::from(self);
        sys::pst_export_conf {
            mode: raw.mode,
            mode_MH: raw.mode_mh as c_int,
            mode_EX: raw.mode_ex as c_int,
            mode_MSG: raw.mode_msg as c_int,
            mode_thunder: raw.mode_thunder as c_int,
            output_mode: raw.output_mode,
            contact_mode: raw.contact_mode,
            deleted_mode: raw.deleted_mode,
            output_type_mode: raw.output_type_mode,
            contact_mode_specified: 0,
            overwrite: raw.overwrite as c_int,
            prefer_utf8: raw.prefer_utf8 as c_int,
            save_rtf_body: 0,
            file_name_len: raw.file_name_len,
            acceptable_extensions: extensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let settings = ExportConfig::default().validate().unwrap();
        assert_eq!(settings.mode, Mode::Normal);
        assert_eq!(settings.output_mode, OutputMode::Normal);
        assert_eq!(settings.contact_mode, ContactMode::VCard);
        assert_eq!(settings.deleted_mode, DeletedMode::Exclude);
        assert_eq!(settings.output_types, OutputTypes::ALL);
        assert_eq!(settings.file_name_len, 10);
        assert!(settings.prefer_utf8);
        assert!(settings.acceptable_extensions.is_none());
    }

    #[test]
    fn test_each_field_rejected_independently() {
        let cases: [(fn(&mut ExportConfig), ConfigField, i64); 5] = [
            (|c| c.mode = 5, ConfigField::Mode, 5),
            (|c| c.output_mode = 5, ConfigField::OutputMode, 5),
            (|c| c.contact_mode = 5, ConfigField::ContactMode, 5),
            (|c| c.deleted_mode = 5, ConfigField::DeletedMode, 5),
            (|c| c.file_name_len = -2, ConfigField::FileNameLen, -2),
        ];

        for (mutate, field, value) in cases {
            let mut config = ExportConfig::default();
            mutate(&mut config);
            let err = config.validate().unwrap_err();
            assert_eq!(err.field, field);
            assert_eq!(err.value, value);
        }
    }

    #[test]
    fn test_negative_enum_values_rejected() {
        let config = ExportConfig {
            output_mode: -1,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().field, ConfigField::OutputMode);
    }

    #[test]
    fn test_zero_file_name_len_is_valid() {
        let config = ExportConfig {
            file_name_len: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap().file_name_len, 0);
    }

    #[test]
    fn test_separate_sub_modes() {
        let mut config = ExportConfig {
            mode: sys::MODE_SEPARATE,
            ..Default::default()
        };
        let settings = config.validate().unwrap();
        assert_eq!(settings.mode, Mode::Separate);
        assert_eq!(settings.separate_flavor(), None);

        config.mode_msg = true;
        assert_eq!(
            config.validate().unwrap().separate_flavor(),
            Some(SeparateFlavor::Msg)
        );
    }

    #[test]
    fn test_cumulative_sub_modes_pass_through() {
        // readpst -e
        let config = ExportConfig {
            mode: sys::MODE_SEPARATE,
            mode_mh: true,
            mode_ex: true,
            ..Default::default()
        };
        let settings = config.validate().unwrap();
        assert_eq!(settings.separate_flavor(), Some(SeparateFlavor::Ex));
        assert_eq!(ExportConfig::from(&settings), config);

        // readpst -m
        let config = ExportConfig {
            mode_msg: true,
            ..config
        };
        let native = config.validate().unwrap().to_native(std::ptr::null_mut());
        assert_eq!(native.mode, sys::MODE_SEPARATE);
        assert_eq!(native.mode_MH, 1);
        assert_eq!(native.mode_EX, 1);
        assert_eq!(native.mode_MSG, 1);
    }

    #[test]
    fn test_mh_flag_kept_outside_separate() {
        let config = ExportConfig {
            mode_mh: true,
            ..Default::default()
        };
        let settings = config.validate().unwrap();
        assert_eq!(settings.mode, Mode::Normal);
        assert_eq!(settings.separate_flavor(), None);
        assert_eq!(settings.to_native(std::ptr::null_mut()).mode_MH, 1);
    }

    #[test]
    fn test_recurse_thunderbird() {
        let config = ExportConfig {
            mode: sys::MODE_RECURSE,
            mode_thunder: true,
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap().mode,
            Mode::Recurse(RecurseFlavor::Thunderbird)
        );
    }

    #[test]
    fn test_empty_extensions_become_none() {
        let settings = ExportConfig::default().with_extensions("").validate().unwrap();
        assert!(settings.acceptable_extensions.is_none());

        let settings = ExportConfig::default().with_extensions("pdf").validate().unwrap();
        assert_eq!(settings.acceptable_extensions.as_deref(), Some("pdf"));
    }

    #[test]
    fn test_settings_round_trip_to_config() {
        let config = ExportConfig {
            mode: sys::MODE_SEPARATE,
            mode_ex: true,
            contact_mode: sys::CMODE_LIST,
            deleted_mode: sys::DMODE_INCLUDE,
            output_type_mode: (OutputTypes::EMAIL | OutputTypes::CONTACT).bits(),
            overwrite: true,
            file_name_len: 4,
            ..Default::default()
        };
        let settings = config.validate().unwrap();
        assert_eq!(ExportConfig::from(&settings), config);
    }

    #[test]
    fn test_to_native() {
        let settings = ExportConfig {
            mode: sys::MODE_RECURSE,
            mode_thunder: true,
            output_mode: sys::OUTPUT_QUIET,
            ..Default::default()
        }
        .validate()
        .unwrap();
        let native = settings.to_native(std::ptr::null_mut());
        assert_eq!(native.mode, sys::MODE_RECURSE);
        assert_eq!(native.mode_thunder, 1);
        assert_eq!(native.output_mode, sys::OUTPUT_QUIET);
        assert_eq!(native.prefer_utf8, 1);
        assert_eq!(native.file_name_len, 10);
        assert!(native.acceptable_extensions.is_null());
    }

    #[test]
    fn test_output_types() {
        let types = OutputTypes::EMAIL | OutputTypes::JOURNAL;
        assert!(types.contains(OutputTypes::EMAIL));
        assert!(!types.contains(OutputTypes::CONTACT));
        assert!(OutputTypes::ALL.contains(types));
    }
}
