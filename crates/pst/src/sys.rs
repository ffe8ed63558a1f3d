//! Native data layout shared with the engine
//!
//! Mirrors the C declarations of `pst.h`. Only the structures the boundary
//! layer reads or writes directly are declared here; engine-private
//! structures stay opaque behind `*mut c_void`.

#![allow(non_camel_case_types, non_snake_case)]

use libc::{c_char, c_int, c_void};

// Export modes
pub const MODE_NORMAL: c_int = 0;
pub const MODE_KMAIL: c_int = 1;
pub const MODE_RECURSE: c_int = 2;
pub const MODE_SEPARATE: c_int = 3;

// Output modes
pub const OUTPUT_NORMAL: c_int = 0;
pub const OUTPUT_QUIET: c_int = 1;

// Contact modes
pub const CMODE_VCARD: c_int = 0;
pub const CMODE_LIST: c_int = 1;

// Deleted item modes
pub const DMODE_EXCLUDE: c_int = 0;
pub const DMODE_INCLUDE: c_int = 1;

// Output type flags
pub const OTMODE_EMAIL: c_int = 1;
pub const OTMODE_APPOINTMENT: c_int = 2;
pub const OTMODE_JOURNAL: c_int = 4;
pub const OTMODE_CONTACT: c_int = 8;

// Record type tags
pub const PST_STORE: u8 = 1;
pub const PST_MESSAGE: u8 = 1 << 1;
pub const PST_FOLDER: u8 = 1 << 2;
pub const PST_JOURNAL: u8 = 1 << 3;
pub const PST_APPOINTMENT: u8 = 1 << 4;
pub const PST_MESSAGE_STORE: u8 = 1 << 5;

// Error codes
pub const NO_ERROR: c_int = 0;
pub const ERROR_NOT_UNIQUE_MSG_STORE: c_int = 1;
pub const ERROR_ROOT_NOT_FOUND: c_int = 2;
pub const ERROR_OPEN: c_int = 3;
pub const ERROR_INDEX_LOAD: c_int = 4;
pub const ERROR_UNKNOWN_RECORD: c_int = 5;

/// `pst_export_conf`, passed by value to the export constructor
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct pst_export_conf {
    pub mode: c_int,
    pub mode_MH: c_int,
    pub mode_EX: c_int,
    pub mode_MSG: c_int,
    pub mode_thunder: c_int,
    pub output_mode: c_int,
    pub contact_mode: c_int,
    pub deleted_mode: c_int,
    pub output_type_mode: c_int,
    pub contact_mode_specified: c_int,
    pub overwrite: c_int,
    pub prefer_utf8: c_int,
    pub save_rtf_body: c_int,
    pub file_name_len: c_int,
    /// Borrowed from the owning `Export`; null when no filter is set
    pub acceptable_extensions: *mut c_char,
}

/// `pst_record`, one enumerated entry
///
/// `renaming` is the only field the boundary layer writes. Everything else
/// is owned by the engine.
#[repr(C)]
#[derive(Debug)]
pub struct pst_record {
    pub type_: u8,
    pub pf: *mut c_void,
    pub pi: *mut c_void,
    pub logical_path: *mut c_char,
    pub name: *mut c_char,
    pub renaming: *mut c_char,
    pub extra_mime_headers: *mut c_char,
}
