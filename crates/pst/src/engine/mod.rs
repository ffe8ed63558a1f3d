//! Native engine abstraction
//!
//! The engine owns all knowledge of the PST format and of the output
//! layouts. This module defines the capabilities the boundary layer needs
//! from it as a trait, so the same lifecycle code drives:
//! - [`InMemoryEngine`]: allocation-counting stand-in used by tests
//! - [`NativeEngine`]: the real `libgopst` library (`native` feature)

mod memory;
#[cfg(feature = "native")]
mod native;
mod string;

pub use memory::{InMemoryEngine, MemoryArchive, MemoryEntry};
#[cfg(feature = "native")]
pub use native::NativeEngine;

pub(crate) use string::{NativeString, copy_c_string};

use std::ffi::CStr;

use libc::{c_char, c_int, c_uint, c_void};

use crate::sys;

/// Result of `open_and_enumerate`, as reported by the engine
///
/// All pointers are owned by the engine side. `items` is a contiguous array
/// of `used` record pointers followed by a null sentinel.
#[derive(Debug, Clone, Copy)]
pub struct RawEnumeration {
    /// Engine-specific result structure, handed back on release
    pub handle: *mut c_void,
    pub items: *mut *mut sys::pst_record,
    pub capacity: c_uint,
    pub used: c_uint,
    /// Static message, never released by the caller
    pub last_error: *const c_char,
    pub num_error: c_int,
    /// Archive file handle; lifetime tied to `handle`
    pub file: *mut c_void,
}

impl RawEnumeration {
    /// An enumeration that was never allocated
    pub fn empty(num_error: c_int) -> Self {
        Self {
            handle: std::ptr::null_mut(),
            items: std::ptr::null_mut(),
            capacity: 0,
            used: 0,
            last_error: std::ptr::null(),
            num_error,
            file: std::ptr::null_mut(),
        }
    }
}

/// Capabilities provided by a native PST engine
///
/// # Release contract
///
/// When `open_and_enumerate` reports `num_error != 0`, `handle` and `items`
/// were allocated with the generic allocator and must be released with
/// [`Engine::free`]. Only a successful enumeration may be passed to
/// [`Engine::destroy_enumeration`].
pub trait Engine {
    /// Open an archive and enumerate its records
    fn open_and_enumerate(&self, path: &CStr) -> RawEnumeration;

    /// Create an export context, or null if the engine rejects `conf`
    ///
    /// # Safety
    ///
    /// `conf.acceptable_extensions` must be null or a valid C string that
    /// outlives the returned context.
    unsafe fn create_export(&self, conf: sys::pst_export_conf) -> *mut c_void;

    /// Write one record through an export context
    ///
    /// Returns the engine's written flag and stores its error code in `error`.
    ///
    /// # Safety
    ///
    /// `record` must come from a live enumeration of this engine and
    /// `export` from a live export context of this engine.
    unsafe fn write_record(
        &self,
        record: *mut sys::pst_record,
        export: *mut c_void,
        error: &mut c_int,
    ) -> c_int;

    /// Dedicated destructor for a successful enumeration
    ///
    /// # Safety
    ///
    /// `handle` must come from a successful `open_and_enumerate` of this
    /// engine and must not be released twice.
    unsafe fn destroy_enumeration(&self, handle: *mut c_void);

    /// Dedicated destructor for an export context
    ///
    /// # Safety
    ///
    /// `context` must come from `create_export` of this engine and must not be
    /// released twice.
    unsafe fn destroy_export(&self, context: *mut c_void);

    /// Duplicate a string into memory the engine may release with `free`
    fn alloc_string(&self, value: &CStr) -> *mut c_char {
        unsafe { libc::strdup(value.as_ptr()) }
    }

    /// Generic allocator release
    ///
    /// # Safety
    ///
    /// `ptr` must be null or come from the generic allocator.
    unsafe fn free(&self, ptr: *mut c_void) {
        unsafe { libc::free(ptr) }
    }
}
