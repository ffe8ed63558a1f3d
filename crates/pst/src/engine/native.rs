//! `libgopst` binding
//!
//! Links the native engine (libpst based) and adapts its result structure
//! to [`RawEnumeration`].

#![allow(non_camel_case_types)]

use std::ffi::CStr;

use libc::{c_char, c_int, c_uint, c_void};

use super::{Engine, RawEnumeration};
use crate::sys;

/// libpst `pst_file`, embedded by value in the enumeration result
///
/// Never read from Rust; declared only so the fields after it land at the
/// offsets the C compiler gives them.
#[repr(C)]
#[allow(dead_code)]
struct pst_file {
    fp: *mut c_void,
    cwd: *mut c_char,
    fname: *mut c_char,
    charset: *mut c_char,
    i_table: *mut c_void,
    i_count: usize,
    i_capacity: usize,
    d_head: *mut c_void,
    d_tail: *mut c_void,
    x_head: *mut c_void,
    block_head: *mut c_void,
    do_read64: c_int,
    index1: u64,
    index1_back: u64,
    index2: u64,
    index2_back: u64,
    size: u64,
    encryption: u8,
    ind_type: u8,
}

#[repr(C)]
struct pst_record_enumerator {
    items: *mut *mut sys::pst_record,
    capacity: c_uint,
    used: c_uint,
    file: pst_file,
    last_error: *const c_char,
    num_error: c_int,
    d_ptr: *mut c_void,
}

/// Flag a result whose first item was not a message store
///
/// The engine returns those with no error code and no root folder. Returns
/// true when the result was marked, in which case it must not be traversed.
fn mark_missing_root(e: &mut pst_record_enumerator) -> bool {
    if e.num_error != sys::NO_ERROR || !e.d_ptr.is_null() {
        return false;
    }
    e.num_error = sys::ERROR_ROOT_NOT_FOUND;
    e.last_error = c"Root record not found.".as_ptr();
    true
}

#[link(name = "gopst")]
unsafe extern "C" {
    fn record_enumerator_new(path: *const c_char) -> *mut pst_record_enumerator;
    fn pst_list(out: *mut pst_record_enumerator);
    fn record_enumerator_destroy(ie: *mut pst_record_enumerator) -> c_int;
    fn pst_export_new(conf: sys::pst_export_conf) -> *mut c_void;
    fn pst_export_destroy(export: *mut c_void);
    fn pst_record_to_file(r: *mut sys::pst_record, e: *mut c_void, error: *mut c_int) -> c_int;
}

/// The native `libgopst` engine
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for NativeEngine {
    fn open_and_enumerate(&self, path: &CStr) -> RawEnumeration {
        let out = unsafe { record_enumerator_new(path.as_ptr()) };
        if out.is_null() {
            return RawEnumeration::empty(sys::ERROR_OPEN);
        }
        let e = unsafe { &mut *out };
        if mark_missing_root(e) {
            log::warn!("[PST] {} has no message store", path.to_string_lossy());
        } else if e.num_error == sys::NO_ERROR {
            unsafe { pst_list(out) };
        }
        RawEnumeration {
            handle: out.cast(),
            items: e.items,
            capacity: e.capacity,
            used: e.used,
            last_error: e.last_error,
            num_error: e.num_error,
            file: std::ptr::addr_of_mut!(e.file).cast(),
        }
    }

    unsafe fn create_export(&self, conf: sys::pst_export_conf) -> *mut c_void {
        unsafe { pst_export_new(conf) }
    }

    unsafe fn write_record(
        &self,
        record: *mut sys::pst_record,
        export: *mut c_void,
        error: &mut c_int,
    ) -> c_int {
        unsafe { pst_record_to_file(record, export, error) }
    }

    unsafe fn destroy_enumeration(&self, handle: *mut c_void) {
        unsafe { record_enumerator_destroy(handle.cast()) };
    }

    unsafe fn destroy_export(&self, context: *mut c_void) {
        unsafe { pst_export_destroy(context) }
    }
}
