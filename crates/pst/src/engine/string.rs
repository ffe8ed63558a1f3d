//! Strings transferred across the native boundary

use std::ffi::{CStr, CString};
use std::ptr::NonNull;
use std::rc::Rc;

use libc::c_char;

use super::Engine;
use crate::error::Error;

/// A C string allocated through an engine's generic allocator
///
/// The native side may hold `as_ptr()` while this value lives; dropping it
/// releases the allocation.
pub(crate) struct NativeString {
    ptr: NonNull<c_char>,
    engine: Rc<dyn Engine>,
}

impl NativeString {
    pub(crate) fn new(engine: &Rc<dyn Engine>, value: &str) -> Result<Self, Error> {
        let value = CString::new(value)?;
        let ptr = NonNull::new(engine.alloc_string(&value)).ok_or(Error::OutOfMemory)?;
        Ok(Self {
            ptr,
            engine: Rc::clone(engine),
        })
    }

    pub(crate) fn as_ptr(&self) -> *mut c_char {
        self.ptr.as_ptr()
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        unsafe { self.engine.free(self.ptr.as_ptr().cast()) }
    }
}

/// Copy a native string into an owned `String`
///
/// Null becomes the empty string; invalid UTF-8 is replaced.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn copy_c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}
