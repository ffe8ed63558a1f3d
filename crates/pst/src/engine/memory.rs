//! In-memory engine implementation
//!
//! Builds the same native structures the real engine does (C-allocated
//! records in a null-terminated pointer array) from archives registered in
//! memory, and counts every allocation it hands out. Used by tests as a leak
//! harness and as a stub where `libgopst` is not available.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use libc::{c_char, c_int, c_uint, c_void};

use super::{Engine, RawEnumeration};
use crate::error::ErrorCode;
use crate::sys;

/// One entry of an in-memory archive
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    tag: u8,
    logical_path: String,
    name: String,
    extra_mime_headers: Option<String>,
    body: String,
    attachments: Vec<String>,
}

impl MemoryEntry {
    fn new(tag: u8, logical_path: &str, name: &str) -> Self {
        Self {
            tag,
            logical_path: logical_path.to_string(),
            name: name.to_string(),
            extra_mime_headers: None,
            body: String::new(),
            attachments: Vec::new(),
        }
    }

    /// An email message with a plain text body
    pub fn message(logical_path: &str, name: &str, body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Self::new(sys::PST_MESSAGE, logical_path, name)
        }
    }

    /// A folder; exporting it creates a directory
    pub fn folder(logical_path: &str, name: &str) -> Self {
        Self::new(sys::PST_FOLDER, logical_path, name)
    }

    pub fn journal(logical_path: &str, name: &str) -> Self {
        Self::new(sys::PST_JOURNAL, logical_path, name)
    }

    pub fn appointment(logical_path: &str, name: &str) -> Self {
        Self::new(sys::PST_APPOINTMENT, logical_path, name)
    }

    pub fn message_store(name: &str) -> Self {
        Self::new(sys::PST_MESSAGE_STORE, "", name)
    }

    /// An entry with an arbitrary type tag
    pub fn with_tag(tag: u8, logical_path: &str, name: &str) -> Self {
        Self::new(tag, logical_path, name)
    }

    pub fn with_attachment(mut self, file_name: &str) -> Self {
        self.attachments.push(file_name.to_string());
        self
    }

    pub fn with_extra_mime_headers(mut self, headers: &str) -> Self {
        self.extra_mime_headers = Some(headers.to_string());
        self
    }
}

/// Contents registered for one archive path
#[derive(Debug, Clone)]
pub enum MemoryArchive {
    /// A readable archive with these entries, in enumeration order
    Entries(Vec<MemoryEntry>),
    /// An archive that opens but fails with this code while enumerating
    Failing(ErrorCode),
}

impl From<Vec<MemoryEntry>> for MemoryArchive {
    fn from(entries: Vec<MemoryEntry>) -> Self {
        MemoryArchive::Entries(entries)
    }
}

/// Result structure handed out by [`InMemoryEngine`]
#[repr(C)]
struct MemoryEnumeration {
    items: *mut *mut sys::pst_record,
    capacity: c_uint,
    used: c_uint,
    last_error: *const c_char,
    num_error: c_int,
}

/// Export context handed out by [`InMemoryEngine`]
struct MemoryExport {
    conf: sys::pst_export_conf,
    extensions: Vec<String>,
}

impl MemoryExport {
    fn accepts(&self, attachment: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some((_, ext)) = attachment.rsplit_once('.') else {
            return false;
        };
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Engine backed by archives registered in memory
///
/// Every allocation (C strings, records, arrays, result structures and
/// export contexts) is counted; [`InMemoryEngine::live_allocations`] returns
/// to zero once everything handed out has been released.
pub struct InMemoryEngine {
    archives: RefCell<HashMap<String, MemoryArchive>>,
    live: Cell<usize>,
    total: Cell<usize>,
    reject_exports: Cell<bool>,
}

impl InMemoryEngine {
    /// Create an engine with no archives
    pub fn new() -> Self {
        Self {
            archives: RefCell::new(HashMap::new()),
            live: Cell::new(0),
            total: Cell::new(0),
            reject_exports: Cell::new(false),
        }
    }

    /// Register an archive under `path`
    pub fn add_archive(&self, path: &str, archive: impl Into<MemoryArchive>) {
        self.archives
            .borrow_mut()
            .insert(path.to_string(), archive.into());
    }

    /// Make `create_export` return null, as the native engine does for
    /// configurations it cannot honor
    pub fn set_reject_exports(&self, reject: bool) {
        self.reject_exports.set(reject);
    }

    /// Allocations handed out and not yet released
    pub fn live_allocations(&self) -> usize {
        self.live.get()
    }

    /// Allocations handed out since creation
    pub fn total_allocations(&self) -> usize {
        self.total.get()
    }

    fn track_alloc(&self) {
        self.live.set(self.live.get() + 1);
        self.total.set(self.total.get() + 1);
    }

    fn track_free(&self) {
        self.live.set(self.live.get().saturating_sub(1));
    }

    fn calloc(&self, count: usize, size: usize) -> *mut c_void {
        let ptr = unsafe { libc::calloc(count, size) };
        if !ptr.is_null() {
            self.track_alloc();
        }
        ptr
    }

    fn strdup(&self, value: &str) -> *mut c_char {
        match CString::new(value) {
            Ok(c) => self.alloc_string(&c),
            Err(_) => std::ptr::null_mut(),
        }
    }

    fn failed(&self, num_error: c_int, message: &'static CStr) -> RawEnumeration {
        let handle = self.calloc(1, size_of::<MemoryEnumeration>()) as *mut MemoryEnumeration;
        let items = self.calloc(1, size_of::<*mut sys::pst_record>()) as *mut *mut sys::pst_record;
        if handle.is_null() || items.is_null() {
            unsafe {
                self.free(handle.cast());
                self.free(items.cast());
            }
            return RawEnumeration::empty(sys::ERROR_OPEN);
        }
        unsafe {
            *handle = MemoryEnumeration {
                items,
                capacity: 1,
                used: 0,
                last_error: message.as_ptr(),
                num_error,
            };
        }
        RawEnumeration {
            handle: handle.cast(),
            items,
            capacity: 1,
            used: 0,
            last_error: message.as_ptr(),
            num_error,
            file: std::ptr::null_mut(),
        }
    }

    /// Append a record, growing the array and keeping the sentinel slot
    unsafe fn push(&self, out: &mut MemoryEnumeration, record: *mut sys::pst_record) {
        if out.used >= out.capacity {
            let capacity = out.capacity * 2;
            let slots = capacity as usize + 1;
            let grown = unsafe {
                libc::realloc(out.items.cast(), slots * size_of::<*mut sys::pst_record>())
            } as *mut *mut sys::pst_record;
            if grown.is_null() {
                log::warn!("[MEMORY] Dropping record, cannot grow item array");
                unsafe { self.free_record(record) };
                return;
            }
            for i in out.used as usize..slots {
                unsafe { *grown.add(i) = std::ptr::null_mut() };
            }
            out.items = grown;
            out.capacity = capacity;
        }
        unsafe { *out.items.add(out.used as usize) = record };
        out.used += 1;
    }

    fn make_record(&self, entry: &MemoryEntry, file: *mut c_void) -> *mut sys::pst_record {
        let record = self.calloc(1, size_of::<sys::pst_record>()) as *mut sys::pst_record;
        if record.is_null() {
            return record;
        }
        self.track_alloc();
        let item = Box::into_raw(Box::new(entry.clone()));
        unsafe {
            *record = sys::pst_record {
                type_: entry.tag,
                pf: file,
                pi: item.cast(),
                logical_path: self.strdup(&entry.logical_path),
                name: self.strdup(&entry.name),
                renaming: std::ptr::null_mut(),
                extra_mime_headers: entry
                    .extra_mime_headers
                    .as_deref()
                    .map_or(std::ptr::null_mut(), |h| self.strdup(h)),
            };
        }
        record
    }

    /// Release one record the way the native record destructor does: the
    /// rename slot is not touched
    unsafe fn free_record(&self, record: *mut sys::pst_record) {
        let r = unsafe { &mut *record };
        if !r.pi.is_null() {
            drop(unsafe { Box::from_raw(r.pi as *mut MemoryEntry) });
            self.track_free();
            r.pi = std::ptr::null_mut();
        }
        unsafe {
            self.free(r.logical_path.cast());
            self.free(r.name.cast());
            self.free(r.extra_mime_headers.cast());
            self.free(record.cast());
        }
    }

    fn write_entry(
        &self,
        entry: &MemoryEntry,
        export: &MemoryExport,
        path: PathBuf,
    ) -> std::io::Result<c_int> {
        let conf = &export.conf;
        match entry.tag {
            sys::PST_FOLDER => {
                fs::create_dir(&path)?;
                Ok(1)
            }
            sys::PST_MESSAGE => {
                if conf.output_type_mode & sys::OTMODE_EMAIL == 0 {
                    return Ok(0);
                }
                let mut out = fs::File::create(&path)?;
                if let Some(headers) = &entry.extra_mime_headers {
                    writeln!(out, "{}", headers.trim_end())?;
                }
                writeln!(out, "Subject: {}", entry.name)?;
                writeln!(out)?;
                writeln!(out, "{}", entry.body)?;
                let accepted = entry.attachments.iter().filter(|a| export.accepts(a));
                if conf.mode == sys::MODE_SEPARATE {
                    // Separate layout: one file per attachment next to the message
                    let number = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    for attachment in accepted {
                        let name = format!("{}-{}", number, attachment);
                        fs::write(path.with_file_name(name), b"")?;
                    }
                } else {
                    for attachment in accepted {
                        writeln!(out, "X-Attachment: {}", attachment)?;
                    }
                }
                Ok(1)
            }
            sys::PST_JOURNAL => {
                let mut out = fs::File::create(&path)?;
                writeln!(out, "BEGIN:VJOURNAL\nSUMMARY:{}\nEND:VJOURNAL", entry.name)?;
                Ok(1)
            }
            sys::PST_APPOINTMENT => {
                let mut out = fs::File::create(&path)?;
                writeln!(out, "BEGIN:VEVENT\nSUMMARY:{}\nEND:VEVENT", entry.name)?;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for InMemoryEngine {
    fn open_and_enumerate(&self, path: &CStr) -> RawEnumeration {
        let archives = self.archives.borrow();
        let entries = match archives.get(path.to_string_lossy().as_ref()) {
            None => return self.failed(sys::ERROR_OPEN, c"Cannot open file."),
            Some(MemoryArchive::Failing(code)) => {
                let message = match code {
                    ErrorCode::IndexLoadFailure => c"Cannot load index.",
                    ErrorCode::RootNotFound => c"Root record not found.",
                    ErrorCode::OpenFailure => c"Cannot open file.",
                    _ => c"Traversing error.",
                };
                return self.failed(code.as_raw(), message);
            }
            Some(MemoryArchive::Entries(entries)) => entries,
        };

        let handle = self.calloc(1, size_of::<MemoryEnumeration>()) as *mut MemoryEnumeration;
        let items = self.calloc(2, size_of::<*mut sys::pst_record>()) as *mut *mut sys::pst_record;
        if handle.is_null() || items.is_null() {
            unsafe {
                self.free(handle.cast());
                self.free(items.cast());
            }
            return RawEnumeration::empty(sys::ERROR_OPEN);
        }

        let out = unsafe { &mut *handle };
        *out = MemoryEnumeration {
            items,
            capacity: 1,
            used: 0,
            last_error: std::ptr::null(),
            num_error: sys::NO_ERROR,
        };
        for entry in entries {
            let record = self.make_record(entry, handle.cast());
            if !record.is_null() {
                unsafe { self.push(out, record) };
            }
        }

        RawEnumeration {
            handle: handle.cast(),
            items: out.items,
            capacity: out.capacity,
            used: out.used,
            last_error: out.last_error,
            num_error: out.num_error,
            file: handle.cast(),
        }
    }

    unsafe fn create_export(&self, conf: sys::pst_export_conf) -> *mut c_void {
        if self.reject_exports.get() {
            return std::ptr::null_mut();
        }
        let extensions = if conf.acceptable_extensions.is_null() {
            Vec::new()
        } else {
            unsafe { CStr::from_ptr(conf.acceptable_extensions) }
                .to_string_lossy()
                .split([',', ' ', ';'])
                .map(|e| e.trim().trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .collect()
        };
        self.track_alloc();
        Box::into_raw(Box::new(MemoryExport {
            conf: sys::pst_export_conf {
                acceptable_extensions: std::ptr::null_mut(),
                ..conf
            },
            extensions,
        }))
        .cast()
    }

    unsafe fn write_record(
        &self,
        record: *mut sys::pst_record,
        export: *mut c_void,
        error: &mut c_int,
    ) -> c_int {
        *error = sys::NO_ERROR;
        let r = unsafe { &*record };
        let export = unsafe { &*(export as *const MemoryExport) };

        if !matches!(
            r.type_,
            sys::PST_FOLDER
                | sys::PST_MESSAGE
                | sys::PST_JOURNAL
                | sys::PST_APPOINTMENT
                | sys::PST_MESSAGE_STORE
        ) {
            *error = sys::ERROR_UNKNOWN_RECORD;
            return -1;
        }
        if r.renaming.is_null() || r.pi.is_null() {
            *error = sys::ERROR_OPEN;
            return 0;
        }

        let entry = unsafe { &*(r.pi as *const MemoryEntry) };
        let renaming = unsafe { CStr::from_ptr(r.renaming) };
        let path = PathBuf::from(renaming.to_string_lossy().into_owned());
        match self.write_entry(entry, export, path) {
            Ok(written) => written,
            Err(e) => {
                log::debug!("[MEMORY] Write failed for {}: {}", entry.name, e);
                *error = sys::ERROR_OPEN;
                0
            }
        }
    }

    unsafe fn destroy_enumeration(&self, handle: *mut c_void) {
        let handle = handle as *mut MemoryEnumeration;
        let out = unsafe { &mut *handle };
        let mut cursor = out.items;
        unsafe {
            while !(*cursor).is_null() {
                self.free_record(*cursor);
                cursor = cursor.add(1);
            }
            self.free(out.items.cast());
            self.free(handle.cast());
        }
    }

    unsafe fn destroy_export(&self, context: *mut c_void) {
        drop(unsafe { Box::from_raw(context as *mut MemoryExport) });
        self.track_free();
    }

    fn alloc_string(&self, value: &CStr) -> *mut c_char {
        let ptr = unsafe { libc::strdup(value.as_ptr()) };
        if !ptr.is_null() {
            self.track_alloc();
        }
        ptr
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        if !ptr.is_null() {
            unsafe { libc::free(ptr) };
            self.track_free();
        }
    }
}
