//! Archive enumerator

use std::cell::RefCell;
use std::ffi::{CString, NulError};
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use libc::c_void;

use super::record::Record;
use super::state::{ArchiveState, Enumeration};
use crate::engine::{Engine, copy_c_string};
use crate::error::{Error, ErrorCode, Handle};

/// An opened archive and the records the engine found in it
///
/// Opening never fails: engine failures are reported through
/// [`Pst::num_error`] and [`Pst::last_error`] and leave an empty archive that
/// still has to be destroyed once. Dropping a `Pst` destroys it when no
/// owning records are left; otherwise the native result is released when the
/// last of them goes.
pub struct Pst {
    state: Option<Rc<RefCell<ArchiveState>>>,
    capacity: u32,
    used: u32,
    last_error: String,
    num_error: ErrorCode,
    file: *mut c_void,
}

impl Pst {
    /// Open the archive at `path` and enumerate its records
    pub fn open(engine: Rc<dyn Engine>, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let c_path = match path_to_cstring(path) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("[PST] Cannot open {}: {}", path.display(), e);
                return Self::empty(
                    ArchiveState::new(engine, None),
                    format!("Invalid path: {}", e),
                    ErrorCode::OpenFailure,
                );
            }
        };

        let mut raw = engine.open_and_enumerate(&c_path);
        if raw.used > raw.capacity {
            log::warn!(
                "[PST] Engine reported {} records in {} slots; keeping {}",
                raw.used,
                raw.capacity,
                raw.capacity
            );
            raw.used = raw.capacity;
        }
        let num_error = ErrorCode::from_raw_lossy(raw.num_error);
        let last_error = unsafe { copy_c_string(raw.last_error) };
        let enumeration = Enumeration::adopt(raw);

        let mut pst = Self::empty(ArchiveState::new(engine, enumeration), last_error, num_error);
        if num_error.is_error() {
            log::warn!(
                "[PST] Failed to open {}: {} ({})",
                path.display(),
                pst.last_error,
                num_error
            );
        } else {
            pst.capacity = raw.capacity;
            pst.used = raw.used;
            pst.file = raw.file;
            log::info!("[PST] Opened {} with {} records", path.display(), pst.used);
        }
        pst
    }

    fn empty(state: ArchiveState, last_error: String, num_error: ErrorCode) -> Self {
        Self {
            state: Some(Rc::new(RefCell::new(state))),
            capacity: 0,
            used: 0,
            last_error,
            num_error,
            file: std::ptr::null_mut(),
        }
    }

    /// Number of record slots the engine allocated
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of records the engine enumerated
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Engine message for a failed open; empty on success
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    pub fn num_error(&self) -> ErrorCode {
        self.num_error
    }

    /// Engine file handle, valid until this archive is destroyed
    pub fn file(&self) -> *mut c_void {
        self.file
    }

    pub fn is_live(&self) -> bool {
        self.state.is_some()
    }

    /// Number of live owning records listed from this archive
    pub fn live_records(&self) -> usize {
        self.state
            .as_ref()
            .map_or(0, |s| s.borrow().owned_count())
    }

    /// Wrap every enumerated record
    ///
    /// Each call returns fresh wrappers over the same native records. The
    /// first live wrapper for an index owns it; the others are aliases.
    pub fn list(&self) -> Result<Vec<Record>, Error> {
        let state = self
            .state
            .as_ref()
            .ok_or(Error::AlreadyDestroyed(Handle::Pst))?;

        let pointers = state.borrow().pointers();
        let mut records = Vec::with_capacity(self.used as usize);
        for (index, record) in pointers {
            let owner = state.borrow_mut().claim(index);
            records.push(unsafe { Record::wrap(Rc::clone(state), index, record, owner) });
        }
        log::debug!("[PST] Listed {} records", records.len());
        Ok(records)
    }

    /// Release every transferred rename string and the enumeration result
    ///
    /// Refused with [`Error::RecordsOutstanding`] while owning records are
    /// live; destroy them (or drop them) first.
    pub fn destroy(&mut self) -> Result<(), Error> {
        let state = self
            .state
            .as_ref()
            .ok_or(Error::AlreadyDestroyed(Handle::Pst))?;

        let live = state.borrow().owned_count();
        if live > 0 {
            return Err(Error::RecordsOutstanding { live });
        }
        state.borrow_mut().close();
        self.state = None;
        self.file = std::ptr::null_mut();
        log::debug!("[PST] Destroyed archive");
        Ok(())
    }
}

impl Default for Pst {
    /// A handle that was never opened; destroying it is an error
    fn default() -> Self {
        Self {
            state: None,
            capacity: 0,
            used: 0,
            last_error: String::new(),
            num_error: ErrorCode::NoError,
            file: std::ptr::null_mut(),
        }
    }
}

fn path_to_cstring(path: &Path) -> Result<CString, NulError> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        CString::new(path.as_os_str().as_bytes())
    }
    #[cfg(not(unix))]
    {
        CString::new(path.to_string_lossy().into_owned())
    }
}

impl Drop for Pst {
    fn drop(&mut self) {
        if self.is_live() && self.live_records() == 0 {
            let _ = self.destroy();
        }
    }
}

impl fmt::Debug for Pst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pst")
            .field("capacity", &self.capacity)
            .field("used", &self.used)
            .field("num_error", &self.num_error)
            .field("last_error", &self.last_error)
            .field("live", &self.is_live())
            .finish()
    }
}
