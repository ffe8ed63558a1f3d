//! One enumerated archive entry

use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use libc::c_int;

use super::state::ArchiveState;
use crate::engine::copy_c_string;
use crate::error::{Error, ErrorCode, Handle};
use crate::export::Export;
use crate::sys;

/// Kind of an enumerated entry, decoded from its type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Store,
    Message,
    Folder,
    Journal,
    Appointment,
    MessageStore,
    Unknown(u8),
}

impl RecordKind {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            sys::PST_STORE => RecordKind::Store,
            sys::PST_MESSAGE => RecordKind::Message,
            sys::PST_FOLDER => RecordKind::Folder,
            sys::PST_JOURNAL => RecordKind::Journal,
            sys::PST_APPOINTMENT => RecordKind::Appointment,
            sys::PST_MESSAGE_STORE => RecordKind::MessageStore,
            other => RecordKind::Unknown(other),
        }
    }
}

/// Result of writing one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub written: bool,
    pub code: ErrorCode,
}

/// Host-side wrapper over one native record
///
/// A record refers to its native entry by index into the parent [`Pst`]'s
/// array. The first wrapper created for an index owns it; wrappers from
/// later `list()` calls are aliases that may rename and write but not
/// destroy. Dropping a live owner destroys it.
///
/// [`Pst`]: super::Pst
#[derive(Default)]
pub struct Record {
    archive: Option<Rc<RefCell<ArchiveState>>>,
    index: usize,
    owner: bool,
    type_of_record: u8,
    logical_path: String,
    name: String,
    extra_mime_headers: String,
    renaming: Option<String>,
    last_error: ErrorCode,
}

impl Record {
    /// Copy the string fields of `record` into a new wrapper
    ///
    /// # Safety
    ///
    /// `record` must point to a live native record.
    pub(crate) unsafe fn wrap(
        archive: Rc<RefCell<ArchiveState>>,
        index: usize,
        record: NonNull<sys::pst_record>,
        owner: bool,
    ) -> Self {
        let r = unsafe { record.as_ref() };
        let renaming = (!r.renaming.is_null()).then(|| unsafe { copy_c_string(r.renaming) });
        Self {
            archive: Some(archive),
            index,
            owner,
            type_of_record: r.type_,
            logical_path: unsafe { copy_c_string(r.logical_path) },
            name: unsafe { copy_c_string(r.name) },
            extra_mime_headers: unsafe { copy_c_string(r.extra_mime_headers) },
            renaming,
            last_error: ErrorCode::NoError,
        }
    }

    pub fn type_of_record(&self) -> u8 {
        self.type_of_record
    }

    pub fn kind(&self) -> RecordKind {
        RecordKind::from_tag(self.type_of_record)
    }

    /// Folder path of this entry inside the archive, e.g. `/Inbox/Project`
    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extra_mime_headers(&self) -> &str {
        &self.extra_mime_headers
    }

    /// Output path as this wrapper last saw it
    ///
    /// Captured at `list()` time and updated by this wrapper's own
    /// [`set_renaming`](Self::set_renaming). It is not refreshed when another
    /// wrapper for the same index renames or destroys the record; an alias
    /// keeps reporting the old value after its owner clears the slot. List
    /// again to read the native state.
    pub fn renaming(&self) -> Option<&str> {
        self.renaming.as_deref()
    }

    /// Whether exporting this record creates a directory
    pub fn is_dir(&self) -> bool {
        self.kind() == RecordKind::Folder
    }

    /// Code reported by the most recent write
    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    /// Position in the parent's record array
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this wrapper is the one allowed to destroy its index
    pub fn is_owner(&self) -> bool {
        self.archive.is_some() && self.owner
    }

    pub fn is_live(&self) -> bool {
        self.archive.is_some()
    }

    fn archive(&self) -> Result<&Rc<RefCell<ArchiveState>>, Error> {
        self.archive
            .as_ref()
            .ok_or(Error::AlreadyDestroyed(Handle::Record))
    }

    /// Set the output path the engine writes this record to
    ///
    /// The string is transferred into the native record; a previously
    /// transferred value is released first. May be called any number of
    /// times, from the owner or from an alias.
    pub fn set_renaming(&mut self, new_name: &str) -> Result<(), Error> {
        self.archive()?
            .borrow_mut()
            .set_renaming(self.index, new_name)?;
        self.renaming = Some(new_name.to_string());
        Ok(())
    }

    /// Ask the engine to write this record through `export`
    ///
    /// Engine failures come back in [`WriteOutcome::code`] and never as an
    /// `Err`; `Err` is reserved for destroyed handles. A record without a
    /// renaming is not handed to the engine.
    pub fn write_to_file(&mut self, export: &Export) -> Result<WriteOutcome, Error> {
        let state = self.archive()?.borrow();
        let record = state.record_ptr(self.index)?;
        let context = export.context_for(state.engine())?;

        if !state.has_renaming(self.index) {
            log::warn!("[PST] Record {} ({}) has no output path", self.index, self.name);
            drop(state);
            return Ok(self.finish_write(false, ErrorCode::OpenFailure));
        }

        let mut error: c_int = sys::NO_ERROR;
        let written = unsafe { state.engine().write_record(record.as_ptr(), context, &mut error) };
        drop(state);

        let code = ErrorCode::from_raw_lossy(error);
        if code.is_error() {
            log::debug!("[PST] Record {} ({}) not written: {}", self.index, self.name, code);
        }
        Ok(self.finish_write(written > 0, code))
    }

    fn finish_write(&mut self, written: bool, code: ErrorCode) -> WriteOutcome {
        self.last_error = code;
        WriteOutcome { written, code }
    }

    /// Release the rename string and detach from the native record
    ///
    /// Fails on a destroyed or never-listed record. An alias is detached but
    /// reports [`Error::NotOwner`]; the native record stays with its owner.
    pub fn destroy(&mut self) -> Result<(), Error> {
        let archive = self
            .archive
            .take()
            .ok_or(Error::AlreadyDestroyed(Handle::Record))?;
        if !self.owner {
            return Err(Error::NotOwner { index: self.index });
        }
        let mut state = archive.borrow_mut();
        state.clear_renaming(self.index);
        state.release_claim(self.index);
        log::debug!("[PST] Record {} destroyed", self.index);
        Ok(())
    }
}

impl Drop for Record {
    fn drop(&mut self) {
        if self.is_owner() {
            let _ = self.destroy();
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("index", &self.index)
            .field("kind", &self.kind())
            .field("logical_path", &self.logical_path)
            .field("name", &self.name)
            .field("renaming", &self.renaming)
            .field("owner", &self.owner)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Destroy every record in `records`
///
/// Keeps going past failures so every record gets its chance to release;
/// the last error seen is returned.
pub fn destroy_all(records: &mut [Record]) -> Result<(), Error> {
    let mut last = None;
    for record in records.iter_mut() {
        if let Err(e) = record.destroy() {
            last = Some(e);
        }
    }
    last.map_or(Ok(()), Err)
}
