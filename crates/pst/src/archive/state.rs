//! State shared between a `Pst` and the records listed from it

use std::ptr::NonNull;
use std::rc::Rc;

use super::pointers::RecordPointers;
use crate::engine::{Engine, NativeString, RawEnumeration};
use crate::error::Error;
use crate::sys;

/// Where an enumeration result was allocated
///
/// A failed open hands back structures built with the generic allocator;
/// only a successful one may go through the engine's destructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Fallback,
    Engine,
}

/// An enumeration result together with its allocation origin
pub(crate) struct Enumeration {
    raw: RawEnumeration,
    origin: Origin,
}

impl Enumeration {
    /// Tag `raw` by its error code; `None` if the engine allocated nothing
    pub(crate) fn adopt(raw: RawEnumeration) -> Option<Self> {
        if raw.handle.is_null() {
            return None;
        }
        let origin = if raw.num_error == sys::NO_ERROR {
            Origin::Engine
        } else {
            Origin::Fallback
        };
        Some(Self { raw, origin })
    }

    fn dispose(self, engine: &dyn Engine) {
        log::debug!("[PST] Releasing enumeration ({:?} origin)", self.origin);
        match self.origin {
            Origin::Engine => unsafe { engine.destroy_enumeration(self.raw.handle) },
            Origin::Fallback => unsafe {
                engine.free(self.raw.items.cast());
                engine.free(self.raw.handle);
            },
        }
    }
}

/// Native enumeration plus the host-side bookkeeping for its records
///
/// - `owners[i]` is set while a live owning `Record` wraps index `i`
/// - `renames[i]` holds the string currently transferred into record `i`'s
///   rename slot; `None` means the slot is empty
pub(crate) struct ArchiveState {
    engine: Rc<dyn Engine>,
    enumeration: Option<Enumeration>,
    closed: bool,
    owners: Vec<bool>,
    renames: Vec<Option<NativeString>>,
}

impl ArchiveState {
    pub(crate) fn new(engine: Rc<dyn Engine>, enumeration: Option<Enumeration>) -> Self {
        let used = enumeration
            .as_ref()
            .filter(|e| e.origin == Origin::Engine)
            .map_or(0, |e| e.raw.used as usize);
        Self {
            engine,
            enumeration,
            closed: false,
            owners: vec![false; used],
            renames: (0..used).map(|_| None).collect(),
        }
    }

    pub(crate) fn engine(&self) -> &Rc<dyn Engine> {
        &self.engine
    }

    /// Walk the record array from the start
    pub(crate) fn pointers(&self) -> RecordPointers {
        match &self.enumeration {
            Some(e) if !self.closed => unsafe {
                RecordPointers::new(e.raw.items, self.owners.len())
            },
            _ => unsafe { RecordPointers::new(std::ptr::null_mut(), 0) },
        }
    }

    /// Native record at `index`
    pub(crate) fn record_ptr(&self, index: usize) -> Result<NonNull<sys::pst_record>, Error> {
        if self.closed {
            return Err(Error::ArchiveClosed);
        }
        self.pointers()
            .nth(index)
            .map(|(_, record)| record)
            .ok_or(Error::ArchiveClosed)
    }

    /// Claim ownership of `index`; false if a live owner already exists
    pub(crate) fn claim(&mut self, index: usize) -> bool {
        match self.owners.get_mut(index) {
            Some(owned) if !*owned => {
                *owned = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn release_claim(&mut self, index: usize) {
        if let Some(owned) = self.owners.get_mut(index) {
            *owned = false;
        }
    }

    pub(crate) fn owned_count(&self) -> usize {
        self.owners.iter().filter(|o| **o).count()
    }

    pub(crate) fn has_renaming(&self, index: usize) -> bool {
        self.renames.get(index).is_some_and(Option::is_some)
    }

    /// Transfer `value` into the rename slot of record `index`
    ///
    /// The new string is allocated before the old one is released, so a
    /// failed allocation leaves the slot unchanged.
    pub(crate) fn set_renaming(&mut self, index: usize, value: &str) -> Result<(), Error> {
        let record = self.record_ptr(index)?;
        let value = NativeString::new(&self.engine, value)?;
        unsafe { (*record.as_ptr()).renaming = value.as_ptr() };
        // Replacing drops (and frees) the previous string, if any.
        self.renames[index] = Some(value);
        Ok(())
    }

    /// Empty the rename slot of record `index`, zeroing the native field
    pub(crate) fn clear_renaming(&mut self, index: usize) {
        let Some(value) = self.renames.get_mut(index).and_then(Option::take) else {
            return;
        };
        if let Ok(record) = self.record_ptr(index) {
            unsafe { (*record.as_ptr()).renaming = std::ptr::null_mut() };
        }
        drop(value);
    }

    /// Release every transferred string, then the enumeration itself
    pub(crate) fn close(&mut self) {
        if self.closed {
            return;
        }
        for index in 0..self.renames.len() {
            self.clear_renaming(index);
        }
        self.closed = true;
        if let Some(enumeration) = self.enumeration.take() {
            enumeration.dispose(self.engine.as_ref());
        }
    }
}

impl Drop for ArchiveState {
    fn drop(&mut self) {
        self.close();
    }
}
