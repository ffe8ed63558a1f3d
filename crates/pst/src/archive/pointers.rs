//! Walking the native record array

use std::ptr::NonNull;

use crate::sys;

/// Lazy walk over a null-terminated array of record pointers
///
/// Stops at the first null entry or at `bound`, whichever comes first, so a
/// missing sentinel never reads past the reported record count. Each call to
/// [`RecordPointers::new`] restarts from index 0.
#[derive(Debug, Clone)]
pub(crate) struct RecordPointers {
    items: *mut *mut sys::pst_record,
    bound: usize,
    next: usize,
}

impl RecordPointers {
    /// # Safety
    ///
    /// `items` must be null or valid for reads of `bound` pointers.
    pub(crate) unsafe fn new(items: *mut *mut sys::pst_record, bound: usize) -> Self {
        Self {
            items,
            bound,
            next: 0,
        }
    }
}

impl Iterator for RecordPointers {
    type Item = (usize, NonNull<sys::pst_record>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.items.is_null() || self.next >= self.bound {
            return None;
        }
        let index = self.next;
        match NonNull::new(unsafe { *self.items.add(index) }) {
            Some(record) => {
                self.next += 1;
                Some((index, record))
            }
            None => {
                self.next = self.bound;
                None
            }
        }
    }
}
