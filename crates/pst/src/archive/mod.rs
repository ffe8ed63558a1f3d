//! Opened archives and their records
//!
//! A [`Pst`] owns the engine's enumeration result. [`Record`]s listed from
//! it share that state and refer to native records by index, so a record
//! outliving its archive reports [`Error::ArchiveClosed`] instead of reading
//! freed memory.
//!
//! [`Error::ArchiveClosed`]: crate::Error::ArchiveClosed

mod pointers;
mod pst;
mod record;
mod state;

pub use pst::Pst;
pub use record::{Record, RecordKind, WriteOutcome, destroy_all};
