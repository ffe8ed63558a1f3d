//! PST crate - Safe boundary over a native PST archive engine
//!
//! This crate wraps an engine that parses legacy mailbox container files and
//! exports their contents to disk. The engine owns all format knowledge; this
//! crate owns the lifecycle of what it hands out:
//! - Export configuration validation and export handles
//! - Archive enumeration and per-record wrappers
//! - Rename strings transferred into native records
//! - Exactly-once release of every native handle
//!
//! The engine sits behind the [`Engine`] trait. [`InMemoryEngine`] needs no
//! native library; the `native` feature adds `NativeEngine`, which links
//! `libgopst`.
//!
//! ```no_run
//! use std::rc::Rc;
//! use pst::{Engine, Export, ExportConfig, InMemoryEngine, Pst};
//!
//! let engine: Rc<dyn Engine> = Rc::new(InMemoryEngine::new());
//! let mut archive = Pst::open(engine.clone(), "backup.pst");
//! let mut export = Export::create(engine, &ExportConfig::default())?;
//! let mut records = archive.list()?;
//! for (i, record) in records.iter_mut().enumerate() {
//!     record.set_renaming(&format!("out/{}", i))?;
//!     record.write_to_file(&export)?;
//! }
//! pst::destroy_all(&mut records)?;
//! archive.destroy()?;
//! export.destroy()?;
//! # Ok::<(), pst::Error>(())
//! ```

pub mod archive;
pub mod engine;
pub mod error;
pub mod export;
pub mod logging;
pub mod sys;

pub use archive::{Pst, Record, RecordKind, WriteOutcome, destroy_all};
#[cfg(feature = "native")]
pub use engine::NativeEngine;
pub use engine::{Engine, InMemoryEngine, MemoryArchive, MemoryEntry, RawEnumeration};
pub use error::{ConfigError, ConfigField, Error, ErrorCode, Handle};
pub use export::{
    ContactMode, DeletedMode, Export, ExportConfig, ExportSettings, Mode, OutputMode,
    OutputTypes, RecurseFlavor, SeparateFlags, SeparateFlavor,
};
pub use logging::{LogEvent, LogLevel, LogSink, init_logger, set_log_level, set_log_sink};
