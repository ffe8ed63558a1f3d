//! Lifecycle lines reach a host sink through the forwarding logger
//!
//! The logger is process-global, so this file holds a single test.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use log::Level;
use pst::{
    Engine, Export, ExportConfig, Handle, InMemoryEngine, LogEvent, LogLevel, LogSink,
    MemoryEntry, Pst, destroy_all, init_logger, set_log_sink,
};

#[derive(Default)]
struct Collect(Mutex<Vec<LogEvent>>);

impl LogSink for Collect {
    fn on_log(&self, event: LogEvent) {
        self.0.lock().unwrap().push(event);
    }
}

impl Collect {
    fn find(&self, message: &str) -> Option<LogEvent> {
        let events = self.0.lock().unwrap();
        events.iter().find(|e| e.message == message).cloned()
    }
}

#[test]
fn test_archive_lifecycle_is_forwarded() {
    init_logger(Level::Debug).unwrap();
    let sink = Arc::new(Collect::default());
    set_log_sink(Some(sink.clone()));

    let mem = Rc::new(InMemoryEngine::new());
    mem.add_archive(
        "mailbox.pst",
        vec![
            MemoryEntry::folder("/", "Inbox"),
            MemoryEntry::message("/Inbox", "Hello", "First message"),
        ],
    );
    let engine: Rc<dyn Engine> = mem.clone();

    let mut export = Export::create(engine.clone(), &ExportConfig::default()).unwrap();
    let mut pst = Pst::open(engine, "mailbox.pst");
    let mut records = pst.list().unwrap();
    records[1].write_to_file(&export).unwrap();
    destroy_all(&mut records).unwrap();
    pst.destroy().unwrap();
    export.destroy().unwrap();
    log::info!("[PST] Host line");
    set_log_sink(None);

    let opened = sink.find("Opened mailbox.pst with 2 records").unwrap();
    assert_eq!(opened.level, LogLevel::Info);
    assert_eq!(opened.handle, Some(Handle::Pst));

    let unnamed = sink.find("Record 1 (Hello) has no output path").unwrap();
    assert_eq!(unnamed.level, LogLevel::Warn);
    assert_eq!(unnamed.handle, Some(Handle::Record));
    assert_eq!(unnamed.index, Some(1));

    for index in 0..2 {
        let destroyed = sink.find(&format!("Record {} destroyed", index)).unwrap();
        assert_eq!(destroyed.handle, Some(Handle::Record));
        assert_eq!(destroyed.index, Some(index));
    }

    assert_eq!(sink.find("Destroyed archive").unwrap().handle, Some(Handle::Pst));
    assert_eq!(
        sink.find("Destroyed export context").unwrap().handle,
        Some(Handle::Export)
    );
    assert!(sink.find("Host line").is_none());
}
