//! Owning handle over a native export context

use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use libc::c_void;

use super::{ExportConfig, ExportSettings};
use crate::engine::{Engine, NativeString};
use crate::error::{Error, Handle};

struct LiveExport {
    engine: Rc<dyn Engine>,
    context: NonNull<c_void>,
    /// Referenced by the native context until it is destroyed
    extensions: Option<NativeString>,
    settings: ExportSettings,
}

/// One configured output session
///
/// Created only from a configuration that passed validation. `destroy`
/// releases the native context exactly once; every later use reports
/// [`Error::AlreadyDestroyed`]. A live export is destroyed on drop.
#[derive(Default)]
pub struct Export {
    live: Option<LiveExport>,
}

impl Export {
    /// Validate `config` and create a native export context
    ///
    /// Nothing is allocated when validation fails. When the engine returns
    /// no context, the transferred filter string is released again and
    /// [`Error::ExportRejected`] is returned.
    pub fn create(engine: Rc<dyn Engine>, config: &ExportConfig) -> Result<Self, Error> {
        let settings = config.validate().inspect_err(|e| {
            log::warn!("[EXPORT] Rejecting configuration: {}", e);
        })?;

        let extensions = settings
            .acceptable_extensions
            .as_deref()
            .map(|e| NativeString::new(&engine, e))
            .transpose()?;
        let ext_ptr = extensions
            .as_ref()
            .map_or(std::ptr::null_mut(), NativeString::as_ptr);

        let native = settings.to_native(ext_ptr);
        let context = unsafe { engine.create_export(native) };
        let Some(context) = NonNull::new(context) else {
            log::warn!("[EXPORT] Native engine returned no export context");
            return Err(Error::ExportRejected);
        };

        log::debug!(
            "[EXPORT] Created export context (mode {:?}, filter {:?})",
            settings.mode,
            settings.acceptable_extensions
        );

        Ok(Self {
            live: Some(LiveExport {
                engine,
                context,
                extensions,
                settings,
            }),
        })
    }

    /// Whether the native context is still held
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Validated settings this export was created with
    pub fn settings(&self) -> Option<&ExportSettings> {
        self.live.as_ref().map(|l| &l.settings)
    }

    /// Release the native context and the transferred filter string
    pub fn destroy(&mut self) -> Result<(), Error> {
        let live = self.live.take().ok_or(Error::AlreadyDestroyed(Handle::Export))?;
        unsafe { live.engine.destroy_export(live.context.as_ptr()) };
        // The filter string goes only after the context that borrowed it.
        drop(live.extensions);
        log::debug!("[EXPORT] Destroyed export context");
        Ok(())
    }

    /// Native context, checked to belong to `engine`
    pub(crate) fn context_for(&self, engine: &Rc<dyn Engine>) -> Result<*mut c_void, Error> {
        let live = self.live.as_ref().ok_or(Error::AlreadyDestroyed(Handle::Export))?;
        if !Rc::ptr_eq(&live.engine, engine) {
            return Err(Error::EngineMismatch);
        }
        Ok(live.context.as_ptr())
    }
}

impl Drop for Export {
    fn drop(&mut self) {
        if self.is_live() {
            let _ = self.destroy();
        }
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export")
            .field("live", &self.is_live())
            .field("settings", &self.settings())
            .finish()
    }
}
