//! Export configuration and the export handle
//!
//! - [`ExportConfig`]: caller-supplied options, loadable from JSON
//! - [`ExportSettings`]: the validated, typed form
//! - [`Export`]: owning handle over one native export context

mod config;
mod handle;
mod settings;

pub use handle::Export;
pub use settings::{
    ContactMode, DeletedMode, ExportConfig, ExportSettings, Mode, OutputMode, OutputTypes,
    RecurseFlavor, SeparateFlags, SeparateFlavor,
};
