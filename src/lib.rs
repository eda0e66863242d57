pub mod record;
pub mod chain;
pub mod theme;
pub mod format;
pub mod render;
pub mod sink;
pub mod handler;
pub mod layer;

pub mod env;
pub mod error;
pub mod init;
pub mod options;

pub use handler::{Handler, PrettyHandler};
pub use layer::PrettyLayer;
pub use options::Options;
pub use record::{Attr, Level, Record, Source, Value};
