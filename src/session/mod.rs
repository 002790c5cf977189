mod copy;
mod registry;
mod session;
mod slot;
mod status;
mod types;

pub(crate) use session::{DownloadSink, UploadBody};

pub use registry::SessionRegistry;
pub use session::Session;
pub use status::StatusMessage;
pub use types::{sanitize_filename, FileDescriptor, SessionId};
