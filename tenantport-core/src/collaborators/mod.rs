//! Interfaces the engine consumes from its host, with in-process implementations.

pub mod jobs;
pub mod notifier;
pub mod routing;
pub mod signing;
pub mod storage;

pub use jobs::{BufferedJobQueue, Job, JobQueue, JobRunner, TokioJobQueue};
pub use notifier::{LogNotifier, Notice, Notifier, RecordingNotifier};
pub use routing::{ProductRoutes, Route, RouteRecognizer};
pub use signing::{GlobalId, ReferenceSigner, ATTACHABLE_PURPOSE};
pub use storage::{AttachmentStore, BlobReader, DiskAttachmentStore, MemoryAttachmentStore};
