//! Vodforge - lazy video-derivative resolution engine
//!
//! Given a source video asset, the engine decides which encoded derivative
//! variants are currently playable, lazily admits encode jobs for
//! eligible-but-missing variants through a deduplicating gateway, and
//! guarantees that every enabled codec family is represented by at least
//! one ready-or-pending derivative. Encoding itself, byte storage, and job
//! execution are external collaborators behind narrow traits.

pub mod asset;
pub mod catalog;
pub mod files;
pub mod geometry;
pub mod queue;
pub mod sources;
pub mod store;

pub use asset::{FileAsset, VideoAsset};
pub use catalog::{DerivativeCatalog, DerivativeProfile};
pub use files::{DerivativeStore, FsDerivativeStore};
pub use queue::{JobQueue, JobQueueGateway, SqliteJobQueue};
pub use sources::{ResolveOptions, SourceDescriptor, SourceResolver};
pub use store::{SqliteStateStore, StateStore, TranscodeStateStore};
