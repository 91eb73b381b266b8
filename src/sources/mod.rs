//! Source resolution: descriptors, the local resolver, and the remote
//! resolver.

pub mod descriptor;
pub mod remote;
pub mod resolver;

pub use descriptor::{ResolveOptions, SourceDescriptor};
pub use remote::{
    HttpRemoteRepo, MemorySourceCache, RemoteDerivativesResponse, RemoteRepo,
    RemoteSourceResolver, SourceCache,
};
pub use resolver::SourceResolver;
