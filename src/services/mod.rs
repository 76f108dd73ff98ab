// External collaborators consumed by the engine, plus in-memory implementations

pub mod catalog;
pub mod error_sink;
pub mod fetcher;
pub mod persistence;
pub mod reference;

pub use catalog::{CatalogError, CatalogFixture, InMemoryCatalog, ReferenceEntry};
pub use error_sink::{CollectingErrorSink, ErrorSink, TracingErrorSink};
pub use fetcher::RecordFetcher;
pub use persistence::Persistence;
pub use reference::{resolve_for, CachingResolver, Reference, ReferenceKind, ReferenceResolver};
