//! Core types and refresh pipeline for the Limburg.net waste pickup feed.

/// Deriving upcoming pickups from parsed records.
pub mod aggregate;
/// Tolerant date parsing for feed cells.
pub mod dates;
/// CSV feed ingestion.
pub mod ingest;
/// Domain models shared by every stage.
pub mod model;
/// Error type and the transport port.
pub mod ports;
/// Scheduled refresh cycles and the cached snapshot.
pub mod refresh;
/// Runtime settings.
pub mod settings;
/// Source configuration and loading.
pub mod source;

pub use aggregate::*;
pub use dates::*;
pub use ingest::*;
pub use model::*;
pub use ports::*;
pub use refresh::*;
pub use settings::*;
pub use source::*;
