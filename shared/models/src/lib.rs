//! # Cote Domain Models
//!
//! Types shared by the bulletin pipeline and the HTTP API.
//!
//! ## Key Models
//!
//! - **RawDocument** / **ExtractedText**: transient pipeline artefacts
//! - **MeasurementRecord**: one station reading (level, unit, date, trend)
//! - **Snapshot**: the records of one successful run plus its timestamp
//! - **StatusView**: the `/status` payload, pending until the first success
//! - **StationThreshold** / **StationAlert**: attention and flood levels

pub mod document;
pub mod measurement;
pub mod snapshot;
pub mod station;


pub use document::*;
pub use measurement::*;
pub use snapshot::*;
pub use station::*;
