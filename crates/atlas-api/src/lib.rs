// atlas-api: Async Rust client for the RIPE Atlas REST API

pub mod client;
pub mod context;
pub mod credits;
mod de;
pub mod error;
pub mod models;
pub mod pagination;
pub mod probes;

pub use client::{ApiResponse, AtlasClient, ClientConfig, DEFAULT_BASE_URL, TRACE_TARGET};
pub use context::Context;
pub use error::Error;
pub use models::{Credits, Geometry, Page, Probe, ProbeMeasurement, ProbeStatus, ProbeTag};
pub use pagination::Cursor;
