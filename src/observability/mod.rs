//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by EnvFilter)
//!     → Metrics endpoint (Prometheus scrape, when installed)
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing a subscriber or recorder is up to the binary
//! - Metrics are cheap (no-ops without a recorder)
//! - Validation failures are counted, not logged

pub mod logging;
pub mod metrics;
