//! # tmRust - Trust Management Simulation for P2P File Sharing
//!
//! Replays a synthetic workload of file transactions against a population of
//! peers with declared (and sometimes deceptive) behaviors, and measures how
//! well a trust-management algorithm steers good peers toward valid sources.
//!
//! ## Core Components
//!
//! - **Simulator**: per-cycle transaction engine (commit, feedback, request, drain)
//! - **Network**: peers, the dense relation matrix, file libraries and the delay queue
//! - **TrustAlg**: EigenTrust, EigenTrust-Incremental, TNA-SL, PeerTrust/MyTrust,
//!   ThresholdTrust and None
//! - **MaliciousCoordinator**: colluding-peer strategies (Naive, Isolated, Collective)
//! - **Trace/Report**: the text formats a run reads and writes
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use tm_rust::{load_trace, save_report, report_path, Algorithm, MaliciousStrategy, Simulator};
//!
//! let input = Path::new("traces/sample.trace");
//! let trace = load_trace(input)?;
//! let simulator = Simulator::new(
//!     trace.params.clone(),
//!     trace.build_network(),
//!     Algorithm::EigenTrust,
//!     MaliciousStrategy::Collective,
//!     Some(42),
//! );
//! let result = simulator.run(&trace.requests)?;
//! save_report(&result, &report_path(input, result.extension))?;
//! # Ok::<(), tm_rust::SimError>(())
//! ```

// Simulation core
pub mod tm_interface;
pub mod tm_bandwidth;
pub mod tm_network;
pub mod tm_stats;
pub mod tm_context;
pub mod tm_source;
pub mod tm_malicious;
pub mod tm_simulator;

// Trust algorithms
pub mod tm_trust;
pub mod tm_eigen;
pub mod tm_peertrust;
pub mod tm_opinion;
pub mod tm_tnasl;

// I/O
pub mod tm_trace;
pub mod tm_report;
pub mod tm_error;

// Re-export commonly used types
pub use tm_context::{SimContext, SimParams};
pub use tm_error::SimError;
pub use tm_interface::{
    Behavior, Cycle, FeedbackHistory, FeedbackView, FileId, PeerId, Transaction,
    TransactionRequest,
};
pub use tm_malicious::{MaliciousCoordinator, MaliciousStrategy};
pub use tm_network::Network;
pub use tm_report::{report_path, save_report, write_report};
pub use tm_simulator::{SimResult, Simulator};
pub use tm_stats::Statistics;
pub use tm_trace::{load_trace, read_trace, save_trace, write_trace, Trace};
pub use tm_trust::{Algorithm, TrustAlg};
