//! Core entities: immutable facts pulled from the metric store, the
//! derived statistics and findings built on top of them, and the
//! session that owns all of it for the lifetime of one analysis.

pub mod ad_record;
pub mod anomaly;
pub mod baseline;
pub mod error;
pub mod evidence;
pub mod provider;
pub mod recommendation;
pub mod session;
pub mod summary;
pub mod verdict;

pub use ad_record::{AdRecord, Metric, RawAdRecord};
pub use anomaly::{Anomaly, Polarity, Severity};
pub use baseline::{AccountBaseline, MetricBaseline};
pub use error::{RcaError, Result};
pub use evidence::{Evidence, ProbeDetail, ProbeKind};
pub use provider::Provider;
pub use recommendation::{Action, Recommendation};
pub use session::{Session, SessionId};
pub use summary::AdSummary;
pub use verdict::{Confidence, RootCauseTag, RootCauseVerdict};
