//! pixshop-session: orchestration of remote edits over a multi-image collection.
//!
//! Design rules:
//! - Preconditions are checked before any network call.
//! - Results are applied by the image id captured at dispatch time, never by "whatever is active".
//! - Single-image results wait in the preview gate; batch results commit directly.
//! - One batch failure never rolls back another target's success.
//! - A single loading flag serializes user-initiated operations.

pub mod config;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod export;
pub mod logging;

pub use config::{load_config, save_config, EditorConfig};
pub use dispatch::{run, Command, DispatchRequest, DispatchResult, Target, TargetResult};
pub use editor::{DiscardReason, DispatchOutcome, Editor};
pub use error::{BatchFailure, EditorError, FailedTarget, Precondition};
pub use export::{plan_export, ExportError, ExportFile, ExportPlan};
