//! Operation dispatch.
//!
//! A dispatch is captured as an immutable request record (target ids, names
//! and the snapshots they had when the user acted), executed against the
//! remote transform, and the result is applied back by identity. The editor
//! owns the before/after transitions; this module owns the async middle.
//!
//! One target: a single awaited call, result goes to the preview gate.
//! Several targets: every call runs independently, all are awaited
//! (all-settled), and successes are committed together.

use pixshop_ai::{Operation, Transform, TransformError, TransformRequest};
use pixshop_core::{ImageId, Snapshot, UpscaleTier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Command {
    /// Localized edit on the active image at the editor's focus point.
    Retouch { instruction: String },
    Filter { style: String },
    Adjust { instruction: String },
    Upscale { tier: UpscaleTier },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Retouch { .. } => "retouch",
            Command::Filter { .. } => "filter",
            Command::Adjust { .. } => "adjust",
            Command::Upscale { .. } => "upscale",
        }
    }
}

/// An image as it was when the dispatch started.
#[derive(Debug, Clone)]
pub struct Target {
    pub id: ImageId,
    pub name: String,
    pub snapshot: Snapshot,
}

#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub operation: Operation,
    pub targets: Vec<Target>,
}

impl DispatchRequest {
    pub fn is_batch(&self) -> bool {
        self.targets.len() > 1
    }
}

#[derive(Debug, Clone)]
pub struct TargetResult {
    pub id: ImageId,
    pub name: String,
    pub result: Result<Snapshot, TransformError>,
}

#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub request: DispatchRequest,
    /// One entry per target, in target order.
    pub results: Vec<TargetResult>,
}

/// Execute a request. Never touches editor state.
pub async fn run(request: DispatchRequest, transform: Arc<dyn Transform>) -> DispatchResult {
    let op = request.operation.name();
    tracing::info!(operation = op, targets = request.targets.len(), "dispatch started");

    let results = match request.targets.as_slice() {
        [single] => {
            let result = transform
                .transform(TransformRequest {
                    image: single.snapshot.clone(),
                    operation: request.operation.clone(),
                })
                .await;
            vec![TargetResult {
                id: single.id,
                name: single.name.clone(),
                result,
            }]
        }
        targets => fan_out(targets, &request.operation, transform).await,
    };

    let failed = results.iter().filter(|r| r.result.is_err()).count();
    tracing::info!(
        operation = op,
        succeeded = results.len() - failed,
        failed,
        "dispatch settled"
    );

    DispatchResult { request, results }
}

async fn fan_out(
    targets: &[Target],
    operation: &Operation,
    transform: Arc<dyn Transform>,
) -> Vec<TargetResult> {
    let mut set = JoinSet::new();
    for (index, target) in targets.iter().enumerate() {
        let transform = Arc::clone(&transform);
        let request = TransformRequest {
            image: target.snapshot.clone(),
            operation: operation.clone(),
        };
        set.spawn(async move { (index, transform.transform(request).await) });
    }

    let mut slots: Vec<Option<Result<Snapshot, TransformError>>> =
        (0..targets.len()).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => {
                if let Err(err) = &result {
                    tracing::warn!(image = %targets[index].name, error = %err, "batch target failed");
                }
                slots[index] = Some(result);
            }
            Err(err) => tracing::error!(error = %err, "batch task aborted"),
        }
    }

    targets
        .iter()
        .zip(slots)
        .map(|(target, slot)| TargetResult {
            id: target.id,
            name: target.name.clone(),
            // A task that panicked never filled its slot.
            result: slot.unwrap_or_else(|| {
                Err(TransformError::Transport("edit task aborted".to_string()))
            }),
        })
        .collect()
}
