// Boundary to the remote image-generation service.
// Defines what we ask for (operations), what can come back (a snapshot or a
// distinguishable failure), and one HTTP implementation of that contract.

use async_trait::async_trait;
use pixshop_core::{EditKind, Point, Snapshot, UpscaleTier};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod client;
pub mod prompt;
pub mod response;

pub use client::{decode_reply, ClientConfig, GenerativeClient};
pub use response::{parse_response, GenerateResponseV1};

/// One remote edit, parameterized by its instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Operation {
    /// Localized edit around a focus point in source-image pixels.
    Retouch { instruction: String, focus: Point },
    Filter { style: String },
    Adjust { instruction: String },
    Upscale { tier: UpscaleTier },
}

impl Operation {
    pub fn edit_kind(&self) -> EditKind {
        match self {
            Operation::Retouch { .. } => EditKind::Retouch,
            Operation::Filter { .. } => EditKind::Filter,
            Operation::Adjust { .. } => EditKind::Adjust,
            Operation::Upscale { tier } => EditKind::Upscale(*tier),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Retouch { .. } => "retouch",
            Operation::Filter { .. } => "filter",
            Operation::Adjust { .. } => "adjust",
            Operation::Upscale { .. } => "upscale",
        }
    }

    /// The text instruction as sent to the provider.
    pub fn instruction(&self) -> String {
        match self {
            Operation::Retouch { instruction, .. } => instruction.clone(),
            Operation::Filter { style } => style.clone(),
            Operation::Adjust { instruction } => instruction.clone(),
            Operation::Upscale { tier } => tier.label().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub image: Snapshot,
    pub operation: Operation,
}

/// Remote transform capability. Implementations may fail in three
/// distinguishable ways, see `TransformError`.
#[async_trait]
pub trait Transform: Send + Sync {
    async fn transform(&self, request: TransformRequest) -> Result<Snapshot, TransformError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    /// Content policy refused the request.
    #[error("request was blocked: {reason}")]
    Blocked { reason: String },

    /// The call went through but no image came back.
    #[error("the model did not return an image{}", explanation_suffix(.explanation))]
    EmptyResult { explanation: Option<String> },

    #[error("transport failure: {0}")]
    Transport(String),
}

fn explanation_suffix(explanation: &Option<String>) -> String {
    explanation
        .as_deref()
        .map(|text| format!(": {text}"))
        .unwrap_or_default()
}

impl From<reqwest::Error> for TransformError {
    fn from(err: reqwest::Error) -> Self {
        TransformError::Transport(err.to_string())
    }
}
