//! The JSON the provider sends back, and how it maps onto our contract.
//!
//! Only the fields we act on are modeled; everything else is ignored so
//! provider-side additions don't break parsing.

use base64::{engine::general_purpose, Engine as _};
use pixshop_core::{EditKind, Snapshot, SnapshotOrigin};
use serde::{Deserialize, Serialize};

use crate::TransformError;

/// Finish reasons that mean the provider refused on policy grounds.
const BLOCKING_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "IMAGE_SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateResponseV1 {
    pub candidates: Vec<CandidateV1>,
    pub prompt_feedback: Option<PromptFeedbackV1>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateV1 {
    pub content: Option<ContentV1>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentV1 {
    pub parts: Vec<PartV1>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartV1 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineDataV1>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InlineDataV1 {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptFeedbackV1 {
    pub block_reason: Option<String>,
    pub block_reason_message: Option<String>,
}

/// Turn a provider response into a new snapshot derived from `source`.
pub fn parse_response(
    response: &GenerateResponseV1,
    source: &Snapshot,
    kind: EditKind,
) -> Result<Snapshot, TransformError> {
    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            let reason = match &feedback.block_reason_message {
                Some(message) => format!("{reason}: {message}"),
                None => reason.clone(),
            };
            tracing::warn!(reason = %reason, "provider blocked the prompt");
            return Err(TransformError::Blocked { reason });
        }
    }

    let candidate = response.candidates.first();
    let parts = candidate
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.as_slice())
        .unwrap_or_default();

    if let Some(inline) = parts.iter().find_map(|p| p.inline_data.as_ref()) {
        let bytes = general_purpose::STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| TransformError::Transport(format!("undecodable image payload: {e}")))?;
        if bytes.is_empty() {
            return Err(TransformError::EmptyResult { explanation: None });
        }
        tracing::debug!(mime = %inline.mime_type, len = bytes.len(), "provider returned image");
        return Ok(Snapshot::new(
            source.name(),
            inline.mime_type.clone(),
            bytes,
            SnapshotOrigin::Edit(kind),
        ));
    }

    if let Some(reason) = candidate.and_then(|c| c.finish_reason.as_deref()) {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            tracing::warn!(finish_reason = reason, "provider stopped generation on policy");
            return Err(TransformError::Blocked {
                reason: reason.to_string(),
            });
        }
    }

    let text: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    let explanation = (!text.is_empty()).then(|| text.join(" "));

    tracing::warn!(has_text = explanation.is_some(), "provider returned no image");
    Err(TransformError::EmptyResult { explanation })
}
