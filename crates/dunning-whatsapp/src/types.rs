// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the provider's Messages resource.

use serde::{Deserialize, Serialize};

/// Form body of a template message request.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "ContentSid")]
    pub content_sid: String,
    /// JSON object of numbered template variables, e.g. `{"1":"Acme"}`.
    #[serde(rename = "ContentVariables")]
    pub content_variables: String,
}

/// Successful response from the Messages resource.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    /// Provider message identifier.
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: Option<ErrorCode>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub more_info: Option<String>,
}

/// Provider error codes arrive as numbers but are compared as strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
