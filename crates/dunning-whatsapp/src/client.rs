// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the provider's WhatsApp Messages resource.
//!
//! Provides [`WhatsAppClient`] which handles form encoding, basic
//! authentication, and mapping of provider error bodies to [`DunningError`].

use std::collections::BTreeMap;
use std::time::Duration;

use dunning_core::DunningError;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// API version segment of the Messages resource path.
const API_VERSION: &str = "2010-04-01";

/// Credentials and sender identity for the provider account.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in E.164 form, without the channel prefix.
    pub from_number: String,
}

/// HTTP client for template message submission.
///
/// Makes exactly one request per call; retries are left to the next
/// scheduled run.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    budget_exhausted_codes: Vec<String>,
}

impl WhatsAppClient {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `base_url` - Provider API root (e.g. `https://api.twilio.com`)
    /// * `credentials` - Account identifier, token, and sender number
    /// * `timeout` - Upper bound on each request, connect through body
    /// * `budget_exhausted_codes` - Provider codes meaning the account is out of funds
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
        budget_exhausted_codes: Vec<String>,
    ) -> Result<Self, DunningError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DunningError::Transport {
                code: None,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            budget_exhausted_codes,
        })
    }

    /// Full URL of the Messages resource for this account.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}/Messages.json",
            self.base_url, self.credentials.account_sid
        )
    }

    /// Submits one template message and returns the provider message id.
    pub async fn send_template(
        &self,
        to: &str,
        content_sid: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<String, DunningError> {
        let content_variables = serde_json::to_string(variables).map_err(|e| {
            DunningError::Internal(format!("failed to encode template variables: {e}"))
        })?;
        let request = MessageRequest {
            from: format!("whatsapp:{}", self.credentials.from_number),
            to: format!("whatsapp:{to}"),
            content_sid: content_sid.to_string(),
            content_variables,
        };
        let form = serde_urlencoded::to_string(&request).map_err(|e| {
            DunningError::Internal(format!("failed to encode message form: {e}"))
        })?;

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_request_error)?;
        debug!(status = %status, "message response received");

        if status.is_success() {
            let parsed: MessageResponse =
                serde_json::from_str(&body).map_err(|e| DunningError::Transport {
                    code: None,
                    message: format!("unexpected response body: {e}"),
                })?;
            debug!(
                sid = %parsed.sid,
                provider_status = parsed.status.as_deref().unwrap_or("unknown"),
                "message accepted"
            );
            return Ok(parsed.sid);
        }

        Err(self.classify_error(status, &body))
    }

    /// Maps a non-2xx response to a transport or budget error.
    fn classify_error(&self, status: reqwest::StatusCode, body: &str) -> DunningError {
        let (code, message) = match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(api_err) => (
                api_err.code.map(|c| c.to_string()),
                api_err
                    .message
                    .unwrap_or_else(|| format!("provider returned {status}")),
            ),
            Err(_) => (None, format!("provider returned {status}: {body}")),
        };

        match code {
            Some(code) if self.budget_exhausted_codes.iter().any(|c| c == &code) => {
                DunningError::ProviderCreditsExhausted { code, message }
            }
            Some(code) => DunningError::Transport {
                code: Some(code),
                message,
            },
            None => DunningError::Transport {
                code: Some(status.as_u16().to_string()),
                message,
            },
        }
    }
}

fn map_request_error(e: reqwest::Error) -> DunningError {
    if e.is_timeout() {
        DunningError::Transport {
            code: Some("timeout".into()),
            message: format!("request timed out: {e}"),
        }
    } else {
        DunningError::Transport {
            code: None,
            message: format!("HTTP request failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC123/Messages.json";

    fn test_client(base_url: &str, timeout: Duration) -> WhatsAppClient {
        WhatsAppClient::new(
            base_url,
            Credentials {
                account_sid: "AC123".into(),
                auth_token: "secret".into(),
                from_number: "+14155550100".into(),
            },
            timeout,
            vec!["30044".into()],
        )
        .unwrap()
    }

    fn vars() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("1".to_string(), "Corner Shop".to_string()),
            ("2".to_string(), "S-001".to_string()),
        ])
    }

    #[tokio::test]
    async fn send_template_success_returns_sid() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .and(basic_auth("AC123", "secret"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("To=whatsapp%3A%2B919876543210"))
            .and(body_string_contains("From=whatsapp%3A%2B14155550100"))
            .and(body_string_contains("ContentSid=HX42"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"sid": "SM900", "status": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Duration::from_secs(5));
        let sid = client
            .send_template("+919876543210", "HX42", &vars())
            .await
            .unwrap();
        assert_eq!(sid, "SM900");
    }

    #[tokio::test]
    async fn provider_error_maps_to_transport_with_code() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": 63016,
                "message": "Failed to send freeform message outside the window",
                "status": 400
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Duration::from_secs(5));
        let err = client
            .send_template("+919876543210", "HX42", &vars())
            .await
            .unwrap_err();
        match err {
            DunningError::Transport { code, message } => {
                assert_eq!(code.as_deref(), Some("63016"));
                assert!(message.contains("outside the window"), "got: {message}");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn budget_code_maps_to_provider_exhaustion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "code": 30044,
                "message": "Account balance too low"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Duration::from_secs(5));
        let err = client
            .send_template("+919876543210", "HX42", &vars())
            .await
            .unwrap_err();
        assert!(err.is_credit_exhaustion(), "got: {err:?}");
    }

    #[tokio::test]
    async fn unparseable_error_body_uses_http_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Duration::from_secs(5));
        let err = client
            .send_template("+919876543210", "HX42", &vars())
            .await
            .unwrap_err();
        let (code, message) = err.failure_detail();
        assert_eq!(code, Some("503"));
        assert!(message.contains("upstream down"), "got: {message}");
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"sid": "SM1"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Duration::from_millis(200));
        let err = client
            .send_template("+919876543210", "HX42", &vars())
            .await
            .unwrap_err();
        let (code, _) = err.failure_detail();
        assert_eq!(code, Some("timeout"));
    }

    #[test]
    fn messages_url_trims_trailing_slash() {
        let client = test_client("https://api.example.test/", Duration::from_secs(1));
        assert_eq!(
            client.messages_url(),
            "https://api.example.test/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}
