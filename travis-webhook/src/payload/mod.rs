//! Decoded webhook notification.
//!
//! [`Payload`] mirrors the JSON the provider posts in the `payload` form
//! field. Every field is optional; absent fields are skipped when the payload
//! is serialized again.
//!
//! The provider schema went through a migration and still carries duplicate
//! fields (`status_message`/`result_message`, `commit_id`/`commit`) as well as
//! the `commiter_*` spelling. Both sides of each pair are kept as sent.
//!
//! # Examples
//!
//! ```
//! use travis_webhook::payload::decode;
//!
//! let json = br#"{"id": 1, "type": "push", "status_message": "Passed"}"#;
//! let payload = decode(Some(&json[..])).unwrap();
//!
//! assert!(payload.is_push());
//! assert!(payload.passed());
//! ```

use std::{io::Read, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WebhookError};

pub mod color;

pub use color::Color;

/// A build notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Build id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Build number, as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Build environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,
    /// Event that triggered the build: `push`, `pull_request`, `cron` or `api`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Build state, e.g. `passed` or `started`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Numeric status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    /// Numeric result code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<i64>,
    /// Human-readable status, e.g. `Passed` or `Still Failing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    /// Legacy duplicate of `status_message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
    /// When the build started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the build finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Build duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    /// Link to the build page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_url: Option<String>,
    /// Provider-internal commit id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<i64>,
    /// Commit SHA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// Base commit SHA of a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_commit: Option<String>,
    /// Head commit SHA of a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_commit: Option<String>,
    /// Branch name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Commit message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Link to the compare view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_url: Option<String>,
    /// Commit time. Provider spelling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commited_at: Option<DateTime<Utc>>,
    /// Commit author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Commit author email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    /// Committer name. Provider spelling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commiter_name: Option<String>,
    /// Committer email. Provider spelling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commiter_email: Option<String>,
    /// Whether the build ran for a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<bool>,
    /// Pull request number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_number: Option<i64>,
    /// Pull request title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_title: Option<String>,
    /// Tag name for tag builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Repository the build belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
}

/// Build environment section of a [`Payload`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Whether the build ran with sudo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sudo: Option<bool>,
    /// Distribution name, e.g. `xenial`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<String>,
    /// Build language, e.g. `rust`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Repository section of a [`Payload`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Repository name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owner login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    /// Repository URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Decodes a payload from a reader without any authenticity check.
///
/// Only use this for sources the caller already trusts; webhooks received
/// over HTTP go through
/// [`WebhookVerifier::authenticate_and_decode`](crate::WebhookVerifier::authenticate_and_decode).
///
/// # Errors
///
/// - [`WebhookError::NilReader`] if `reader` is `None`
/// - [`WebhookError::DecodePayload`] if the stream is not a JSON payload
pub fn decode<R: Read>(reader: Option<R>) -> Result<Payload> {
    let reader = reader.ok_or(WebhookError::NilReader)?;
    serde_json::from_reader(reader).map_err(WebhookError::DecodePayload)
}

impl Payload {
    /// Decodes a payload from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::DecodePayload`] if `json` is not a JSON payload.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(WebhookError::DecodePayload)
    }

    /// Returns `true` if a build has been requested.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.has_message("Pending")
    }

    /// Returns `true` if the build completed successfully.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.has_message("Passed")
    }

    /// Returns `true` if the build completed successfully after a previously
    /// failed build.
    #[must_use]
    pub fn fixed(&self) -> bool {
        self.has_message("Fixed")
    }

    /// Returns `true` if the build completed in failure after a previously
    /// successful build.
    #[must_use]
    pub fn broken(&self) -> bool {
        self.has_message("Broken")
    }

    /// Returns `true` if the build is the first build for a new branch and
    /// has failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.has_message("Failed")
    }

    /// Returns `true` if the build completed in failure after a previously
    /// failed build.
    #[must_use]
    pub fn still_failing(&self) -> bool {
        self.has_message("Still Failing")
    }

    /// Returns `true` if the build was canceled.
    #[must_use]
    pub fn canceled(&self) -> bool {
        self.has_message("Canceled")
    }

    /// Returns `true` if the build has errored.
    #[must_use]
    pub fn errored(&self) -> bool {
        self.has_message("Errored")
    }

    /// Returns `true` if the event was caused by a pull request.
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.event_type.as_deref() == Some("pull_request")
    }

    /// Returns `true` if the event was caused by a push.
    #[must_use]
    pub fn is_push(&self) -> bool {
        self.event_type.as_deref() == Some("push")
    }

    /// Returns `true` if the event was caused by a cron job.
    #[must_use]
    pub fn is_cron(&self) -> bool {
        self.event_type.as_deref() == Some("cron")
    }

    /// Returns `true` if the event was triggered through the API.
    #[must_use]
    pub fn is_api(&self) -> bool {
        self.event_type.as_deref() == Some("api")
    }

    // Either message field may carry the state; comparison is exact.
    fn has_message(&self, message: &str) -> bool {
        self.status_message.as_deref() == Some(message)
            || self.result_message.as_deref() == Some(message)
    }
}

impl FromStr for Payload {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const SAMPLE: &str = r#"{
        "id": 1,
        "number": "1",
        "config": {"language": "rust", "dist": "xenial", "sudo": false, "os": "linux"},
        "type": "push",
        "state": "passed",
        "status": 0,
        "result": 0,
        "status_message": "Passed",
        "result_message": "Passed",
        "started_at": "2018-06-05T19:51:29Z",
        "finished_at": "2018-06-05T19:53:40Z",
        "duration": 131,
        "build_url": "https://travis-ci.org/svenfuchs/minimal/builds/1",
        "commit_id": 1,
        "commit": "62aae5f70ceee39123ef",
        "base_commit": null,
        "head_commit": null,
        "branch": "master",
        "message": "the commit message",
        "compare_url": "https://github.com/svenfuchs/minimal/compare/master...develop",
        "commited_at": "2018-06-05T19:51:00Z",
        "author_name": "Sven Fuchs",
        "author_email": "svenfuchs@artweb-design.de",
        "commiter_name": "Sven Fuchs",
        "commiter_email": "svenfuchs@artweb-design.de",
        "pull_request": false,
        "pull_request_number": null,
        "pull_request_title": null,
        "tag": null,
        "repository": {
            "id": 1,
            "name": "minimal",
            "owner_name": "svenfuchs",
            "url": "http://github.com/svenfuchs/minimal"
        },
        "matrix": []
    }"#;

    const STATE_MESSAGES: [&str; 8] =
        ["Pending", "Passed", "Fixed", "Broken", "Failed", "Still Failing", "Canceled", "Errored"];

    fn states(payload: &Payload) -> [bool; 8] {
        [
            payload.pending(),
            payload.passed(),
            payload.fixed(),
            payload.broken(),
            payload.failed(),
            payload.still_failing(),
            payload.canceled(),
            payload.errored(),
        ]
    }

    fn events(payload: &Payload) -> [bool; 4] {
        [payload.is_pull_request(), payload.is_push(), payload.is_cron(), payload.is_api()]
    }

    #[test]
    fn test_decode_sample() {
        let payload = decode(Some(SAMPLE.as_bytes())).unwrap();

        assert_eq!(payload.id, Some(1));
        assert_eq!(payload.number.as_deref(), Some("1"));
        assert_eq!(payload.duration, Some(131));
        assert_eq!(payload.pull_request, Some(false));
        assert_eq!(payload.pull_request_number, None);
        assert_eq!(payload.commiter_name.as_deref(), Some("Sven Fuchs"));
        assert_eq!(
            payload.started_at.map(|t| t.to_rfc3339()),
            Some("2018-06-05T19:51:29+00:00".to_owned())
        );

        let config = payload.config.as_ref().unwrap();
        assert_eq!(config.language.as_deref(), Some("rust"));
        assert_eq!(config.sudo, Some(false));

        let repository = payload.repository.as_ref().unwrap();
        assert_eq!(repository.owner_name.as_deref(), Some("svenfuchs"));
        assert!(payload.passed());
        assert!(payload.is_push());
    }

    #[test]
    fn test_decode_round_trips_populated_fields() {
        let original: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        let payload = Payload::from_json(SAMPLE).unwrap();
        let encoded = serde_json::to_value(&payload).unwrap();

        let serde_json::Value::Object(encoded) = encoded else {
            panic!("payload must serialize to an object");
        };
        for (key, value) in &encoded {
            if key == "config" {
                // Unknown config keys such as `os` are not modeled.
                assert_eq!(value["language"], original["config"]["language"]);
                assert_eq!(value["dist"], original["config"]["dist"]);
                assert_eq!(value["sudo"], original["config"]["sudo"]);
                continue;
            }
            assert_eq!(value, &original[key], "field {key} changed on round trip");
        }
        for key in ["id", "commit", "repository", "finished_at", "commiter_email"] {
            assert!(encoded.contains_key(key), "field {key} lost on round trip");
        }
        assert!(!encoded.contains_key("base_commit"));
    }

    #[test]
    fn test_decode_nil_reader() {
        let result = decode::<&[u8]>(None);
        assert!(matches!(result, Err(WebhookError::NilReader)));
    }

    #[test]
    fn test_decode_malformed_json() {
        let result = decode(Some(&b"{\"id\": "[..]));
        assert!(matches!(result, Err(WebhookError::DecodePayload(_))));
        assert_eq!(result.unwrap_err().to_string(), "cannot decode payload");
    }

    #[test]
    fn test_decode_empty_object() {
        let payload: Payload = "{}".parse().unwrap();
        assert_eq!(payload, Payload::default());
        assert_eq!(states(&payload), [false; 8]);
        assert_eq!(events(&payload), [false; 4]);
    }

    #[test]
    fn test_passed_only() {
        let payload =
            Payload { status_message: Some("Passed".to_owned()), ..Payload::default() };
        assert_eq!(states(&payload), [false, true, false, false, false, false, false, false]);
    }

    #[test]
    fn test_cron_only() {
        let payload = Payload { event_type: Some("cron".to_owned()), ..Payload::default() };
        assert_eq!(events(&payload), [false, false, true, false]);
    }

    #[test]
    fn test_result_message_alone_matches() {
        let payload =
            Payload { result_message: Some("Still Failing".to_owned()), ..Payload::default() };
        assert!(payload.still_failing());
        assert!(!payload.failed());
    }

    #[test]
    fn test_either_message_field_may_match() {
        let payload = Payload {
            status_message: Some("Fixed".to_owned()),
            result_message: Some("Passed".to_owned()),
            ..Payload::default()
        };
        assert!(payload.fixed());
        assert!(payload.passed());
        assert!(!payload.broken());
    }

    #[test]
    fn test_predicates_are_case_sensitive() {
        let payload = Payload {
            status_message: Some("passed".to_owned()),
            event_type: Some("Push".to_owned()),
            ..Payload::default()
        };
        assert!(!payload.passed());
        assert!(!payload.is_push());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn test_exactly_one_state_predicate(index in 0..STATE_MESSAGES.len()) {
            let payload = Payload {
                status_message: Some(STATE_MESSAGES[index].to_owned()),
                ..Payload::default()
            };
            let states = states(&payload);
            prop_assert!(states[index]);
            prop_assert_eq!(states.iter().filter(|s| **s).count(), 1);
        }

        #[test]
        fn test_decode_never_panics(bytes in any::<Vec<u8>>()) {
            let _ = decode(Some(bytes.as_slice()));
        }

        #[test]
        fn test_unknown_messages_match_nothing(message in "[a-z ]{0,16}") {
            let payload = Payload {
                status_message: Some(message.clone()),
                result_message: Some(message),
                ..Payload::default()
            };
            prop_assert_eq!(states(&payload), [false; 8]);
        }
    }
}
