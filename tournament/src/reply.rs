//! Oracle reply extraction and validation.
//!
//! Models wrap JSON in markdown fences or surround it with prose often
//! enough that going straight to `serde_json` loses usable replies, so the
//! object is extracted first and then validated against a schema.

use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::{Draft, Validator};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

const REPLY_SCHEMA: &str = include_str!("../schemas/oracle_reply.schema.json");

static REPLY_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    let schema: Value =
        serde_json::from_str(REPLY_SCHEMA).expect("reply schema should be valid JSON");
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .expect("reply schema should compile")
});

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence regex should be valid")
});

/// Structured reply the oracle must produce.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OracleReply {
    pub analysis: String,
    #[serde(rename = "move")]
    pub proposed_move: String,
}

/// Extract and validate the JSON reply from raw oracle output.
///
/// Any failure here means the reply is malformed; the caller degrades to
/// its fallback move. The move letter itself is validated by the caller
/// (`Action::parse`), not by the schema.
pub fn parse_reply(raw: &str) -> Result<OracleReply> {
    let json_text =
        extract_json_object(raw).ok_or_else(|| anyhow!("no JSON object in oracle reply"))?;
    let value: Value = serde_json::from_str(json_text).context("parse oracle reply JSON")?;
    validate_schema(&value)?;
    let reply: OracleReply =
        serde_json::from_value(value).context("deserialize oracle reply")?;
    Ok(reply)
}

/// Find the reply object: a fenced block wins, otherwise the outermost
/// brace span.
fn extract_json_object(raw: &str) -> Option<&str> {
    if let Some(caps) = FENCE_RE.captures(raw) {
        return Some(caps.get(1).expect("fence capture group").as_str());
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn validate_schema(value: &Value) -> Result<()> {
    let messages: Vec<String> = REPLY_VALIDATOR
        .iter_errors(value)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("reply schema validation failed: {}", messages.join("; "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let reply = parse_reply(r#"{"analysis": "opening with trust", "move": "C"}"#)
            .expect("parse");
        assert_eq!(reply.proposed_move, "C");
        assert_eq!(reply.analysis, "opening with trust");
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "Here is my decision:\n```json\n{\"analysis\": \"tit for tat\", \"move\": \"D\"}\n```\nGood luck!";
        let reply = parse_reply(raw).expect("parse");
        assert_eq!(reply.proposed_move, "D");
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let raw = "Sure! {\"analysis\": \"mirroring\", \"move\": \"d\"} Hope that helps.";
        let reply = parse_reply(raw).expect("parse");
        assert_eq!(reply.proposed_move, "d");
    }

    #[test]
    fn rejects_missing_move_field() {
        let err = parse_reply(r#"{"analysis": "no move here"}"#).expect_err("invalid");
        assert!(err.to_string().contains("schema validation"));
    }

    #[test]
    fn rejects_non_string_move() {
        let err = parse_reply(r#"{"analysis": "x", "move": 1}"#).expect_err("invalid");
        assert!(err.to_string().contains("schema validation"));
    }

    #[test]
    fn rejects_plain_text() {
        let err = parse_reply("I cooperate!").expect_err("invalid");
        assert!(err.to_string().contains("no JSON object"));
    }

    #[test]
    fn rejects_truncated_json() {
        let err = parse_reply(r#"{"analysis": "cut off"#).expect_err("invalid");
        assert!(err.to_string().contains("no JSON object"));
    }
}
