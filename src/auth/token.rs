//! Opaque view tokens.
//!
//! Current format: base64url (no padding) of
//! `"{registration_number}-{unix_millis}-{hex nonce}"`.
//! Legacy format: base64url of `{"regNum": "...", "timestamp": unix_millis}`.
//!
//! Tokens are not signed. Whether a token grants access is decided by the
//! ledger; decoding only recovers the registration number.

use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::constants::{LEGACY_TOKEN_MAX_AGE_DAYS, TOKEN_NONCE_BYTES};

/// base64url decoder that takes tokens with or without trailing `=`.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Serialize, Deserialize)]
struct LegacyPayload {
    #[serde(rename = "regNum")]
    reg_num: String,
    timestamp: i64,
}

/// Build a fresh token for `registration_number`.
pub fn encode(registration_number: &str) -> String {
    encode_at(registration_number, Utc::now())
}

pub fn encode_at(registration_number: &str, now: DateTime<Utc>) -> String {
    let mut nonce = [0u8; TOKEN_NONCE_BYTES];
    OsRng.fill_bytes(&mut nonce);

    let raw = format!(
        "{}-{}-{}",
        registration_number,
        now.timestamp_millis(),
        hex::encode(nonce)
    );
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Build a token in the pre-ledger JSON format.
pub fn encode_legacy(registration_number: &str, issued_at: DateTime<Utc>) -> String {
    let payload = LegacyPayload {
        reg_num: registration_number.to_string(),
        timestamp: issued_at.timestamp_millis(),
    };
    // Serializing a struct of a String and an i64 cannot fail.
    let json = serde_json::to_vec(&payload).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Recover the registration number from a token of either format.
///
/// Returns `None` for anything that does not parse.
pub fn decode(token: &str) -> Option<String> {
    decode_at(token, Utc::now())
}

pub fn decode_at(token: &str, now: DateTime<Utc>) -> Option<String> {
    let text = decode_text(token)?;
    if text.contains('-') {
        parse_delimited(&text)
    } else {
        parse_legacy(&text, now)
    }
}

/// Decode only the legacy JSON format, applying the staleness cutoff.
pub fn decode_legacy(token: &str) -> Option<String> {
    decode_legacy_at(token, Utc::now())
}

pub fn decode_legacy_at(token: &str, now: DateTime<Utc>) -> Option<String> {
    let text = decode_text(token)?;
    if text.contains('-') {
        return None;
    }
    parse_legacy(&text, now)
}

fn decode_text(token: &str) -> Option<String> {
    let bytes = match URL_SAFE_LENIENT.decode(token.trim().as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("token is not base64url: {}", e);
            return None;
        }
    };
    String::from_utf8(bytes).ok()
}

fn parse_delimited(text: &str) -> Option<String> {
    let mut parts = text.split('-');
    let registration_number = parts.next()?;
    let timestamp = parts.next()?;

    if !is_registration_number(registration_number) || timestamp.parse::<i64>().is_err() {
        return None;
    }
    Some(registration_number.to_string())
}

fn parse_legacy(text: &str, now: DateTime<Utc>) -> Option<String> {
    let payload: LegacyPayload = serde_json::from_str(text).ok()?;

    let cutoff = now - Duration::days(LEGACY_TOKEN_MAX_AGE_DAYS);
    if payload.timestamp < cutoff.timestamp_millis() {
        debug!("legacy token older than {} days", LEGACY_TOKEN_MAX_AGE_DAYS);
        return None;
    }
    if !is_registration_number(&payload.reg_num) {
        return None;
    }
    Some(payload.reg_num)
}

fn is_registration_number(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_alphanumeric())
}

/// First characters of a token, for log lines.
pub fn log_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}
