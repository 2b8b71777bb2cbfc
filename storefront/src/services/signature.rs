// storefront/src/services/signature.rs

//! Stripe-style webhook signatures:
//! `Stripe-Signature: t=<unix seconds>,v1=<hex hmac>[,v1=...]`, where each
//! `v1` is HMAC-SHA256 over `"<t>.<raw body>"` keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

use crate::errors::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
  pub timestamp: i64,
  /// Decoded `v1` signatures. Several are present while secrets rotate.
  pub signatures: Vec<Vec<u8>>,
}

pub fn parse_header(header: &str) -> Result<SignatureHeader> {
  let mut timestamp = None;
  let mut signatures = Vec::new();
  for part in header.split(',') {
    let Some((key, value)) = part.trim().split_once('=') else {
      continue;
    };
    match key {
      "t" => {
        timestamp = Some(
          value
            .parse::<i64>()
            .map_err(|_| AppError::Signature("malformed timestamp".to_string()))?,
        )
      }
      // Undecodable entries are skipped; they can never match.
      "v1" => {
        if let Ok(sig) = hex::decode(value) {
          signatures.push(sig);
        }
      }
      _ => {}
    }
  }
  let timestamp = timestamp.ok_or_else(|| AppError::Signature("no timestamp in signature header".to_string()))?;
  if signatures.is_empty() {
    return Err(AppError::Signature("no v1 signature in header".to_string()));
  }
  Ok(SignatureHeader { timestamp, signatures })
}

fn keyed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256> {
  let mut mac =
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Config(format!("Invalid webhook secret: {}", e)))?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  Ok(mac)
}

/// Authenticates a raw webhook body. Must run before the body is parsed.
///
/// `now` is unix seconds; the header timestamp must lie within `tolerance` of it.
pub fn verify(payload: &[u8], header: Option<&str>, secret: &str, tolerance: Duration, now: i64) -> Result<()> {
  let header = header.ok_or_else(|| AppError::Signature("missing signature header".to_string()))?;
  let parsed = parse_header(header)?;

  if now.abs_diff(parsed.timestamp) > tolerance.as_secs() {
    return Err(AppError::Signature("timestamp outside the tolerance window".to_string()));
  }

  let mac = keyed_mac(secret, parsed.timestamp, payload)?;
  // verify_slice compares in constant time.
  let matched = parsed
    .signatures
    .iter()
    .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
  if matched {
    Ok(())
  } else {
    Err(AppError::Signature("no matching signature".to_string()))
  }
}

/// Builds a header value the way the processor does, for replaying or
/// crafting deliveries against a local server.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> Result<String> {
  let mac = keyed_mac(secret, timestamp, payload)?;
  Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
}
