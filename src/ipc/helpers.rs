use chrono::NaiveDate;
use serde_json::json;

use crate::ipc::error::err;

/// Handler-local failure carried up to the response envelope.
#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr::new("bad_params", message)
    }

    pub fn db(e: anyhow::Error) -> Self {
        HandlerErr::new("db_update_failed", e.to_string())
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
}

pub fn get_required_i64(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_bool(params: &serde_json::Value, key: &str) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

pub fn get_required_fecha(params: &serde_json::Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    let raw = get_required_str(params, key)?;
    parse_fecha(&raw, key)
}

pub fn parse_fecha(raw: &str, key: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key))
            .with_details(json!({ "value": raw }))
    })
}

/// Invoice month descriptor, `YYYY-MM`.
pub fn parse_mes(raw: &str) -> Result<String, HandlerErr> {
    let t = raw.trim();
    let Some((y, m)) = t.split_once('-') else {
        return Err(HandlerErr::bad_params("mes must be YYYY-MM"));
    };
    if y.len() != 4 || y.parse::<i32>().is_err() {
        return Err(HandlerErr::bad_params("mes year must be numeric"));
    }
    let month = m
        .parse::<u32>()
        .map_err(|_| HandlerErr::bad_params("mes must be YYYY-MM"))?;
    if !(1..=12).contains(&month) {
        return Err(HandlerErr::bad_params("mes must be between 01 and 12"));
    }
    Ok(t.to_string())
}

/// Today override for deterministic tests; falls back to the local wall
/// clock.
pub fn hoy_or_today(params: &serde_json::Value) -> Result<NaiveDate, HandlerErr> {
    match params.get("hoy").and_then(|v| v.as_str()) {
        Some(raw) => parse_fecha(raw, "hoy"),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Wall-clock HH:MM used when a status transition defaults the arrival time.
/// Tests pass `ahora` to pin it.
pub fn ahora_or_now(params: &serde_json::Value) -> String {
    match params.get("ahora").and_then(|v| v.as_str()) {
        Some(raw) => raw.trim().to_string(),
        None => chrono::Local::now().format("%H:%M").to_string(),
    }
}
