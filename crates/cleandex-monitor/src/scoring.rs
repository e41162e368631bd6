//! Endpoint and run scoring.
//!
//! An endpoint scores up to 100: availability 40, latency 30, format 30.

use serde_json::Value;

use cleandex_common::reliability::round1;

use crate::models::{EndpointResult, EndpointStatus, MonitorStats};

pub const AVAILABILITY_POINTS: f64 = 40.0;
pub const LATENCY_POINTS: f64 = 30.0;
pub const FORMAT_POINTS: f64 = 30.0;
/// Partial format credit: JSON body but none of the expected keys
pub const JSON_ONLY_POINTS: f64 = 10.0;

pub fn availability_points(status: EndpointStatus) -> f64 {
    match status {
        EndpointStatus::Success => AVAILABILITY_POINTS,
        EndpointStatus::Redirect => AVAILABILITY_POINTS / 2.0,
        _ => 0.0,
    }
}

/// Full marks up to `fast`, linear decay to zero at `timeout`.
pub fn latency_points(elapsed: f64, fast: f64, timeout: f64) -> f64 {
    if elapsed <= fast {
        return LATENCY_POINTS;
    }
    if elapsed >= timeout || timeout <= fast {
        return 0.0;
    }
    LATENCY_POINTS * (timeout - elapsed) / (timeout - fast)
}

/// Result of checking a body against the expected keys.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatCheck {
    pub is_json: bool,
    pub valid: bool,
    pub missing_keys: Vec<String>,
    pub points: f64,
}

/// Checks the top-level keys of a JSON object, or of the first element of an array.
pub fn check_format(body: &[u8], expected: &[String]) -> FormatCheck {
    let Ok(json) = serde_json::from_slice::<Value>(body) else {
        return FormatCheck { is_json: false, valid: false, missing_keys: expected.to_vec(), points: 0.0 };
    };

    let object = match &json {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    };

    let missing_keys: Vec<String> = expected
        .iter()
        .filter(|k| !object.map(|o| o.contains_key(k.as_str())).unwrap_or(false))
        .cloned()
        .collect();

    let valid = expected.is_empty() || missing_keys.len() < expected.len();
    let points = if valid { FORMAT_POINTS } else { JSON_ONLY_POINTS };
    FormatCheck { is_json: true, valid, missing_keys, points }
}

/// Sum of the parts, rounded and clamped to 0-100.
pub fn endpoint_score(availability: f64, latency: f64, format: f64) -> u32 {
    (availability + latency + format).round().clamp(0.0, 100.0) as u32
}

/// Mean endpoint score, one decimal.
pub fn overall_score(results: &[EndpointResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    round1(results.iter().map(|r| r.score as f64).sum::<f64>() / results.len() as f64)
}

pub fn stats(results: &[EndpointResult]) -> MonitorStats {
    let successful = results.iter().filter(|r| r.status == EndpointStatus::Success).count();
    let answered: Vec<f64> = results
        .iter()
        .filter(|r| r.http_status.is_some())
        .map(|r| r.response_time)
        .collect();
    let avg_response_time = if answered.is_empty() {
        None
    } else {
        Some((answered.iter().sum::<f64>() / answered.len() as f64 * 1000.0).round() / 1000.0)
    };
    MonitorStats {
        total_endpoints: results.len(),
        successful,
        failed: results.len() - successful,
        avg_response_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(k: &[&str]) -> Vec<String> {
        k.iter().map(|s| s.to_string()).collect()
    }

    fn result(status: EndpointStatus, score: u32, http: Option<u16>, t: f64) -> EndpointResult {
        EndpointResult {
            endpoint: "https://a.io".into(),
            status,
            http_status: http,
            response_time: t,
            score,
            valid_format: true,
            missing_keys: vec![],
            error: None,
            warnings: vec![],
        }
    }

    #[test]
    fn test_latency_decay() {
        assert_eq!(latency_points(0.2, 0.5, 10.0), 30.0);
        assert_eq!(latency_points(10.0, 0.5, 10.0), 0.0);
        let mid = latency_points(5.25, 0.5, 10.0);
        assert!((mid - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_any_expected_key_is_enough() {
        let f = check_format(br#"{"id": 1, "userId": 2}"#, &keys(&["value", "id", "userId"]));
        assert!(f.valid);
        assert_eq!(f.missing_keys, vec!["value"]);
        assert_eq!(f.points, FORMAT_POINTS);
    }

    #[test]
    fn test_format_json_without_keys() {
        let f = check_format(br#"{"other": 1}"#, &keys(&["id"]));
        assert!(f.is_json);
        assert!(!f.valid);
        assert_eq!(f.points, JSON_ONLY_POINTS);
    }

    #[test]
    fn test_format_array_checks_first_element() {
        let f = check_format(br#"[{"id": 1}, {"x": 2}]"#, &keys(&["id"]));
        assert!(f.valid);
    }

    #[test]
    fn test_format_not_json() {
        let f = check_format(b"<html>", &[]);
        assert!(!f.is_json);
        assert!(!f.valid);
        assert_eq!(f.points, 0.0);
    }

    #[test]
    fn test_no_expected_keys_accepts_any_json() {
        assert!(check_format(b"42", &[]).valid);
    }

    #[test]
    fn test_scores_and_stats() {
        assert_eq!(endpoint_score(40.0, 30.0, 30.0), 100);
        assert_eq!(endpoint_score(20.0, 12.4, 10.0), 42);

        let results = vec![
            result(EndpointStatus::Success, 100, Some(200), 0.2),
            result(EndpointStatus::ServerError, 33, Some(500), 0.4),
            result(EndpointStatus::Timeout, 0, None, 10.0),
        ];
        assert_eq!(overall_score(&results), 44.3);
        let s = stats(&results);
        assert_eq!(s.total_endpoints, 3);
        assert_eq!(s.successful, 1);
        assert_eq!(s.failed, 2);
        assert_eq!(s.avg_response_time, Some(0.3));
        assert_eq!(overall_score(&[]), 0.0);
    }
}
