//! Google Fit aggregate API client. Steps come from `step_count.delta`,
//! sleep from summing `sleep.segment` point durations.

use chrono::{NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::models::connection::Provider;
use crate::watch::{DailySummary, WatchError};

const AGGREGATE_URL: &str = "https://www.googleapis.com/fitness/v1/users/me/dataset:aggregate";

#[derive(Debug, Deserialize, Default)]
struct AggregateResponse {
    #[serde(default)]
    bucket: Vec<Bucket>,
}

#[derive(Debug, Deserialize, Default)]
struct Bucket {
    #[serde(default)]
    dataset: Vec<Dataset>,
}

#[derive(Debug, Deserialize, Default)]
struct Dataset {
    #[serde(default)]
    point: Vec<Point>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Point {
    #[serde(default)]
    value: Vec<PointValue>,
    // int64 fields arrive as strings in the JSON API.
    start_time_nanos: Option<serde_json::Value>,
    end_time_nanos: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PointValue {
    int_val: Option<i64>,
}

pub async fn daily_summary(
    client: &reqwest::Client,
    access_token: &str,
    date: NaiveDate,
) -> Result<DailySummary, WatchError> {
    let start = Utc
        .from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
        .timestamp_millis();
    let end = start + 86_400_000;

    let steps = aggregate(client, access_token, "com.google.step_count.delta", start, end).await?;
    let sleep = aggregate(client, access_token, "com.google.sleep.segment", start, end).await?;

    Ok(DailySummary {
        steps: extract_steps(&steps),
        sleep_hours: extract_sleep_hours(&sleep),
        heart_rate: None,
    })
}

async fn aggregate(
    client: &reqwest::Client,
    access_token: &str,
    data_type: &str,
    start_millis: i64,
    end_millis: i64,
) -> Result<AggregateResponse, WatchError> {
    let response = client
        .post(AGGREGATE_URL)
        .bearer_auth(access_token)
        .json(&json!({
            "aggregateBy": [{ "dataTypeName": data_type }],
            "bucketByTime": { "durationMillis": 86_400_000i64 },
            "startTimeMillis": start_millis,
            "endTimeMillis": end_millis,
        }))
        .send()
        .await
        .map_err(|source| WatchError::Http {
            provider: Provider::GoogleFit,
            source,
        })?;

    if !response.status().is_success() {
        return Err(WatchError::Status {
            provider: Provider::GoogleFit,
            status: response.status().as_u16(),
        });
    }

    response.json().await.map_err(|source| WatchError::Http {
        provider: Provider::GoogleFit,
        source,
    })
}

fn extract_steps(response: &AggregateResponse) -> i32 {
    response
        .bucket
        .first()
        .and_then(|b| b.dataset.first())
        .and_then(|d| d.point.first())
        .and_then(|p| p.value.first())
        .and_then(|v| v.int_val)
        .unwrap_or(0) as i32
}

fn extract_sleep_hours(response: &AggregateResponse) -> f64 {
    let points = response
        .bucket
        .first()
        .and_then(|b| b.dataset.first())
        .map(|d| d.point.as_slice())
        .unwrap_or(&[]);

    points
        .iter()
        .filter_map(|p| {
            let start = nanos(p.start_time_nanos.as_ref())?;
            let end = nanos(p.end_time_nanos.as_ref())?;
            Some((end - start) as f64 / (1_000_000_000.0 * 3600.0))
        })
        .sum()
}

fn nanos(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_i64(),
        _ => None,
    }
}
