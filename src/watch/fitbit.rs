//! Fitbit Web API client: OAuth code exchange plus the three daily endpoints
//! (steps, sleep, resting heart rate) merged into one summary.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::config::Config;
use crate::models::connection::Provider;
use crate::watch::{DailySummary, TokenGrant, WatchError};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StepsResponse {
    #[serde(rename = "activities-steps")]
    activities_steps: Vec<StepsDay>,
}

#[derive(Debug, Deserialize)]
struct StepsDay {
    // Fitbit returns the count as a string.
    value: String,
}

#[derive(Debug, Deserialize)]
struct SleepResponse {
    summary: SleepSummary,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SleepSummary {
    #[serde(default)]
    total_minutes_asleep: f64,
}

#[derive(Debug, Deserialize)]
struct HeartResponse {
    #[serde(rename = "activities-heart")]
    activities_heart: Vec<HeartDay>,
}

#[derive(Debug, Deserialize)]
struct HeartDay {
    #[serde(default)]
    value: HeartValue,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct HeartValue {
    resting_heart_rate: Option<i32>,
}

pub async fn exchange_code(
    client: &reqwest::Client,
    config: &Config,
    code: &str,
) -> Result<TokenGrant, WatchError> {
    let redirect_uri = format!("{}/dashboard", config.frontend_url);
    let params = [
        ("grant_type", "authorization_code"),
        ("client_id", config.fitbit_client_id.as_str()),
        ("code", code),
        ("redirect_uri", redirect_uri.as_str()),
    ];

    let response = client
        .post("https://api.fitbit.com/oauth2/token")
        .basic_auth(&config.fitbit_client_id, Some(&config.fitbit_client_secret))
        .form(&params)
        .send()
        .await
        .map_err(|source| WatchError::Http {
            provider: Provider::Fitbit,
            source,
        })?;

    if !response.status().is_success() {
        return Err(WatchError::Status {
            provider: Provider::Fitbit,
            status: response.status().as_u16(),
        });
    }

    let token: TokenResponse = response.json().await.map_err(|source| WatchError::Http {
        provider: Provider::Fitbit,
        source,
    })?;

    Ok(TokenGrant {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_in: token.expires_in,
    })
}

pub async fn daily_summary(
    client: &reqwest::Client,
    access_token: &str,
    date: NaiveDate,
) -> Result<DailySummary, WatchError> {
    let date_str = date.format("%Y-%m-%d").to_string();

    let steps: StepsResponse = get_json(
        client,
        access_token,
        &format!("https://api.fitbit.com/1/user/-/activities/steps/date/{date_str}/1d.json"),
    )
    .await?;

    let sleep: SleepResponse = get_json(
        client,
        access_token,
        &format!("https://api.fitbit.com/1.2/user/-/sleep/date/{date_str}.json"),
    )
    .await?;

    let heart: HeartResponse = get_json(
        client,
        access_token,
        &format!("https://api.fitbit.com/1/user/-/activities/heart/date/{date_str}/1d.json"),
    )
    .await?;

    map_summary(&steps, &sleep, &heart)
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    access_token: &str,
    url: &str,
) -> Result<T, WatchError> {
    let response = client
        .get(url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|source| WatchError::Http {
            provider: Provider::Fitbit,
            source,
        })?;

    if !response.status().is_success() {
        return Err(WatchError::Status {
            provider: Provider::Fitbit,
            status: response.status().as_u16(),
        });
    }

    response.json().await.map_err(|source| WatchError::Http {
        provider: Provider::Fitbit,
        source,
    })
}

fn map_summary(
    steps: &StepsResponse,
    sleep: &SleepResponse,
    heart: &HeartResponse,
) -> Result<DailySummary, WatchError> {
    let steps = match steps.activities_steps.first() {
        Some(day) => day.value.parse::<i32>().map_err(|_| WatchError::Malformed {
            provider: Provider::Fitbit,
            detail: format!("non-numeric step count {:?}", day.value),
        })?,
        None => 0,
    };

    let sleep_hours = sleep.summary.total_minutes_asleep / 60.0;

    let heart_rate = heart
        .activities_heart
        .first()
        .and_then(|day| day.value.resting_heart_rate);

    Ok(DailySummary {
        steps,
        sleep_hours,
        heart_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_a_typical_day() {
        let steps: StepsResponse = serde_json::from_value(json!({
            "activities-steps": [{ "dateTime": "2024-01-01", "value": "8432" }]
        }))
        .unwrap();
        let sleep: SleepResponse = serde_json::from_value(json!({
            "summary": { "totalMinutesAsleep": 420, "totalTimeInBed": 460 }
        }))
        .unwrap();
        let heart: HeartResponse = serde_json::from_value(json!({
            "activities-heart": [{ "value": { "restingHeartRate": 58 } }]
        }))
        .unwrap();

        let summary = map_summary(&steps, &sleep, &heart).unwrap();
        assert_eq!(summary.steps, 8432);
        assert_eq!(summary.sleep_hours, 7.0);
        assert_eq!(summary.heart_rate, Some(58));
    }

    #[test]
    fn missing_data_maps_to_zero_and_none() {
        let steps: StepsResponse =
            serde_json::from_value(json!({ "activities-steps": [] })).unwrap();
        let sleep: SleepResponse = serde_json::from_value(json!({ "summary": {} })).unwrap();
        let heart: HeartResponse = serde_json::from_value(json!({
            "activities-heart": [{ "value": {} }]
        }))
        .unwrap();

        let summary = map_summary(&steps, &sleep, &heart).unwrap();
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.sleep_hours, 0.0);
        assert_eq!(summary.heart_rate, None);
    }

    #[test]
    fn garbage_step_count_is_malformed() {
        let steps: StepsResponse = serde_json::from_value(json!({
            "activities-steps": [{ "value": "lots" }]
        }))
        .unwrap();
        let sleep: SleepResponse = serde_json::from_value(json!({ "summary": {} })).unwrap();
        let heart: HeartResponse =
            serde_json::from_value(json!({ "activities-heart": [] })).unwrap();

        assert!(matches!(
            map_summary(&steps, &sleep, &heart),
            Err(WatchError::Malformed { .. })
        ));
    }
}
