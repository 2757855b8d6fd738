//! NOAA CO-OPS tide predictions.

use anyhow::{Context, Result};
use serde::Deserialize;

use shore_types::{TidePrediction, TideReport, TideType};

const APPLICATION_NAME: &str = "beach_cleanup_app";

pub const SAMPLE_DATA_NOTE: &str =
    "Sample data - Configure proper NOAA station lookup for production";

#[derive(Debug, Deserialize)]
struct NoaaResponse {
    predictions: Option<Vec<NoaaPrediction>>,
}

#[derive(Debug, Deserialize)]
struct NoaaPrediction {
    /// "2024-06-01 06:42"
    t: String,
    /// Height in feet, as a string
    v: String,
    #[serde(rename = "type")]
    kind: String,
}

impl From<NoaaPrediction> for TidePrediction {
    fn from(p: NoaaPrediction) -> Self {
        let time = p
            .t
            .split_once(' ')
            .map(|(_, time)| time.to_string())
            .unwrap_or(p.t);
        TidePrediction {
            tide_type: TideType::from_noaa_code(&p.kind),
            time,
            height: format!("{} ft", p.v),
        }
    }
}

/// NOAA wants dates as YYYYMMDD
fn noaa_date(date: &str) -> String {
    date.replace('-', "")
}

/// Query parameters for a single day of high/low predictions
fn query_params(station: &str, date: &str) -> Vec<(&'static str, String)> {
    let day = noaa_date(date);
    vec![
        ("product", "predictions".to_string()),
        ("application", APPLICATION_NAME.to_string()),
        ("begin_date", day.clone()),
        ("end_date", day),
        ("datum", "MLLW".to_string()),
        ("station", station.to_string()),
        ("time_zone", "lst_ldt".to_string()),
        ("units", "english".to_string()),
        ("interval", "hilo".to_string()),
        ("format", "json".to_string()),
    ]
}

/// Fetch high/low predictions for one station and day
pub async fn fetch_predictions(
    client: &reqwest::Client,
    base_url: &str,
    station: &str,
    date: &str,
) -> Result<Vec<TidePrediction>> {
    let response: NoaaResponse = client
        .get(base_url)
        .query(&query_params(station, date))
        .send()
        .await
        .context("NOAA request failed")?
        .error_for_status()
        .context("NOAA returned an error status")?
        .json()
        .await
        .context("Failed to decode NOAA response")?;

    let predictions = response
        .predictions
        .context("No tide data available")?;

    Ok(predictions.into_iter().map(TidePrediction::from).collect())
}

/// Canned predictions used when NOAA is unreachable
pub fn sample_predictions() -> Vec<TidePrediction> {
    [
        (TideType::Low, "6:42 AM", "0.3 ft"),
        (TideType::High, "12:28 PM", "4.2 ft"),
        (TideType::Low, "7:15 PM", "0.5 ft"),
    ]
    .into_iter()
    .map(|(tide_type, time, height)| TidePrediction {
        tide_type,
        time: time.to_string(),
        height: height.to_string(),
    })
    .collect()
}

/// Tide report for a day, falling back to sample data on any upstream failure
pub async fn tide_report(
    client: &reqwest::Client,
    base_url: &str,
    station: &str,
    date: &str,
) -> TideReport {
    match fetch_predictions(client, base_url, station, date).await {
        Ok(predictions) => TideReport {
            date: date.to_string(),
            station: station.to_string(),
            predictions,
            note: None,
        },
        Err(e) => {
            tracing::warn!("NOAA tide lookup failed, serving sample data: {:#}", e);
            TideReport {
                date: date.to_string(),
                station: station.to_string(),
                predictions: sample_predictions(),
                note: Some(SAMPLE_DATA_NOTE.to_string()),
            }
        }
    }
}
