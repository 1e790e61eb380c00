use rocket::serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::{average_completion_time, average_rating, count_responses};
use crate::error::AppError;

/// The host application does not expose roster sizes, so the response rate
/// is computed against a fixed assumed squad size.
pub const ASSUMED_ROSTER_SIZE: i64 = 20;

#[derive(Serialize, Deserialize)]
pub struct FormAnalytics {
    pub total_responses: i64,
    pub response_rate: f64,
    pub average_completion_time_seconds: Option<f64>,
    pub average_rating: Option<f64>,
    pub insights: Vec<String>,
}

/// Simple counts and averages over a form's responses, plus the
/// template-sentence insights shown on the coach dashboard. Safe on a form
/// with zero responses.
#[instrument]
pub async fn compute_analytics(
    pool: &Pool<Sqlite>,
    form_id: i64,
) -> Result<FormAnalytics, AppError> {
    info!("Computing form analytics");

    let total_responses = count_responses(pool, form_id).await?;
    let average_completion = average_completion_time(pool, form_id).await?;
    let average_rating = average_rating(pool, form_id).await?;

    let response_rate = total_responses as f64 / ASSUMED_ROSTER_SIZE as f64;

    let mut insights = Vec::new();
    if total_responses > 0 {
        insights.push(format!(
            "{} players have submitted responses",
            total_responses
        ));
        if let Some(rating) = average_rating {
            insights.push(format!("Average rating across the team is {:.1}", rating));
        }
        if let Some(seconds) = average_completion {
            insights.push(format!(
                "Players take about {:.0} seconds to complete this form",
                seconds
            ));
        }
    }

    Ok(FormAnalytics {
        total_responses,
        response_rate,
        average_completion_time_seconds: average_completion,
        average_rating,
        insights,
    })
}
