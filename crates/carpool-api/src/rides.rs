use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::info;

use carpool_types::api::{PostRideRequest, SearchRidesQuery, SearchRidesResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::middleware::Identity;
use crate::run_blocking;

/// Combine a date and a time into the ISO-8601 string stored with a ride,
/// e.g. `2024-05-01T09:00:00`. Sub-second precision appears only when set.
pub fn compose_datetime(date: NaiveDate, time: NaiveTime) -> String {
    let datetime = date.and_time(time);
    // chrono carries a leap second as nanosecond >= 1_000_000_000
    if time.nanosecond() % 1_000_000_000 == 0 {
        datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        datetime.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

pub async fn post_ride(
    State(state): State<AppState>,
    Extension(Identity(username)): Extension<Identity>,
    JsonBody(req): JsonBody<PostRideRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let datetime = compose_datetime(req.date, req.time);

    let ride = run_blocking(&state, move |db| {
        db.post_ride(&username, &req.pickup, &req.dropoff, &datetime)
    })
    .await?;

    info!(ride_id = ride.id, username = %ride.username, "Ride posted");
    Ok((StatusCode::CREATED, Json(ride)))
}

/// Every authenticated user can see every ride.
pub async fn search_rides(
    State(state): State<AppState>,
    Extension(_identity): Extension<Identity>,
    Query(query): Query<SearchRidesQuery>,
) -> Result<Json<SearchRidesResponse>, ApiError> {
    let rides = run_blocking(&state, move |db| {
        db.search_rides(&query.pickup, &query.dropoff)
    })
    .await?;

    let message = rides
        .is_empty()
        .then(|| "No matching rides found.".to_string());

    Ok(Json(SearchRidesResponse { rides, message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_have_no_fraction() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(compose_datetime(date, time), "2024-05-01T09:00:00");
    }

    #[test]
    fn fractional_seconds_use_microseconds() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let time = NaiveTime::from_hms_micro_opt(23, 59, 30, 250_000).unwrap();
        assert_eq!(compose_datetime(date, time), "2024-12-31T23:59:30.250000");
    }

    #[test]
    fn leap_second_has_no_fraction() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let time: NaiveTime = "23:59:60".parse().unwrap();
        assert_eq!(compose_datetime(date, time), "2024-05-01T23:59:60");

        let fractional = NaiveTime::from_hms_milli_opt(23, 59, 59, 1_500).unwrap();
        assert_eq!(compose_datetime(date, fractional), "2024-05-01T23:59:60.500000");
    }
}
