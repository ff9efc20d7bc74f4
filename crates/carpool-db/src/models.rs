//! Database row types. These map directly to SQLite rows and stay distinct
//! from the carpool-types wire models.

use carpool_types::models::Ride;

pub struct RideRow {
    pub id: i64,
    pub username: String,
    pub pickup: String,
    pub dropoff: String,
    pub datetime: String,
}

impl From<RideRow> for Ride {
    fn from(row: RideRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            pickup: row.pickup,
            dropoff: row.dropoff,
            datetime: row.datetime,
        }
    }
}
