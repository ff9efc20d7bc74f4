use serde::{Deserialize, Serialize};

/// A posted ride offer.
///
/// `datetime` is kept as the string it was stored with; nothing downstream
/// parses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ride {
    pub id: i64,
    pub username: String,
    pub pickup: String,
    pub dropoff: String,
    pub datetime: String,
}

/// Actions the presentation layer can offer for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Login,
    Register,
    PostRide,
    SearchRides,
    Logout,
}
