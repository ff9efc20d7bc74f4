use carpool_types::models::Ride;
use rusqlite::{Connection, ErrorCode, OptionalExtension};

use crate::models::RideRow;
use crate::{Database, Result, StoreError};

impl Database {
    // -- Users --

    /// Insert a user. The password is stored exactly as given.
    pub fn register(&self, username: &str, password: &str) -> Result<()> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password),
            ) {
                Ok(_) => Ok(()),
                Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                    Err(StoreError::DuplicateUsername)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// True iff a user row matches both fields exactly.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM users WHERE username = ?1 AND password = ?2",
                    (username, password),
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    #[cfg(test)]
    pub(crate) fn user_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    // -- Rides --

    /// Append a ride. Nothing is validated: the username need not exist and
    /// `datetime` is stored verbatim.
    pub fn post_ride(
        &self,
        username: &str,
        pickup: &str,
        dropoff: &str,
        datetime: &str,
    ) -> Result<Ride> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rides (username, pickup, dropoff, datetime) VALUES (?1, ?2, ?3, ?4)",
                (username, pickup, dropoff, datetime),
            )?;

            Ok(Ride {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                pickup: pickup.to_string(),
                dropoff: dropoff.to_string(),
                datetime: datetime.to_string(),
            })
        })
    }

    /// Rides whose pickup contains `pickup` and whose dropoff contains
    /// `dropoff`, in insertion order. Matching is case-sensitive and literal.
    pub fn search_rides(&self, pickup: &str, dropoff: &str) -> Result<Vec<Ride>> {
        self.with_conn(|conn| query_rides(conn, pickup, dropoff))
    }
}

fn query_rides(conn: &Connection, pickup: &str, dropoff: &str) -> Result<Vec<Ride>> {
    // instr() instead of LIKE: LIKE folds ASCII case and treats % and _ as wildcards
    let mut stmt = conn.prepare(
        "SELECT id, username, pickup, dropoff, datetime
         FROM rides
         WHERE (?1 = '' OR instr(pickup, ?1) > 0)
           AND (?2 = '' OR instr(dropoff, ?2) > 0)
         ORDER BY id",
    )?;

    let rows = stmt
        .query_map((pickup, dropoff), |row| {
            Ok(RideRow {
                id: row.get(0)?,
                username: row.get(1)?,
                pickup: row.get(2)?,
                dropoff: row.get(3)?,
                datetime: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(Ride::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    fn open() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("carpool.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn duplicate_registration_keeps_one_user() {
        let (_dir, db) = open();

        db.register("alice", "secret").unwrap();
        let second = db.register("alice", "other");

        assert!(matches!(second, Err(StoreError::DuplicateUsername)));
        assert_eq!(db.user_count().unwrap(), 1);
        assert!(db.authenticate("alice", "secret").unwrap());
        assert!(!db.authenticate("alice", "other").unwrap());
    }

    #[test]
    fn concurrent_registrations_have_one_winner() {
        let (_dir, db) = open();
        const THREADS: usize = 16;

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let db = db.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    db.register("same", &format!("pw{i}"))
                })
            })
            .collect();

        let mut ok = 0;
        let mut duplicate = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(()) => ok += 1,
                Err(StoreError::DuplicateUsername) => duplicate += 1,
                Err(e) => panic!("unexpected store error: {e}"),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(duplicate, THREADS - 1);
        assert_eq!(db.user_count().unwrap(), 1);
    }

    #[test]
    fn concurrent_rides_for_unknown_user_all_land() {
        let (_dir, db) = open();
        const THREADS: usize = 8;
        const PER_THREAD: usize = 10;

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let db = db.clone();
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        db.post_ride("nobody", &format!("P{t}-{i}"), "D", "2024-05-01T09:00:00")
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(db.search_rides("", "").unwrap().len(), THREADS * PER_THREAD);
    }

    #[test]
    fn authenticate_requires_exact_match() {
        let (_dir, db) = open();
        db.register("alice", "secret").unwrap();

        assert!(db.authenticate("alice", "secret").unwrap());
        assert!(!db.authenticate("alice", "Secret").unwrap());
        assert!(!db.authenticate("Alice", "secret").unwrap());
        assert!(!db.authenticate("bob", "secret").unwrap());
    }

    #[test]
    fn empty_credentials_are_accepted() {
        let (_dir, db) = open();
        db.register("", "").unwrap();
        assert!(db.authenticate("", "").unwrap());
    }

    #[test]
    fn post_ride_assigns_increasing_ids() {
        let (_dir, db) = open();

        let first = db
            .post_ride("alice", "Downtown", "Airport", "2024-05-01T09:00:00")
            .unwrap();
        let second = db
            .post_ride("alice", "Uptown", "Harbor", "2024-05-02T10:30:00")
            .unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.pickup, "Downtown");
        assert_eq!(first.datetime, "2024-05-01T09:00:00");
    }

    #[test]
    fn post_ride_does_not_require_a_user() {
        let (_dir, db) = open();
        db.post_ride("ghost", "A", "B", "not a date").unwrap();

        let rides = db.search_rides("", "").unwrap();
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].username, "ghost");
        assert_eq!(rides[0].datetime, "not a date");
    }

    #[test]
    fn search_matches_substrings_on_both_fields() {
        let (_dir, db) = open();
        db.post_ride("alice", "Downtown", "Airport", "2024-05-01T09:00:00")
            .unwrap();
        db.post_ride("bob", "Downtown East", "Stadium", "2024-05-01T18:00:00")
            .unwrap();
        db.post_ride("carol", "Suburbs", "Airport Terminal 2", "2024-05-02T07:15:00")
            .unwrap();

        let both: Vec<_> = db
            .search_rides("town", "")
            .unwrap()
            .into_iter()
            .map(|r| r.username)
            .collect();
        assert_eq!(both, vec!["alice", "bob"]);

        let airport: Vec<_> = db
            .search_rides("", "Airport")
            .unwrap()
            .into_iter()
            .map(|r| r.username)
            .collect();
        assert_eq!(airport, vec!["alice", "carol"]);

        let one = db.search_rides("Down", "port").unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].username, "alice");

        assert!(db.search_rides("Nowhere", "").unwrap().is_empty());
    }

    #[test]
    fn empty_queries_return_everything_in_order() {
        let (_dir, db) = open();
        for i in 0..5 {
            db.post_ride("alice", &format!("P{i}"), &format!("D{i}"), "2024-05-01T09:00:00")
                .unwrap();
        }

        let pickups: Vec<_> = db
            .search_rides("", "")
            .unwrap()
            .into_iter()
            .map(|r| r.pickup)
            .collect();
        assert_eq!(pickups, vec!["P0", "P1", "P2", "P3", "P4"]);
    }

    #[test]
    fn search_is_case_sensitive() {
        let (_dir, db) = open();
        db.post_ride("alice", "Downtown", "Airport", "2024-05-01T09:00:00")
            .unwrap();

        assert!(db.search_rides("down", "air").unwrap().is_empty());
        assert_eq!(db.search_rides("Down", "Air").unwrap().len(), 1);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let (_dir, db) = open();
        db.post_ride("alice", "Downtown", "Airport", "2024-05-01T09:00:00")
            .unwrap();
        db.post_ride("bob", "100% Plaza", "Gate_1", "2024-05-01T09:00:00")
            .unwrap();

        let percent = db.search_rides("%", "").unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].username, "bob");

        let underscore = db.search_rides("", "_").unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].dropoff, "Gate_1");
    }
}
