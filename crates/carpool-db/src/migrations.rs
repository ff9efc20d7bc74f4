use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Create the `users` and `rides` tables if they are missing.
///
/// Safe to call on every start: existing tables and rows are left alone.
/// Foreign keys are declared but not switched on, so a ride can name a
/// username that has no row in `users`.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            username    TEXT PRIMARY KEY,
            password    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rides (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL,
            pickup      TEXT NOT NULL,
            dropoff     TEXT NOT NULL,
            datetime    TEXT NOT NULL,
            FOREIGN KEY (username) REFERENCES users(username)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
