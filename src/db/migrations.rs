use crate::db::Database;
use crate::error::Result;

const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS predictions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        crop_type TEXT NOT NULL,
        crop_days INTEGER NOT NULL,
        soil_moisture REAL NOT NULL,
        temperature_c REAL NOT NULL,
        humidity_percent REAL NOT NULL,
        irrigation_needed INTEGER NOT NULL,
        confidence REAL NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS schedules (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        prediction_id INTEGER REFERENCES predictions(id),
        status TEXT NOT NULL DEFAULT 'pending',
        scheduled_time TEXT NOT NULL,
        executed_at TEXT,
        water_amount_mm REAL,
        duration_minutes INTEGER,
        cancellation_reason TEXT,
        notification_sent INTEGER NOT NULL DEFAULT 0,
        location TEXT,
        recipient TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    // Migration 2: Add indexes for the dispatcher's due query
    r#"
    CREATE INDEX IF NOT EXISTS idx_schedules_status_time
        ON schedules(status, scheduled_time);
    CREATE INDEX IF NOT EXISTS idx_schedules_prediction_id
        ON schedules(prediction_id);
    "#,
];

pub fn run(db: &Database) -> Result<()> {
    db.with_conn_mut(|conn| {
        // Ensure schema_migrations table exists
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        // Get current version
        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        // Apply pending migrations
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                tracing::info!("Applying migration {}", version);
                conn.execute_batch(migration)?;
                conn.execute(
                    "INSERT INTO schema_migrations (version) VALUES (?1)",
                    [version],
                )?;
            }
        }

        Ok(())
    })
}
