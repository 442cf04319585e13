/// Primary keys are UUID strings stored as PostgreSQL `TEXT`.
pub type DbId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
