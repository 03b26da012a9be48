/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A persisted entity addressable by its primary key.
pub trait Identifiable {
    fn id(&self) -> DbId;
}
