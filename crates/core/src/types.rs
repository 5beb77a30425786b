/// All database primary keys except media records are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Media records use UUID v7 primary keys, generated at creation time.
pub type MediaId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
