/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// User id stamped on audit columns when no acting user can be resolved.
pub const SYSTEM_USER_ID: DbId = 1;
