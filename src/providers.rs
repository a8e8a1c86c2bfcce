use time::OffsetDateTime;
use uuid::Uuid;

/// Source of the current time, in epoch milliseconds.
pub trait ClockHolder: Send + Sync {
    fn millis(&self) -> i64;
}

/// Source of fresh opaque tokens.
pub trait UuidHolder: Send + Sync {
    fn random(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClockHolder;

impl ClockHolder for SystemClockHolder {
    fn millis(&self) -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUuidHolder;

impl UuidHolder for SystemUuidHolder {
    fn random(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClockHolder(pub i64);

impl ClockHolder for FixedClockHolder {
    fn millis(&self) -> i64 {
        self.0
    }
}

/// Always hands out the same token.
#[derive(Debug, Clone)]
pub struct FixedUuidHolder(pub String);

impl UuidHolder for FixedUuidHolder {
    fn random(&self) -> String {
        self.0.clone()
    }
}
