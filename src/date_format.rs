//! Serialize timestamps as epoch milliseconds on the wire.
use chrono::NaiveDateTime;
use serde::{self, Deserialize, Deserializer, Serializer};

pub fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(date.timestamp_millis())
}

pub fn timestamp_to_date_time(timestamp: i64) -> NaiveDateTime {
    let secs = timestamp / 1000;
    let millis = (timestamp % 1000) as u32;
    let nsecs = millis * 1_000_000;
    NaiveDateTime::from_timestamp(secs, nsecs)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let timestamp = i64::deserialize(deserializer)?;
    Ok(timestamp_to_date_time(timestamp))
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_round_trip() {
        let date = super::timestamp_to_date_time(1_600_000_000_123);
        assert_eq!(date.timestamp_millis(), 1_600_000_000_123);
    }
}
