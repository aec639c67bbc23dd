use chrono::{DateTime, Duration, Utc};

/// One scheduled event as the commands layer hands it to the adapter.
/// The identity of a persisted event is its anchor message id; this
/// struct only carries the fields that go into the anchor and the
/// host platform's scheduled activity.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub name: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub duration_hours: u32,
    pub location_id: String,
    pub ping_role_id: String,
}

impl EventRecord {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::hours(self.duration_hours as i64)
    }

    /// The anchor message body: timestamp markup the platform renders
    /// in each viewer's own timezone, the duration, and the role ping.
    pub fn schedule_content(&self) -> String {
        format!(
            "{}\nDuration: {} hr(s)\n<@&{}>",
            timestamp_markup(self.start),
            self.duration_hours,
            self.ping_role_id
        )
    }
}

pub fn timestamp_markup(instant: DateTime<Utc>) -> String {
    format!("<t:{}:f>", instant.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> EventRecord {
        EventRecord {
            name: "Raid Night".to_string(),
            description: "Weekly clear".to_string(),
            start: Utc.with_ymd_and_hms(2023, 5, 23, 19, 30, 0).unwrap(),
            duration_hours: 2,
            location_id: "123".to_string(),
            ping_role_id: "456".to_string(),
        }
    }

    #[test]
    fn end_is_start_plus_duration() {
        assert_eq!(
            record().end(),
            Utc.with_ymd_and_hms(2023, 5, 23, 21, 30, 0).unwrap()
        );
    }

    #[test]
    fn schedule_content_carries_timestamp_duration_and_ping() {
        let content = record().schedule_content();
        assert_eq!(content, "<t:1684870200:f>\nDuration: 2 hr(s)\n<@&456>");
    }
}
