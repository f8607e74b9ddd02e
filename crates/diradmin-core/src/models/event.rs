use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::FormData;

/// A community event from `/afghan/event/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Raw date string as sent by the backend
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub organizer: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Event {
    /// Event start, accepting RFC 3339, naive datetimes (read as UTC) and
    /// plain dates (midnight UTC).
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        parse_event_date(self.date.as_deref()?)
    }

    fn matches_query(&self, query: &str) -> bool {
        query.is_empty()
            || self.name.to_lowercase().contains(query)
            || self
                .description
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .contains(query)
    }
}

fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Time window for the events list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventWindow {
    #[default]
    All,
    Upcoming,
    Past,
}

impl EventWindow {
    /// Events without a readable date only show under `All`.
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        match self {
            EventWindow::All => true,
            EventWindow::Upcoming => event.starts_at().is_some_and(|t| t >= now),
            EventWindow::Past => event.starts_at().is_some_and(|t| t < now),
        }
    }
}

impl FromStr for EventWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(EventWindow::All),
            "upcoming" => Ok(EventWindow::Upcoming),
            "past" => Ok(EventWindow::Past),
            other => Err(format!("unknown event window: {}", other)),
        }
    }
}

/// Filter by window and search text, ordered by start date ascending.
/// Undated events sort last.
pub fn filter_events<'a>(
    events: &'a [Event],
    query: &str,
    window: EventWindow,
    now: DateTime<Utc>,
) -> Vec<&'a Event> {
    let query = query.trim().to_lowercase();
    let mut hits: Vec<&Event> = events
        .iter()
        .filter(|e| window.matches(e, now))
        .filter(|e| e.matches_query(&query))
        .collect();

    hits.sort_by_key(|e| (e.starts_at().is_none(), e.starts_at()));
    hits
}

/// Create-event form
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub venue: String,
    pub date: String,
    pub website: String,
    pub contact_name: String,
    pub contact_info: String,
    pub image: Option<PathBuf>,
}

impl NewEvent {
    /// Multipart payload. Empty fields are left out.
    pub fn to_form(&self) -> std::io::Result<FormData> {
        let form = FormData::new()
            .text_if_present("name", &self.name)
            .text_if_present("description", &self.description)
            .text_if_present("venue", &self.venue)
            .text_if_present("date", &self.date)
            .text_if_present("website", &self.website)
            .text_if_present("contact_name", &self.contact_name)
            .text_if_present("contact_info", &self.contact_info);

        match self.image {
            Some(ref image) => form.file("image", image),
            None => Ok(form),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: i64, name: &str, date: Option<&str>) -> Event {
        Event {
            id,
            name: name.to_string(),
            date: date.map(str::to_string),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_starts_at_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 7, 4, 18, 30, 0).unwrap();
        assert_eq!(event(1, "a", Some("2025-07-04T18:30:00Z")).starts_at(), Some(expected));
        assert_eq!(event(1, "a", Some("2025-07-04T18:30:00")).starts_at(), Some(expected));
        assert_eq!(event(1, "a", Some("2025-07-04T18:30")).starts_at(), Some(expected));
        assert_eq!(
            event(1, "a", Some("2025-07-04")).starts_at(),
            Some(Utc.with_ymd_and_hms(2025, 7, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(event(1, "a", Some("soon")).starts_at(), None);
        assert_eq!(event(1, "a", None).starts_at(), None);
    }

    #[test]
    fn test_filter_events_windows_and_order() {
        let events = vec![
            event(1, "Eid Bazaar", Some("2025-08-01")),
            event(2, "Winter Gala", Some("2025-01-15")),
            event(3, "Poetry Night", Some("2025-06-10")),
            event(4, "TBD Meetup", None),
        ];

        let all: Vec<i64> = filter_events(&events, "", EventWindow::All, now())
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(all, vec![2, 3, 1, 4]);

        let upcoming: Vec<i64> = filter_events(&events, "", EventWindow::Upcoming, now())
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(upcoming, vec![3, 1]);

        let past: Vec<i64> = filter_events(&events, "", EventWindow::Past, now())
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(past, vec![2]);
    }

    #[test]
    fn test_filter_events_search_name_and_description() {
        let mut gala = event(1, "Winter Gala", Some("2025-01-15"));
        gala.description = Some("Music and POETRY".into());
        let events = vec![gala, event(2, "Poetry Night", Some("2025-06-10")), event(3, "Bazaar", None)];

        let hits: Vec<i64> = filter_events(&events, "  poetry ", EventWindow::All, now())
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn test_window_from_str() {
        assert_eq!("UPCOMING".parse::<EventWindow>(), Ok(EventWindow::Upcoming));
        assert!("later".parse::<EventWindow>().is_err());
    }

    #[test]
    fn test_new_event_form_skips_empty_fields() {
        let ne = NewEvent {
            name: "Poetry Night".into(),
            date: "2025-06-10".into(),
            ..Default::default()
        };
        let form = ne.to_form().unwrap();
        assert_eq!(form.field_names().collect::<Vec<_>>(), vec!["name", "date"]);
    }
}
