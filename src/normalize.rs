//! Mapping raw event documents to sorted output rows.
//!
//! Each field is derived independently. A malformed field becomes empty in
//! its own cell and never affects the rest of the record or other records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::event::RawEvent;
use crate::row::{CivilTimestamp, OutputRow};

/// Site origin prefixed to path-absolute event URLs.
pub const DEFAULT_ORIGIN: &str = "https://www.visitsaltlake.com";

/// Local timezone of the listed events.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Denver;

/// Offset-less formats, read as UTC.
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Turns [`RawEvent`]s into [`OutputRow`]s for one site and timezone.
#[derive(Debug, Clone)]
pub struct Normalizer {
    origin: String,
    timezone: Tz,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN, DEFAULT_TIMEZONE)
    }
}

impl Normalizer {
    pub fn new(origin: impl Into<String>, timezone: Tz) -> Self {
        let mut origin = origin.into();
        while origin.ends_with('/') {
            origin.pop();
        }
        Self { origin, timezone }
    }

    /// Normalize every event and sort by local start time.
    ///
    /// The sort is stable: events with equal starts keep their fetch order,
    /// and events without a usable start go last.
    pub fn normalize(&self, events: Vec<RawEvent>) -> Vec<OutputRow> {
        let mut rows: Vec<OutputRow> = events
            .into_iter()
            .map(|event| self.normalize_event(event))
            .collect();
        rows.sort_by(OutputRow::cmp_by_start);
        rows
    }

    pub fn normalize_event(&self, event: RawEvent) -> OutputRow {
        let start_local = self.local_time(event.start_date.as_ref(), "startDate", &event);
        let end_local = self.local_time(event.end_date.as_ref(), "endDate", &event);

        OutputRow {
            title: event.title.as_ref().and_then(scalar_text),
            start_local,
            end_local,
            categories: join_categories(event.categories.as_deref().unwrap_or_default()),
            host_company: event.host_company().and_then(scalar_text),
            primary_venue: primary_venue(event.facilities.as_deref().unwrap_or_default()),
            event_url: self.absolute_url(event.url.as_deref()),
        }
    }

    /// Prefix path-absolute URLs with the site origin; pass anything else
    /// through.
    pub fn absolute_url(&self, url: Option<&str>) -> String {
        match url {
            Some(path) if path.starts_with('/') => format!("{}{}", self.origin, path),
            Some(url) => url.to_owned(),
            None => String::new(),
        }
    }

    fn local_time(
        &self,
        raw: Option<&Value>,
        field: &str,
        event: &RawEvent,
    ) -> Option<CivilTimestamp> {
        let raw = raw.filter(|value| !value.is_null())?;
        match parse_instant(raw) {
            Some(instant) => Some(CivilTimestamp::from_utc(instant, self.timezone)),
            None => {
                tracing::debug!(
                    field,
                    title = event.title.as_ref().and_then(serde_json::Value::as_str).unwrap_or_default(),
                    value = %raw,
                    "Unparseable timestamp, leaving empty"
                );
                None
            }
        }
    }
}

/// Normalize with the default site origin and timezone.
pub fn normalize(events: Vec<RawEvent>) -> Vec<OutputRow> {
    Normalizer::default().normalize(events)
}

/// Parse an absolute instant from the forms the service emits.
///
/// Accepts RFC 3339 strings, ISO date-times with a `+HHMM` offset, offset-less date-times and dates (as UTC),
/// epoch milliseconds, and `{"$date": ...}` wrappers around any of these.
pub fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_instant_str(text.trim()),
        Value::Number(millis) => DateTime::from_timestamp_millis(millis.as_i64()?),
        Value::Object(map) => parse_instant(map.get("$date")?),
        _ => None,
    }
}

fn parse_instant_str(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(text, format) {
            return Some(instant.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

/// Text of a pass-through field: strings as-is, any other value as its JSON
/// text, `null` as missing.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Join the `catName` of every object entry with `", "`. Non-object entries
/// are skipped; objects without a string `catName` contribute an empty name.
pub fn join_categories(categories: &[Value]) -> String {
    categories
        .iter()
        .filter_map(Value::as_object)
        .map(|category| {
            category
                .get("catName")
                .and_then(Value::as_str)
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Title of the first facility. Further facilities are ignored.
pub fn primary_venue(facilities: &[Value]) -> String {
    facilities
        .first()
        .and_then(|facility| facility.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> RawEvent {
        RawEvent::from_value(value)
    }

    // ========== parse_instant Tests ==========

    #[test]
    fn test_parse_instant_rfc3339_millis() {
        let instant = parse_instant(&json!("2026-03-01T20:00:00.000Z")).unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-03-01T20:00:00+00:00");
    }

    #[test]
    fn test_parse_instant_with_offset() {
        let instant = parse_instant(&json!("2026-03-01T13:00:00-07:00")).unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-03-01T20:00:00+00:00");
    }

    #[test]
    fn test_parse_instant_offset_without_colon() {
        let instant = parse_instant(&json!("2026-03-01T20:00:00.000+0000")).unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-03-01T20:00:00+00:00");

        let instant = parse_instant(&json!("2026-03-01T13:00:00-0700")).unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-03-01T20:00:00+00:00");

        let instant = parse_instant(&json!("2026-03-01 13:00:00-0700")).unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-03-01T20:00:00+00:00");
    }

    #[test]
    fn test_parse_instant_naive_is_utc() {
        let instant = parse_instant(&json!("2026-03-01T20:00:00")).unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-03-01T20:00:00+00:00");

        let instant = parse_instant(&json!("2026-03-01 20:00:00")).unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-03-01T20:00:00+00:00");
    }

    #[test]
    fn test_parse_instant_bare_date() {
        let instant = parse_instant(&json!("2026-03-01")).unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_instant_extended_json_and_millis() {
        let expected = "2026-03-01T20:00:00+00:00";
        let wrapped = parse_instant(&json!({"$date": "2026-03-01T20:00:00.000Z"})).unwrap();
        assert_eq!(wrapped.to_rfc3339(), expected);

        let millis = parse_instant(&json!(1_772_395_200_000_i64)).unwrap();
        assert_eq!(millis.to_rfc3339(), expected);
    }

    #[test]
    fn test_parse_instant_rejects_garbage() {
        assert_eq!(parse_instant(&json!("next tuesday")), None);
        assert_eq!(parse_instant(&json!("2026-13-45T00:00:00Z")), None);
        assert_eq!(parse_instant(&json!(true)), None);
        assert_eq!(parse_instant(&json!({"date": "2026-03-01"})), None);
    }

    // ========== field rule Tests ==========

    #[test]
    fn test_join_categories_skips_non_objects() {
        let categories = [json!({"catName": "Expo"}), json!({"catName": "Trade Show"}), json!("garbage")];
        assert_eq!(join_categories(&categories), "Expo, Trade Show");
    }

    #[test]
    fn test_join_categories_empty() {
        assert_eq!(join_categories(&[]), "");
    }

    #[test]
    fn test_join_categories_object_without_name() {
        let categories = [json!({"catName": "Expo"}), json!({"catId": "conventions_2"})];
        assert_eq!(join_categories(&categories), "Expo, ");
    }

    #[test]
    fn test_primary_venue_takes_first() {
        let facilities = [json!({"title": "Salt Palace"}), json!({"title": "Grand America"})];
        assert_eq!(primary_venue(&facilities), "Salt Palace");
    }

    #[test]
    fn test_primary_venue_missing() {
        assert_eq!(primary_venue(&[]), "");
        assert_eq!(primary_venue(&[json!({"recid": 7})]), "");
        assert_eq!(primary_venue(&[json!("Salt Palace")]), "");
    }

    #[test]
    fn test_absolute_url() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.absolute_url(Some("/events/foo")),
            "https://www.visitsaltlake.com/events/foo"
        );
        assert_eq!(
            normalizer.absolute_url(Some("https://example.org/show")),
            "https://example.org/show"
        );
        assert_eq!(normalizer.absolute_url(None), "");
    }

    #[test]
    fn test_origin_trailing_slash_trimmed() {
        let normalizer = Normalizer::new("https://example.org/", DEFAULT_TIMEZONE);
        assert_eq!(normalizer.absolute_url(Some("/a")), "https://example.org/a");
    }

    // ========== normalize Tests ==========

    #[test]
    fn test_normalize_event_maps_all_fields() {
        let row = Normalizer::default().normalize_event(event(json!({
            "title": "Outdoor Retailer",
            "startDate": "2026-03-01T20:00:00.000Z",
            "endDate": "2026-03-04T01:00:00.000Z",
            "categories": [{"catName": "Expo"}, {"catName": "Trade Show"}],
            "convention": {"hostcompany": "Emerald"},
            "convention_facilities": [{"title": "Salt Palace"}, {"title": "Annex"}],
            "url": "/event/outdoor-retailer/123/"
        })));

        assert_eq!(row.title.as_deref(), Some("Outdoor Retailer"));
        assert_eq!(row.start_local.unwrap().to_string(), "2026-03-01 13:00:00-07:00");
        assert_eq!(row.end_local.unwrap().to_string(), "2026-03-03 18:00:00-07:00");
        assert_eq!(row.categories, "Expo, Trade Show");
        assert_eq!(row.host_company.as_deref(), Some("Emerald"));
        assert_eq!(row.primary_venue, "Salt Palace");
        assert_eq!(
            row.event_url,
            "https://www.visitsaltlake.com/event/outdoor-retailer/123/"
        );
    }

    #[test]
    fn test_normalize_event_degrades_fields_independently() {
        let row = Normalizer::default().normalize_event(event(json!({
            "title": "Half Broken",
            "startDate": "soon",
            "endDate": "2026-03-04T01:00:00.000Z",
            "categories": "Expo",
            "convention": null,
        })));

        assert_eq!(row.title.as_deref(), Some("Half Broken"));
        assert_eq!(row.start_local, None);
        assert!(row.end_local.is_some());
        assert_eq!(row.categories, "");
        assert_eq!(row.host_company, None);
        assert_eq!(row.primary_venue, "");
        assert_eq!(row.event_url, "");
    }

    #[test]
    fn test_normalize_event_passes_non_string_title_through() {
        let row = Normalizer::default().normalize_event(event(json!({
            "title": 2026,
            "startDate": "2026-03-01T20:00:00.000Z",
            "convention": {"hostcompany": 42},
        })));

        assert_eq!(row.title.as_deref(), Some("2026"));
        assert_eq!(row.host_company.as_deref(), Some("42"));
        assert_eq!(row.start_local.unwrap().to_string(), "2026-03-01 13:00:00-07:00");
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!("Expo")).as_deref(), Some("Expo"));
        assert_eq!(scalar_text(&json!(2026)).as_deref(), Some("2026"));
        assert_eq!(scalar_text(&json!(1.5)).as_deref(), Some("1.5"));
        assert_eq!(scalar_text(&json!(false)).as_deref(), Some("false"));
        assert_eq!(scalar_text(&json!(null)), None);
    }

    #[test]
    fn test_normalize_sorts_missing_start_last_and_is_stable() {
        let events = vec![
            event(json!({"title": "no start"})),
            event(json!({"title": "late", "startDate": "2026-05-01T18:00:00Z"})),
            event(json!({"title": "tie a", "startDate": "2026-04-01T18:00:00Z"})),
            event(json!({"title": "bad start", "startDate": "tbd"})),
            event(json!({"title": "tie b", "startDate": "2026-04-01T18:00:00Z"})),
        ];

        let titles: Vec<String> = normalize(events)
            .into_iter()
            .map(|row| row.title.unwrap_or_default())
            .collect();
        assert_eq!(titles, ["tie a", "tie b", "late", "no start", "bad start"]);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(Vec::new()).is_empty());
    }

    #[test]
    fn test_normalize_other_timezone() {
        let normalizer = Normalizer::new(DEFAULT_ORIGIN, chrono_tz::America::New_York);
        let row = normalizer.normalize_event(event(json!({"startDate": "2026-03-01T20:00:00.000Z"})));
        assert_eq!(row.start_local.unwrap().to_string(), "2026-03-01 15:00:00-05:00");
    }
}
