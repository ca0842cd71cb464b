use crate::{
    parse_day, parse_features, parse_week, to_24_hour, DaySchedule, RawRow, TimeOfDay, Weekday,
};

fn hhmm(value: &str) -> TimeOfDay {
    value.parse().expect("valid HH:MM")
}

#[test]
fn twelve_hour_tokens_round_trip_through_display() {
    for (token, canonical, display) in [
        ("12:00AM", "00:00", "12:00 AM"),
        ("12:00PM", "12:00", "12:00 PM"),
        ("1:30PM", "13:30", "1:30 PM"),
        ("11:45AM", "11:45", "11:45 AM"),
    ] {
        let time = to_24_hour(token).expect("well formed token");
        assert_eq!(time.to_string(), canonical);
        assert_eq!(time.to_12_hour(), display);
    }
}

#[test]
fn parse_day_is_idempotent() {
    for cell in ["9AM\u{2013}5PM", "Closed", "Open 24 hours", "9\u{2013}5", "whenever"] {
        assert_eq!(parse_day(cell), parse_day(cell));
    }
}

#[test]
fn no_marker_range_keeps_inverted_order() {
    let DaySchedule::Ranged { start, close, .. } = parse_day("9\u{2013}5").expect("range") else {
        panic!("expected ranged hours");
    };
    assert_eq!(start, hhmm("21:00"));
    assert_eq!(close, hhmm("17:00"));
    assert!(close < start);
}

#[test]
fn week_from_spreadsheet_row() {
    let row: RawRow = Weekday::ALL
        .iter()
        .map(|day| (day.source_column(), "10AM\u{2013}9PM".to_string()))
        .chain([("Title".to_string(), "Cafe X".to_string())])
        .collect();

    let week = parse_week(&row);
    assert_eq!(week.len(), 7);
    for (_, schedule) in week.iter() {
        assert_eq!(schedule.start(), Some(hhmm("10:00")));
        assert_eq!(schedule.close(), Some(hhmm("21:00")));
    }
}

#[test]
fn feature_blob_with_underscored_labels() {
    let map = parse_features(
        "{'Service_options': ['Delivery', 'Takeout'], 'Highlights': ['Great coffee']}",
    );
    assert_eq!(map.len(), 2);
    assert_eq!(
        map.get("Service_options").map(<[String]>::len),
        Some(2)
    );
}
