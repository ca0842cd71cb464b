use html_escape::encode_text;
use venuesync_parser::{FeatureMap, WeekSchedule, Weekday};

/// One `<p>` per category: bold label (underscores as spaces) then its features.
pub fn render_features(features: &FeatureMap) -> String {
    features
        .iter()
        .map(|(label, items)| {
            format!(
                "<p><strong>{}:</strong> {}</p>",
                encode_text(&label.replace('_', " ")),
                encode_text(&items.join(", "))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders all seven days, monday first. A day without both opening and
/// closing times (including days missing from the schedule) shows "Closed".
pub fn render_hours_table(schedule: &WeekSchedule) -> String {
    let mut rows = vec![
        "<table>".to_string(),
        "<thead><tr><th>Day</th><th>Hours</th></tr></thead>".to_string(),
        "<tbody>".to_string(),
    ];

    for day in Weekday::ALL {
        let hours = schedule
            .get(day)
            .and_then(|entry| Some((entry.start()?, entry.close()?)))
            .map(|(start, close)| format!("{} - {}", start.to_12_hour(), close.to_12_hour()))
            .unwrap_or_else(|| "Closed".to_string());
        rows.push(format!("<tr><td>{}</td><td>{}</td></tr>", day.label(), hours));
    }

    rows.push("</tbody>".to_string());
    rows.push("</table>".to_string());
    rows.join("\n")
}

/// Page body: the original about text followed by the features and hours sections.
pub fn render_content_block(about: &str, features: &FeatureMap, schedule: &WeekSchedule) -> String {
    [
        about.to_string(),
        "<hr />".to_string(),
        "<h3>Features</h3>".to_string(),
        render_features(features),
        "<h3>Hours</h3>".to_string(),
        render_hours_table(schedule),
    ]
    .join("\n")
}
