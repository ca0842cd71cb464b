// crates/venuesync-core/src/processor.rs

use serde::Serialize;
use tracing::{debug, info, warn};
use venuesync_parser::{parse_week, try_parse_features, FeatureMap, RawRow, WeekSchedule, Weekday};

use crate::codec;
use crate::config::ImportOptions;
use crate::error::Result;
use crate::render::render_content_block;
use crate::store::{PostId, VenueStore};

pub const TITLE_COLUMN: &str = "Title";
pub const ABOUT_COLUMN: &str = "about";
pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";

pub const HOURS_META_KEY: &str = "_bdbh";
pub const MEALS_META_KEY: &str = "_custom-checkbox-2";
pub const DIETS_META_KEY: &str = "_custom-checkbox";
pub const LATITUDE_META_KEY: &str = "_manual_lat";
pub const LONGITUDE_META_KEY: &str = "_manual_lng";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
}

impl Meal {
    const ALL: [Meal; 3] = [Meal::Breakfast, Meal::Lunch, Meal::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "Breakfast",
            Meal::Lunch => "Lunch",
            Meal::Dinner => "Dinner",
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Diet {
    Halal,
    #[serde(rename = "Vegetarian Friendly")]
    VegetarianFriendly,
}

impl Diet {
    const ALL: [Diet; 2] = [Diet::Halal, Diet::VegetarianFriendly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Diet::Halal => "Halal",
            Diet::VegetarianFriendly => "Vegetarian Friendly",
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Diet::Halal => "halal",
            Diet::VegetarianFriendly => "vegetarian",
        }
    }
}

/// Everything derived from one spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueRecord {
    pub title: String,
    /// `None` when none of the seven hours columns has text.
    pub schedule: Option<WeekSchedule>,
    pub about: Option<String>,
    /// `None` when the about text is absent or is not a feature blob.
    pub features: Option<FeatureMap>,
    pub meals: Vec<Meal>,
    pub diets: Vec<Diet>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl VenueRecord {
    /// Returns `None` when the row has no title.
    pub fn from_row(row: &RawRow) -> Option<Self> {
        let title = row.non_empty(TITLE_COLUMN)?.to_string();

        let has_hours = Weekday::ALL
            .iter()
            .any(|day| row.non_empty(&day.source_column()).is_some());
        let schedule = has_hours.then(|| parse_week(row));

        let about = row.non_empty(ABOUT_COLUMN).map(|_| row.get(ABOUT_COLUMN).to_string());
        let lowered = about.as_deref().unwrap_or_default().to_lowercase();
        let meals = Meal::ALL
            .into_iter()
            .filter(|meal| lowered.contains(meal.keyword()))
            .collect();
        let diets = Diet::ALL
            .into_iter()
            .filter(|diet| lowered.contains(diet.keyword()))
            .collect();

        let features = about.as_deref().and_then(|text| match try_parse_features(text) {
            Ok(features) => Some(features),
            Err(err) => {
                warn!(title = %title, raw = text, error = %err, "About text is not a feature block; content left untouched");
                None
            }
        });

        Some(Self {
            title,
            schedule,
            about,
            features,
            meals,
            diets,
            latitude: row.non_empty(LATITUDE_COLUMN).map(str::to_string),
            longitude: row.non_empty(LONGITUDE_COLUMN).map(str::to_string),
        })
    }

    /// Writes for this venue, in application order.
    pub fn operations(&self, post_id: PostId) -> Vec<UpsertOp> {
        let mut ops = Vec::new();

        if let Some(schedule) = &self.schedule {
            push_encoded(&mut ops, post_id, HOURS_META_KEY, schedule);
        }

        // Diets are only written alongside meals, even when empty.
        if !self.meals.is_empty() {
            push_encoded(&mut ops, post_id, MEALS_META_KEY, &self.meals);
            push_encoded(&mut ops, post_id, DIETS_META_KEY, &self.diets);
        }

        if let Some(lat) = &self.latitude {
            ops.push(UpsertOp::meta(post_id, LATITUDE_META_KEY, lat.clone()));
        }
        if let Some(lng) = &self.longitude {
            ops.push(UpsertOp::meta(post_id, LONGITUDE_META_KEY, lng.clone()));
        }

        if let (Some(about), Some(features)) = (&self.about, &self.features) {
            let empty = WeekSchedule::new();
            let schedule = self.schedule.as_ref().unwrap_or(&empty);
            ops.push(UpsertOp::Content {
                post_id,
                html: render_content_block(about, features, schedule),
            });
        }

        ops
    }
}

fn push_encoded<T: Serialize + ?Sized>(
    ops: &mut Vec<UpsertOp>,
    post_id: PostId,
    key: &'static str,
    value: &T,
) {
    let payload = codec::encode(value);
    if payload.is_empty() {
        warn!(key, "Skipping metadata write with empty payload");
        return;
    }
    ops.push(UpsertOp::meta(post_id, key, payload));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOp {
    /// Find-then-write of one post-metadata row.
    Meta {
        post_id: PostId,
        key: &'static str,
        value: String,
    },
    /// Replaces the post body, but only while it has not been edited by hand.
    Content { post_id: PostId, html: String },
}

impl UpsertOp {
    fn meta(post_id: PostId, key: &'static str, value: String) -> Self {
        UpsertOp::Meta {
            post_id,
            key,
            value,
        }
    }

    pub fn target(&self) -> &'static str {
        match self {
            UpsertOp::Meta { key, .. } => *key,
            UpsertOp::Content { .. } => "post_content",
        }
    }
}

/// Builds the writes for a row once its post id is known. Rows without a
/// title produce nothing.
pub fn plan_operations(row: &RawRow, post_id: PostId) -> Vec<UpsertOp> {
    VenueRecord::from_row(row)
        .map(|record| record.operations(post_id))
        .unwrap_or_default()
}

/// True while the post body is empty or still holds the raw feature blob.
pub fn content_needs_migration(existing: &str) -> bool {
    let trimmed = existing.trim();
    trimmed.is_empty() || trimmed.starts_with('{')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingTitle,
    FilteredOut,
    PostNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Applied { post_id: PostId, operations: usize },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub rows: usize,
    pub applied: usize,
    pub skipped_missing_title: usize,
    pub skipped_filtered: usize,
    pub skipped_not_found: usize,
    pub meta_inserted: usize,
    pub meta_updated: usize,
    pub content_updated: usize,
    pub content_guarded: usize,
    pub dry_run_writes: usize,
}

impl ImportReport {
    pub fn skipped(&self) -> usize {
        self.skipped_missing_title + self.skipped_filtered + self.skipped_not_found
    }

    pub fn writes(&self) -> usize {
        self.meta_inserted + self.meta_updated + self.content_updated
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingTitle => self.skipped_missing_title += 1,
            SkipReason::FilteredOut => self.skipped_filtered += 1,
            SkipReason::PostNotFound => self.skipped_not_found += 1,
        }
    }
}

pub struct RowProcessor<'a, S: VenueStore + ?Sized> {
    store: &'a S,
    options: &'a ImportOptions,
}

impl<'a, S: VenueStore + ?Sized> RowProcessor<'a, S> {
    pub fn new(store: &'a S, options: &'a ImportOptions) -> Self {
        Self { store, options }
    }

    /// Processes one row. Store failures are returned to the caller and end the run.
    pub async fn process_row(&self, row: &RawRow, report: &mut ImportReport) -> Result<RowOutcome> {
        report.rows += 1;
        let outcome = self.process_row_inner(row, report).await?;
        match &outcome {
            RowOutcome::Applied { .. } => report.applied += 1,
            RowOutcome::Skipped(reason) => report.record_skip(*reason),
        }
        Ok(outcome)
    }

    async fn process_row_inner(&self, row: &RawRow, report: &mut ImportReport) -> Result<RowOutcome> {
        let Some(title) = row.non_empty(TITLE_COLUMN) else {
            warn!("Skipping row without a title");
            return Ok(RowOutcome::Skipped(SkipReason::MissingTitle));
        };

        // Filtered rows are skipped before any cell is parsed.
        if let Some(filter) = &self.options.restaurant_filter {
            if title != filter {
                debug!(title, "Skipping row outside the restaurant filter");
                return Ok(RowOutcome::Skipped(SkipReason::FilteredOut));
            }
        }

        let Some(post_id) = self.store.find_post_id(title).await? else {
            warn!(title, "No post found with this title");
            return Ok(RowOutcome::Skipped(SkipReason::PostNotFound));
        };

        let operations = plan_operations(row, post_id);
        for op in &operations {
            self.apply(op, report).await?;
        }

        info!(title, post_id, operations = operations.len(), "Row imported");
        Ok(RowOutcome::Applied {
            post_id,
            operations: operations.len(),
        })
    }

    async fn apply(&self, op: &UpsertOp, report: &mut ImportReport) -> Result<()> {
        if self.options.dry_run {
            info!(target_field = op.target(), "Dry run: skipping write");
            report.dry_run_writes += 1;
            return Ok(());
        }

        match op {
            UpsertOp::Meta {
                post_id,
                key,
                value,
            } => match self.store.find_meta(*post_id, key).await? {
                Some(meta_id) => {
                    self.store.update_meta(meta_id, value).await?;
                    debug!(post_id, key, meta_id, "Updated metadata");
                    report.meta_updated += 1;
                }
                None => {
                    let meta_id = self.store.insert_meta(*post_id, key, value).await?;
                    debug!(post_id, key, meta_id, "Inserted metadata");
                    report.meta_inserted += 1;
                }
            },
            UpsertOp::Content { post_id, html } => {
                let existing = self.store.fetch_post_content(*post_id).await?.unwrap_or_default();
                if content_needs_migration(&existing) {
                    self.store.update_post_content(*post_id, html).await?;
                    debug!(post_id, "Updated post content");
                    report.content_updated += 1;
                } else {
                    info!(post_id, "Post content already edited; leaving it unchanged");
                    report.content_guarded += 1;
                }
            }
        }
        Ok(())
    }
}

/// Processes rows one at a time. The first store failure aborts the run;
/// writes already made for earlier steps or rows are kept.
pub async fn run_import<S: VenueStore + ?Sized>(
    store: &S,
    rows: &[RawRow],
    options: &ImportOptions,
) -> Result<ImportReport> {
    let processor = RowProcessor::new(store, options);
    let mut report = ImportReport::default();

    for row in rows {
        processor.process_row(row, &mut report).await?;
    }

    info!(
        rows = report.rows,
        applied = report.applied,
        skipped = report.skipped(),
        writes = report.writes(),
        "Import finished"
    );
    Ok(report)
}

/// Runs the import, then closes the store whether or not the run succeeded.
pub async fn run_and_release<S: VenueStore + ?Sized>(
    store: &S,
    rows: &[RawRow],
    options: &ImportOptions,
) -> Result<ImportReport> {
    let outcome = run_import(store, rows, options).await;
    store.close().await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn meals_and_diets_from_about_text() {
        let record = VenueRecord::from_row(&row(&[
            ("Title", "Diner"),
            ("about", "Open for DINNER, Breakfast too. Vegetarian options, Halal meat."),
        ]))
        .unwrap();
        assert_eq!(record.meals, vec![Meal::Breakfast, Meal::Dinner]);
        assert_eq!(record.diets, vec![Diet::Halal, Diet::VegetarianFriendly]);
        assert!(record.features.is_none());
    }

    #[test]
    fn diets_need_meals_to_be_written() {
        let ops = plan_operations(&row(&[("Title", "Kebab"), ("about", "halal only")]), 7);
        assert!(ops.is_empty());
    }

    #[test]
    fn empty_diets_written_with_meals() {
        let ops = plan_operations(&row(&[("Title", "Brunch"), ("about", "lunch")]), 7);
        assert_eq!(
            ops,
            vec![
                UpsertOp::meta(7, MEALS_META_KEY, r#"a:1:{i:0;s:5:"Lunch";}"#.to_string()),
                UpsertOp::meta(7, DIETS_META_KEY, "a:0:{}".to_string()),
            ]
        );
    }

    #[test]
    fn blank_title_plans_nothing() {
        assert!(plan_operations(&row(&[("Title", "  "), ("Latitude", "1.0")]), 1).is_empty());
    }

    #[test]
    fn feature_blob_about_queues_content() {
        let ops = plan_operations(
            &row(&[
                ("Title", "Cafe Y"),
                ("about", "{'Amenities': ['Wifi']}"),
                ("Open_Time_Friday", "Closed"),
            ]),
            3,
        );
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].target(), HOURS_META_KEY);
        let UpsertOp::Content { post_id, html } = &ops[1] else {
            panic!("expected content update");
        };
        assert_eq!(*post_id, 3);
        assert!(html.starts_with("{'Amenities': ['Wifi']}\n<hr />"));
        assert!(html.contains("<tr><td>Friday</td><td>Closed</td></tr>"));
    }

    #[test]
    fn migration_guard() {
        assert!(content_needs_migration(""));
        assert!(content_needs_migration("  \n"));
        assert!(content_needs_migration("{'Amenities': ['Wifi']}"));
        assert!(!content_needs_migration("<p>Hand written intro</p>"));
    }
}
