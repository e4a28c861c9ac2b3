//! Stage 2: derive attribute columns on the unioned comments.
//!
//! The stages run in a fixed order because later ones read columns written
//! by earlier ones (IDs are assigned after the metadata join, the day delta
//! needs the joined publish date, the local flag needs the attached IP
//! locations). A stage that fails is logged and skipped; its columns keep
//! whatever value they had before. Fallible stages compute all their values
//! before touching a record, so a skipped stage never leaves a half-filled
//! column behind.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::core::{CampaignTable, PipelineError, Result};
use crate::record::{
    columns, enriched_table, format_date, parse_date_str, records_from_table, CommentRecord,
};
use crate::table::{read_first_sheet, write_table, Cell};
use crate::utils::{text_length, text_length_with_emojis};

pub const AI_GENERATED_MARKER: &str = "AI生成";
pub const HUMAN_GENERATED_MARKER: &str = "人生成";

/// Day delta written when a comment predates publishing or a date is
/// missing.
pub const DAY_DELTA_SENTINEL: i64 = -1;

/// Names of the enrichment stages that were skipped because they failed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub skipped_stages: Vec<&'static str>,
}

impl EnrichmentReport {
    pub fn is_complete(&self) -> bool {
        self.skipped_stages.is_empty()
    }
}

/// Join publish date, URL, location and category by campaign label.
/// Unknown labels get empty metadata.
pub fn add_campaign_metadata(records: &mut [CommentRecord], campaigns: &CampaignTable) {
    let mut unmatched = 0usize;
    for record in records.iter_mut() {
        match campaigns.get(&record.campaign) {
            Some(meta) => {
                record.publish_date = Some(meta.publish_date.clone());
                record.url = Some(meta.url.clone());
                record.location = Some(meta.location.clone());
                record.category = Some(meta.category.clone());
            }
            None => {
                record.publish_date = None;
                record.url = None;
                record.location = None;
                record.category = None;
                unmatched += 1;
            }
        }
    }
    if unmatched > 0 {
        warn!("{unmatched} comments belong to campaigns without metadata");
    }
}

/// First-seen enumeration: each distinct value gets the next integer,
/// starting at 1, in order of first appearance. Returns the ID of every
/// input value and the mapping in assignment order.
pub fn first_seen_ids<K, I>(values: I) -> (Vec<u32>, Vec<(K, u32)>)
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, u32> = HashMap::new();
    let mut mapping = Vec::new();
    let ids = values
        .into_iter()
        .map(|value| {
            if let Some(&id) = index.get(&value) {
                return id;
            }
            let id = mapping.len() as u32 + 1;
            index.insert(value.clone(), id);
            mapping.push((value, id));
            id
        })
        .collect();
    (ids, mapping)
}

fn display_key(key: &Option<String>) -> &str {
    key.as_deref().unwrap_or("<none>")
}

pub fn add_campaign_ids(records: &mut [CommentRecord]) {
    let (ids, mapping) = first_seen_ids(records.iter().map(|r| r.campaign.clone()));
    for (record, id) in records.iter_mut().zip(ids) {
        record.campaign_id = Some(id);
    }
    for (label, id) in &mapping {
        info!("  campaign ID {id}: {label}");
    }
    info!("campaigns: {}", mapping.len());
}

pub fn add_location_ids(records: &mut [CommentRecord]) {
    let (ids, mapping) = first_seen_ids(records.iter().map(|r| r.location.clone()));
    for (record, id) in records.iter_mut().zip(ids) {
        record.location_id = Some(id);
    }
    info!("location ID mapping:");
    for (location, id) in &mapping {
        info!("  location ID {id}: {}", display_key(location));
    }
}

pub fn add_category_ids(records: &mut [CommentRecord]) {
    let (ids, mapping) = first_seen_ids(records.iter().map(|r| r.category.clone()));
    for (record, id) in records.iter_mut().zip(ids) {
        record.category_id = Some(id);
    }
    info!("category ID mapping:");
    for (category, id) in &mapping {
        info!("  category ID {id}: {}", display_key(category));
    }
}

/// Attach the cached IP-location column, aligned by row position.
///
/// A missing cache file or an unreadable one clears the column. A cache
/// whose row count differs from `records` is an error and nothing changes.
pub fn attach_ip_locations(records: &mut [CommentRecord], cache_file: &Path) -> Result<()> {
    if !cache_file.exists() {
        warn!(
            "IP location cache {} not found, clearing IP locations",
            cache_file.display()
        );
        records.iter_mut().for_each(|r| r.ip_location = None);
        return Ok(());
    }

    let locations = match read_ip_cache(cache_file) {
        Ok(locations) => locations,
        Err(e) => {
            warn!("failed to read IP location cache: {e}, clearing IP locations");
            records.iter_mut().for_each(|r| r.ip_location = None);
            return Ok(());
        }
    };

    if locations.len() != records.len() {
        return Err(PipelineError::RowCountMismatch {
            expected: records.len(),
            actual: locations.len(),
        });
    }
    for (record, location) in records.iter_mut().zip(locations) {
        record.ip_location = location;
    }
    info!("attached {} cached IP locations", records.len());
    Ok(())
}

fn read_ip_cache(path: &Path) -> Result<Vec<Option<String>>> {
    let table = read_first_sheet(path)?;
    let locations = table.column(columns::IP_LOCATION)?.map(Cell::to_text).collect();
    Ok(locations)
}

pub fn ai_generated_flag(label: &str) -> Option<bool> {
    if label.contains(AI_GENERATED_MARKER) {
        Some(true)
    } else if label.contains(HUMAN_GENERATED_MARKER) {
        Some(false)
    } else {
        None
    }
}

pub fn add_ai_generated_flags(records: &mut [CommentRecord]) {
    for record in records.iter_mut() {
        record.is_ai_generated = ai_generated_flag(&record.campaign);
    }
}

/// Inclusive day count from publishing to commenting: a comment on the
/// publish day is day 1. Comments before publishing get the sentinel.
pub fn day_delta(comment: NaiveDate, publish: NaiveDate) -> i64 {
    let delta = (comment - publish).num_days() + 1;
    if delta <= 0 {
        DAY_DELTA_SENTINEL
    } else {
        delta
    }
}

/// Compute the day delta of every comment and normalize the publish date
/// to `YYYY-MM-DD`. Fails without touching any record when a publish date
/// cannot be parsed.
pub fn add_day_deltas(records: &mut [CommentRecord]) -> Result<()> {
    let publish_dates = records
        .iter()
        .map(|record| match record.publish_date.as_deref() {
            None => Ok(None),
            Some(raw) => parse_date_str(raw)
                .map(Some)
                .ok_or_else(|| PipelineError::InvalidValue {
                    column: columns::PUBLISH_DATE.to_string(),
                    value: raw.to_string(),
                }),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut predating = 0usize;
    let mut missing = 0usize;
    let mut total_days = 0i64;
    let mut counted = 0usize;
    for (record, publish) in records.iter_mut().zip(publish_dates) {
        let delta = match (record.comment_time, publish) {
            (Some(comment), Some(publish)) => {
                let delta = day_delta(comment, publish);
                if delta == DAY_DELTA_SENTINEL {
                    predating += 1;
                } else {
                    total_days += delta;
                    counted += 1;
                }
                delta
            }
            _ => {
                missing += 1;
                DAY_DELTA_SENTINEL
            }
        };
        record.day_delta = Some(delta);
        record.publish_date = publish.map(format_date);
    }

    info!("comment timing:");
    info!("  comments before publish date: {predating}");
    info!("  comments without a comparable date: {missing}");
    if counted > 0 {
        info!(
            "  mean delay of other comments: {:.1} days",
            total_days as f64 / counted as f64
        );
    }
    Ok(())
}

pub fn add_text_lengths(records: &mut [CommentRecord]) {
    for record in records.iter_mut() {
        record.text_length = Some(text_length(&record.text));
        record.text_length_with_emojis = Some(text_length_with_emojis(&record.text));
    }
}

/// A commenter is local when their IP location contains the campaign's
/// location, both trimmed. Missing values never match.
pub fn is_local_comment(ip_location: Option<&str>, campaign_location: Option<&str>) -> bool {
    match (ip_location, campaign_location) {
        (Some(ip), Some(location)) => ip.trim().contains(location.trim()),
        _ => false,
    }
}

pub fn add_local_flags(records: &mut [CommentRecord]) {
    let mut local = 0usize;
    for record in records.iter_mut() {
        let flag = is_local_comment(record.ip_location.as_deref(), record.location.as_deref());
        local += usize::from(flag);
        record.is_local = Some(flag);
    }
    info!("local comments: {local}");
    if !records.is_empty() {
        info!(
            "local comment share: {:.1}%",
            local as f64 / records.len() as f64 * 100.0
        );
    }
}

fn run_stage<F>(report: &mut EnrichmentReport, name: &'static str, stage: F)
where
    F: FnOnce() -> Result<()>,
{
    if let Err(e) = stage() {
        warn!("enrichment stage '{name}' failed and was skipped: {e}");
        report.skipped_stages.push(name);
    }
}

/// Run every enrichment stage over `records` in order.
pub fn enrich(
    records: &mut [CommentRecord],
    campaigns: &CampaignTable,
    ip_cache_file: &Path,
) -> EnrichmentReport {
    let mut report = EnrichmentReport::default();

    run_stage(&mut report, "campaign metadata", || {
        add_campaign_metadata(records, campaigns);
        Ok(())
    });
    run_stage(&mut report, "campaign ids", || {
        add_campaign_ids(records);
        Ok(())
    });
    run_stage(&mut report, "location ids", || {
        add_location_ids(records);
        Ok(())
    });
    run_stage(&mut report, "category ids", || {
        add_category_ids(records);
        Ok(())
    });
    run_stage(&mut report, "ip locations", || {
        attach_ip_locations(records, ip_cache_file)
    });
    run_stage(&mut report, "ai generated flag", || {
        add_ai_generated_flags(records);
        Ok(())
    });
    run_stage(&mut report, "day delta", || add_day_deltas(records));
    run_stage(&mut report, "text length", || {
        add_text_lengths(records);
        Ok(())
    });
    run_stage(&mut report, "local flag", || {
        add_local_flags(records);
        Ok(())
    });

    if !report.is_complete() {
        warn!(
            "enriched table is partial, skipped stages: {}",
            report.skipped_stages.join(", ")
        );
    }
    report
}

/// Run stage 2: read the raw sheet, enrich it and write the result.
/// Reading and writing failures abort; stage failures do not.
pub fn enrich_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    campaigns: &CampaignTable,
    ip_cache_file: impl AsRef<Path>,
) -> Result<Vec<CommentRecord>> {
    let table = read_first_sheet(input.as_ref())?;
    let mut records = records_from_table(&table)?;

    enrich(&mut records, campaigns, ip_cache_file.as_ref());

    write_table(output.as_ref(), &enriched_table(&records))?;
    info!("enrichment done, {} comments", records.len());
    info!("enriched comments saved to {}", output.as_ref().display());
    Ok(records)
}
