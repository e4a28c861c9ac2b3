//! The comment record and its spreadsheet layout.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::core::{PipelineError, Result};
use crate::table::{Cell, Table};

/// Column names of the comment exports and of every sheet the pipeline
/// writes.
pub mod columns {
    pub const TEXT: &str = "评论内容";
    pub const PARENT_ID: &str = "一级评论ID";
    pub const COMMENT_TYPE: &str = "评论类型";
    pub const COMMENT_TIME: &str = "评论时间";
    pub const IP_LOCATION: &str = "IP地址";
    pub const CAMPAIGN: &str = "宣传片内容";
    pub const IS_TOP_LEVEL: &str = "是否主评论";
    pub const PUBLISH_DATE: &str = "视频发布时间";
    pub const URL: &str = "视频链接";
    pub const LOCATION: &str = "景区所在地";
    pub const CATEGORY: &str = "景区类型";
    pub const CAMPAIGN_ID: &str = "宣传片ID";
    pub const LOCATION_ID: &str = "景区所在地ID";
    pub const CATEGORY_ID: &str = "景区类型ID";
    pub const IS_AI_GENERATED: &str = "是否AI生成";
    pub const DAY_DELTA: &str = "评论时间差";
    pub const TEXT_LENGTH: &str = "评论字数";
    pub const TEXT_LENGTH_WITH_EMOJIS: &str = "评论字数(加表情)";
    pub const IS_LOCAL: &str = "是否本地评论";
    pub const SENTIMENT_SCORE: &str = "情感得分";
}

/// Columns of the unioned raw comments sheet.
pub const RAW_COLUMNS: [&str; 5] = [
    columns::TEXT,
    columns::COMMENT_TIME,
    columns::IP_LOCATION,
    columns::CAMPAIGN,
    columns::IS_TOP_LEVEL,
];

/// Columns of the enriched sheet, in output order.
pub const ENRICHED_COLUMNS: [&str; 17] = [
    columns::TEXT,
    columns::COMMENT_TIME,
    columns::IP_LOCATION,
    columns::CAMPAIGN,
    columns::IS_TOP_LEVEL,
    columns::PUBLISH_DATE,
    columns::URL,
    columns::LOCATION,
    columns::CATEGORY,
    columns::CAMPAIGN_ID,
    columns::LOCATION_ID,
    columns::CATEGORY_ID,
    columns::IS_AI_GENERATED,
    columns::DAY_DELTA,
    columns::TEXT_LENGTH,
    columns::TEXT_LENGTH_WITH_EMOJIS,
    columns::IS_LOCAL,
];

/// One comment, accreting derived attributes as it moves through the
/// enrichment stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentRecord {
    pub text: String,
    pub comment_time: Option<NaiveDate>,
    pub ip_location: Option<String>,
    pub campaign: String,
    pub is_top_level: bool,

    pub publish_date: Option<String>,
    pub url: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,

    pub campaign_id: Option<u32>,
    pub location_id: Option<u32>,
    pub category_id: Option<u32>,

    pub is_ai_generated: Option<bool>,
    pub day_delta: Option<i64>,
    pub text_length: Option<usize>,
    pub text_length_with_emojis: Option<usize>,
    pub is_local: Option<bool>,
}

impl CommentRecord {
    pub fn new(
        text: impl Into<String>,
        comment_time: Option<NaiveDate>,
        ip_location: Option<String>,
        campaign: impl Into<String>,
        is_top_level: bool,
    ) -> Self {
        Self {
            text: text.into(),
            comment_time,
            ip_location,
            campaign: campaign.into(),
            is_top_level,
            ..Default::default()
        }
    }

    fn raw_cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.text.clone()),
            Cell::from(self.comment_time.map(format_date)),
            Cell::from(self.ip_location.clone()),
            Cell::from(self.campaign.clone()),
            Cell::from(Some(self.is_top_level)),
        ]
    }

    fn enriched_cells(&self) -> Vec<Cell> {
        let mut cells = self.raw_cells();
        cells.extend([
            Cell::from(self.publish_date.clone()),
            Cell::from(self.url.clone()),
            Cell::from(self.location.clone()),
            Cell::from(self.category.clone()),
            Cell::from(self.campaign_id),
            Cell::from(self.location_id),
            Cell::from(self.category_id),
            Cell::from(self.is_ai_generated),
            Cell::from(self.day_delta),
            Cell::from(self.text_length),
            Cell::from(self.text_length_with_emojis),
            Cell::from(self.is_local),
        ]);
        cells
    }
}

/// Build the raw comments sheet.
pub fn raw_table(records: &[CommentRecord]) -> Table {
    let mut table = Table::with_headers(&RAW_COLUMNS);
    for record in records {
        table.push_row(record.raw_cells());
    }
    table
}

/// Build the enriched sheet. Stage 3 appends the sentiment column to it
/// later.
pub fn enriched_table(records: &[CommentRecord]) -> Table {
    let mut table = Table::with_headers(&ENRICHED_COLUMNS);
    for record in records {
        table.push_row(record.enriched_cells());
    }
    table
}

static MISSING: Cell = Cell::Empty;

/// Read records back from a sheet written by [`raw_table`] or
/// [`enriched_table`]. Rows without comment text are dropped.
pub fn records_from_table(table: &Table) -> Result<Vec<CommentRecord>> {
    let text = table.require_column(columns::TEXT)?;
    let campaign = table.require_column(columns::CAMPAIGN)?;
    let col = |name: &str| table.column_index(name);

    let time = col(columns::COMMENT_TIME);
    let ip = col(columns::IP_LOCATION);
    let top_level = col(columns::IS_TOP_LEVEL);
    let publish = col(columns::PUBLISH_DATE);
    let url = col(columns::URL);
    let location = col(columns::LOCATION);
    let category = col(columns::CATEGORY);
    let campaign_id = col(columns::CAMPAIGN_ID);
    let location_id = col(columns::LOCATION_ID);
    let category_id = col(columns::CATEGORY_ID);
    let ai = col(columns::IS_AI_GENERATED);
    let delta = col(columns::DAY_DELTA);
    let length = col(columns::TEXT_LENGTH);
    let length_emojis = col(columns::TEXT_LENGTH_WITH_EMOJIS);
    let local = col(columns::IS_LOCAL);

    let mut records = Vec::with_capacity(table.len());
    for row in &table.rows {
        let cell = |index: Option<usize>| index.map_or(&MISSING, |i| &row[i]);
        let Some(comment) = row[text].to_text() else {
            continue;
        };
        let campaign_label = row[campaign].to_text().unwrap_or_default();

        let as_id = |index: Option<usize>, column: &str| -> Result<Option<u32>> {
            cell(index)
                .as_i64()
                .map(|v| {
                    u32::try_from(v).map_err(|_| PipelineError::InvalidValue {
                        column: column.to_string(),
                        value: v.to_string(),
                    })
                })
                .transpose()
        };
        let as_count = |index: Option<usize>| cell(index).as_i64().map(|v| v.max(0) as usize);

        records.push(CommentRecord {
            text: comment,
            comment_time: parse_date(cell(time)),
            ip_location: cell(ip).to_text(),
            campaign: campaign_label,
            is_top_level: cell(top_level).as_flag().unwrap_or(true),
            publish_date: cell(publish).to_text(),
            url: cell(url).to_text(),
            location: cell(location).to_text(),
            category: cell(category).to_text(),
            campaign_id: as_id(campaign_id, columns::CAMPAIGN_ID)?,
            location_id: as_id(location_id, columns::LOCATION_ID)?,
            category_id: as_id(category_id, columns::CATEGORY_ID)?,
            is_ai_generated: cell(ai).as_flag(),
            day_delta: cell(delta).as_i64(),
            text_length: as_count(length),
            text_length_with_emojis: as_count(length_emojis),
            is_local: cell(local).as_flag(),
        });
    }
    Ok(records)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

const DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y年%m月%d日 %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日"];

/// Parse a date-like cell. Text in the common export formats, native
/// spreadsheet dates and Excel serial-day numbers are accepted; anything
/// else is `None`.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Text(s) => parse_date_str(s),
        Cell::Int(_) | Cell::Float(_) => cell.as_f64().and_then(excel_serial_to_date),
        _ => None,
    }
}

pub fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        })
        // offset timestamps keep the calendar date they were written in
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Excel stores dates as days since 1899-12-30.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_export_date_formats() {
        assert_eq!(parse_date(&Cell::from("2024-04-12")), Some(date(2024, 4, 12)));
        assert_eq!(
            parse_date(&Cell::from("2024-04-12 08:30:00")),
            Some(date(2024, 4, 12))
        );
        assert_eq!(parse_date(&Cell::from("2024/4/12 8:30")), Some(date(2024, 4, 12)));
        assert_eq!(
            parse_date(&Cell::from("2024-04-12 08:30:00.123")),
            Some(date(2024, 4, 12))
        );
        assert_eq!(
            parse_date(&Cell::from("2024-04-12T08:30:00.5")),
            Some(date(2024, 4, 12))
        );
        assert_eq!(
            parse_date(&Cell::from("2024-04-12T08:30:00Z")),
            Some(date(2024, 4, 12))
        );
        assert_eq!(
            parse_date(&Cell::from("2024-04-12T23:30:00+08:00")),
            Some(date(2024, 4, 12))
        );
        assert_eq!(parse_date(&Cell::from("2024年04月12日")), Some(date(2024, 4, 12)));
        assert_eq!(parse_date(&Cell::from("昨天")), None);
        assert_eq!(parse_date(&Cell::Empty), None);
    }

    #[test]
    fn excel_serials_convert() {
        // 45394 is 2024-04-12 in the 1900 date system.
        assert_eq!(parse_date(&Cell::Float(45394.0)), Some(date(2024, 4, 12)));
        assert_eq!(parse_date(&Cell::Float(45394.75)), Some(date(2024, 4, 12)));
        assert_eq!(parse_date(&Cell::Int(-3)), None);
    }

    #[test]
    fn enriched_round_trip_through_table() {
        let mut record = CommentRecord::new(
            "好美",
            Some(date(2024, 4, 12)),
            Some("中国云南".into()),
            "video-AI生成",
            false,
        );
        record.campaign_id = Some(1);
        record.day_delta = Some(3);
        record.is_ai_generated = Some(true);
        record.text_length = Some(2);

        let table = enriched_table(std::slice::from_ref(&record));
        assert!(table.column_index(columns::SENTIMENT_SCORE).is_none());
        let back = records_from_table(&table).unwrap();
        assert_eq!(back, vec![record]);
    }

    #[test]
    fn rows_without_text_are_dropped() {
        let mut table = Table::with_headers(&RAW_COLUMNS);
        table.push_row(vec![Cell::Empty, Cell::Empty, Cell::Empty, Cell::from("v")]);
        table.push_row(vec![Cell::from("hi"), Cell::Empty, Cell::Empty, Cell::from("v")]);
        let records = records_from_table(&table).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "hi");
    }
}
