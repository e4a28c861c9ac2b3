#![allow(dead_code)]

use std::path::{Path, PathBuf};

use comment_sentiment::table::{write_table, Cell, Table};

/// One exported comment: text, thread marker, time, IP location.
pub type ExportRow<'a> = (&'a str, Option<&'a str>, &'a str, &'a str);

/// Write an export carrying the parent-id thread column.
pub fn write_parent_id_export(dir: &Path, label: &str, rows: &[ExportRow]) -> PathBuf {
    write_export(dir, label, "一级评论ID", rows)
}

/// Write an export carrying the comment-type thread column.
pub fn write_comment_type_export(dir: &Path, label: &str, rows: &[ExportRow]) -> PathBuf {
    write_export(dir, label, "评论类型", rows)
}

fn write_export(dir: &Path, label: &str, thread_column: &str, rows: &[ExportRow]) -> PathBuf {
    let mut table = Table::with_headers(&["评论内容", thread_column, "评论时间", "IP地址", "点赞数"]);
    for (text, marker, time, ip) in rows {
        table.push_row(vec![
            Cell::from(*text),
            Cell::from(*marker),
            Cell::from(*time),
            Cell::from(*ip),
            Cell::Int(3),
        ]);
    }
    let path = dir.join(format!("{label}.xlsx"));
    write_table(&path, &table).expect("write export");
    path
}

pub const CAMPAIGNS_YAML: &str = r#"
"《南京文旅》城市宣传-南京风光-AI生成":
  publish_date: "2024-04-10"
  url: "https://example.com/nanjing-ai"
  location: 江苏
  category: 自然景观
"《南京文旅》城市宣传-南京风光-人生成":
  publish_date: "2024-07-16"
  url: "https://example.com/nanjing-human"
  location: 江苏
  category: 自然景观
"《山西文旅》城市建筑宣传-AI生成":
  publish_date: "2023-05-16"
  url: "https://example.com/shanxi-ai"
  location: 山西
  category: 人文景观
"#;

/// A folder with three exports covering both thread-column layouts.
pub fn sample_folder(dir: &Path) -> PathBuf {
    let folder = dir.join("exports");
    std::fs::create_dir_all(&folder).expect("create export folder");
    write_parent_id_export(
        &folder,
        "《南京文旅》城市宣传-南京风光-AI生成",
        &[
            ("南京太美了[微笑]", None, "2024-04-10 09:30:00", "江苏"),
            ("好看", Some("6616477b000000001b008dd8"), "2024-04-12 18:02:11", "上海"),
            ("求拍摄地点", Some("一级评论"), "2024-04-01", "江苏南京"),
        ],
    );
    write_comment_type_export(
        &folder,
        "《南京文旅》城市宣传-南京风光-人生成",
        &[
            ("想去！！", Some("一级评论"), "2024-07-20", "北京"),
            ("同感", Some("子评论"), "2024-07-21", "江苏"),
        ],
    );
    write_parent_id_export(
        &folder,
        "《山西文旅》城市建筑宣传-AI生成",
        &[
            ("太失望了，差评", None, "2023-06-01", "山西"),
            ("", None, "2023-06-02", "山西"),
        ],
    );
    folder
}
