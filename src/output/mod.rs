//! 审计导出模块
//! 将审计记录渲染为 CSV 文本

use crate::models::{AuditEntry, SubjectKind};

/// 固定列顺序；第二列名随对象类型变化（reviewId / newsId / userId）
pub fn csv_header(kind: SubjectKind) -> String {
    [
        "id",
        kind.id_key(),
        "action",
        "byId",
        "byName",
        "reason",
        "note",
        "timestamp",
    ]
    .join(",")
}

/// 字段含逗号、引号或换行时加引号，内部引号加倍
fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(entry: &AuditEntry) -> String {
    let by_id = entry.by_id.map(|id| id.to_string()).unwrap_or_default();
    let timestamp = entry
        .timestamp
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    [
        entry.id.to_string(),
        entry.subject_id.to_string(),
        entry.action.as_str().to_string(),
        by_id,
        escape_field(&entry.by_name),
        escape_field(entry.reason.as_deref().unwrap_or("")),
        escape_field(entry.note.as_deref().unwrap_or("")),
        timestamp,
    ]
    .join(",")
}

/// 渲染完整 CSV（表头 + 每行一条记录，换行结尾）
pub fn render_csv(kind: SubjectKind, entries: &[AuditEntry]) -> String {
    let mut out = String::with_capacity(64 * (entries.len() + 1));
    out.push_str(&csv_header(kind));
    out.push('\n');

    for entry in entries {
        out.push_str(&csv_row(entry));
        out.push('\n');
    }

    out
}

/// 导出文件名
pub fn csv_filename(kind: SubjectKind) -> String {
    format!("{}-audit.csv", kind.as_str())
}
