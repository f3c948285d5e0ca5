use chrono::{DateTime, Local};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Episode {
    pub(crate) id: u32,
    pub(crate) title: String,
    pub(crate) sequence_number: u32,
}

impl Episode {
    pub(crate) fn new(id: u32, title: impl Into<String>, sequence_number: u32) -> Self {
        Self {
            id,
            title: title.into(),
            sequence_number,
        }
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

pub(crate) fn format_updated_display(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M %:z")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}
