use crate::progress::{ProgressRow, ProgressSummary};
use crate::vocabulary::VocabularyEntry;
use unicode_width::UnicodeWidthStr;

const HEADERS: [&str; 6] = [
    "Word",
    "Translation",
    "Status",
    "Success",
    "Practiced",
    "Last practiced",
];

/// Pad to a display width; CJK and other wide glyphs count double
fn pad(text: &str, width: usize) -> String {
    let shown = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(shown)))
}

pub fn entry_lines(entries: &[VocabularyEntry]) -> String {
    let width = entries
        .iter()
        .map(|e| UnicodeWidthStr::width(e.word.as_str()))
        .max()
        .unwrap_or(0);
    entries
        .iter()
        .map(|e| format!("{}  {}", pad(&e.word, width), e.translation))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One numbered multiple-choice question per line block
pub fn choice_question(number: usize, prompt: &str, options: &[String]) -> String {
    let mut lines = vec![format!("{number}. {prompt}")];
    lines.extend(
        options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("   {}) {option}", (b'a' + i as u8) as char)),
    );
    lines.join("\n")
}

pub fn progress_table(rows: &[ProgressRow]) -> String {
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.entry.word.clone(),
                r.entry.translation.clone(),
                r.status.to_string(),
                format!("{:.0}%", r.success_rate),
                r.entry.times_practiced.to_string(),
                r.entry
                    .last_practiced
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "never".to_string()),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(UnicodeWidthStr::width);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let render = |row: &[&str]| {
        row.iter()
            .zip(widths)
            .map(|(cell, w)| pad(cell, w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render(&HEADERS)];
    for row in &cells {
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(render(&refs));
    }
    lines.join("\n")
}

pub fn summary_line(summary: &ProgressSummary) -> String {
    format!(
        "Total Words: {} | Words Learnt: {} | In Progress: {} | Average Success: {:.1}%",
        summary.total, summary.learnt, summary.in_progress, summary.average_success_rate
    )
}
