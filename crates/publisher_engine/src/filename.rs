use chrono::{DateTime, Local};

const MAX_TITLE_CHARS: usize = 40;

/// Archive file name: `{sanitized_title}_{YYYYmmdd_HHMMSS}.md`.
pub fn archive_filename(title: &str, at: DateTime<Local>) -> String {
    let sanitized = sanitize_title(title);
    format!("{sanitized}_{}.md", at.format("%Y%m%d_%H%M%S"))
}

fn sanitize_title(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    // Collapse runs of underscores and whitespace.
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_separator = false;
    for c in cleaned.chars() {
        if c == '_' || c.is_whitespace() {
            if !prev_separator {
                compacted.push('_');
            }
            prev_separator = true;
        } else {
            compacted.push(c);
            prev_separator = false;
        }
    }

    let mut final_name: String = compacted.chars().take(MAX_TITLE_CHARS).collect();
    let trimmed_len = final_name.trim_end_matches('_').len();
    final_name.truncate(trimmed_len);
    if final_name.is_empty() {
        final_name = "untitled".to_string();
    }
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    ) || matches!(c, '：' | '？' | '／' | '＊' | '｜')
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
