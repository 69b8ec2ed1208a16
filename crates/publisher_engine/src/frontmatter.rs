use publisher_core::{Article, CallError, ImageReference};

use crate::convert::Converter;

/// Markdown document for an article that could not be filed as a draft.
///
/// Front matter records why; the body holds the readable article followed by
/// the original markup so it can be pasted into the platform editor unchanged.
pub fn build_archive_document(
    article: &Article,
    image: Option<&ImageReference>,
    reason: &CallError,
    archived_utc: &str,
    converter: &dyn Converter,
) -> String {
    let image_val = image.map_or_else(|| "none".to_string(), ToString::to_string);
    let frontmatter = format!(
        "---\ntitle: {title}\nsummary: {summary}\ncover_image: {image}\nimage_prompt: {prompt}\narchived_utc: {archived_utc}\nfailure: {reason}\n---\n\n",
        title = quoted(&article.title),
        summary = quoted(article.digest()),
        image = quoted(&image_val),
        prompt = quoted(&article.image_prompt),
        archived_utc = quoted(archived_utc),
        reason = quoted(&reason.to_string()),
    );
    let body = converter.to_markdown(&article.content);
    format!(
        "{frontmatter}# {title}\n\n{body}\n\n## Original markup\n\n```html\n{markup}\n```\n",
        title = article.title.trim(),
        markup = article.content.trim_end(),
    )
}

/// Double-quoted scalar on one line. A JSON string literal is valid YAML, so
/// `: `, `#` and quotes inside values are escaped.
fn quoted(value: &str) -> String {
    let line = value.split_whitespace().collect::<Vec<_>>().join(" ");
    serde_json::to_string(&line).unwrap_or_else(|_| "\"\"".to_string())
}
