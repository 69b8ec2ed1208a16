pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}

/// Markup-to-markdown for archived drafts, so they read well in any editor.
#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl Converter for Html2MdConverter {
    fn to_markdown(&self, html: &str) -> String {
        let markdown = html2md::parse_html(html);
        let lines: Vec<&str> = markdown.lines().map(str::trim_end).collect();
        lines.join("\n").trim().to_string()
    }
}
