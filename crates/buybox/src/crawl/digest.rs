use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

use super::extract::{PageContent, TextBlock};

/// Renders crawled pages as one plain-text document for language models.
pub fn render_digest(
    base_url: &Url,
    version: &str,
    built_at: DateTime<Utc>,
    pages: &[PageContent],
) -> String {
    let mut out = String::new();
    let site = base_url.host_str().unwrap_or("site");

    let _ = writeln!(out, "# {site}");
    let _ = writeln!(
        out,
        "> Digest version {version}, built {}, {} page(s).",
        built_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        pages.len()
    );

    for page in pages {
        out.push('\n');
        let heading = page
            .title
            .clone()
            .unwrap_or_else(|| page.url.path().to_string());
        let _ = writeln!(out, "## {heading}");
        let _ = writeln!(out, "URL: {}", page.url);

        for block in &page.blocks {
            match block {
                // The page title already heads the section.
                TextBlock::Heading { level: 1, text } if Some(text) == page.title.as_ref() => {}
                TextBlock::Heading { level, text } => {
                    let depth = (*level).clamp(1, 5) as usize + 1;
                    let _ = writeln!(out, "\n{} {text}", "#".repeat(depth));
                }
                TextBlock::Paragraph(text) => {
                    let _ = writeln!(out, "\n{text}");
                }
                TextBlock::ListItem(text) => {
                    let _ = writeln!(out, "- {text}");
                }
            }
        }
    }

    out
}
