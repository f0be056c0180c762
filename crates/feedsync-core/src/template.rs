//! Rendering of canonical target filenames from per-dataset templates.

use chrono::NaiveDateTime;
use feedsync_config::TemplateItem;

use crate::error::{SyncError, SyncResult};

/// Render the target filename for a source entry.
///
/// Items are rendered in order: `Literal` copies a byte range of the source
/// name verbatim, `Strftime` formats the resolved instant. This supports
/// target names that mix a timestamp-derived prefix with a source-derived
/// suffix such as an enumeration or variant code.
pub fn render(name: &str, timestamp: NaiveDateTime, template: &[TemplateItem]) -> SyncResult<String> {
    let mut rendered = String::new();
    for item in template {
        match item {
            TemplateItem::Literal(range) => {
                let part = range.slice(name).ok_or_else(|| SyncError::Template {
                    name: name.to_string(),
                    reason: "literal_out_of_bounds",
                })?;
                rendered.push_str(part);
            }
            TemplateItem::Strftime(pattern) => {
                rendered.push_str(&timestamp.format(pattern).to_string());
            }
        }
    }
    Ok(rendered)
}
