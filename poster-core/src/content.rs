//! Text content bound from the external publicity post record.

use serde::{Deserialize, Serialize};

use crate::element::ElementKey;
use crate::schema::PosterFields;

/// Base content fields of a publicity post.
///
/// These are edited as plain text outside the layout editor; the editor only
/// reads them to fill its text blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostContent {
    /// Headline.
    pub title: String,
    /// Body copy.
    pub content: String,
    /// Date line as written on the post.
    pub date: String,
    /// Issue line as written on the post.
    pub issue: String,
}

impl PostContent {
    /// Text shown in a text block.
    ///
    /// The poster's own `posterDate`/`issueNo` fields win over the post's
    /// date and issue lines when they are set. Image keys have no text.
    #[must_use]
    pub fn text_for(&self, key: ElementKey, fields: &PosterFields) -> Option<String> {
        let text = match key {
            ElementKey::Title => self.title.clone(),
            ElementKey::Content => self.content.clone(),
            ElementKey::Date => pick(&fields.poster_date, &self.date),
            ElementKey::Issue => pick(&fields.issue_no, &self.issue),
            _ => return None,
        };
        Some(text)
    }
}

fn pick(preferred: &str, fallback: &str) -> String {
    if preferred.trim().is_empty() {
        fallback.to_string()
    } else {
        preferred.to_string()
    }
}
