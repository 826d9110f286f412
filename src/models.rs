use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BlogError, Result};

/// Average reading speed used for the read-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// Sections shorter than this with no sentence punctuation render as headings.
const HEADING_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(rename = "category", default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub content: String,
}

// json-server hands out numeric ids for seeded data and string ids for new records
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// Broad grouping of an article's primary category, used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Growth,
    Career,
    Regulation,
    General,
}

/// One blank-line-delimited block of article content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSection<'a> {
    Heading(&'a str),
    Quote(&'a str),
    Paragraph(&'a str),
}

impl Article {
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    pub fn category_kind(&self) -> CategoryKind {
        let category = self.primary_category().unwrap_or_default().to_lowercase();
        if category.contains("finance") || category.contains("tech") {
            CategoryKind::Growth
        } else if category.contains("career") {
            CategoryKind::Career
        } else if category.contains("regulation") {
            CategoryKind::Regulation
        } else {
            CategoryKind::General
        }
    }

    pub fn tag_label(&self) -> &'static str {
        let category = self.primary_category().unwrap_or_default().to_lowercase();
        if category.contains("finance") {
            "Featured"
        } else if category.contains("career") {
            "Study Tips"
        } else if category.contains("regulation") {
            "Taxation"
        } else {
            "Development"
        }
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }

    /// Publish date as "Jan 5, 2024", or the raw value when it does not parse.
    pub fn formatted_date(&self) -> String {
        match self.published_at() {
            Some(date) => date.format("%b %-d, %Y").to_string(),
            None => self.date.clone(),
        }
    }

    pub fn relative_time(&self) -> String {
        self.relative_time_at(Utc::now())
    }

    /// Human-friendly age of the article relative to `now` ("3 days ago").
    pub fn relative_time_at(&self, now: DateTime<Utc>) -> String {
        let Some(published) = self.published_at() else {
            return self.date.clone();
        };

        let elapsed = now.signed_duration_since(published);
        let hours = elapsed.num_hours();
        let days = elapsed.num_days();
        let weeks = days / 7;

        if days == 0 && hours < 24 {
            format!("{} hours ago", hours)
        } else if days == 1 {
            "1 day ago".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else if weeks == 1 {
            "1 week ago".to_string()
        } else if weeks < 4 {
            format!("{} weeks ago", weeks)
        } else {
            self.formatted_date()
        }
    }

    pub fn read_time_minutes(&self) -> usize {
        let words = self.content.split_whitespace().count().max(1);
        words.div_ceil(WORDS_PER_MINUTE)
    }

    pub fn sections(&self) -> Vec<ContentSection<'_>> {
        self.content
            .split("\n\n")
            .map(str::trim)
            .filter(|section| !section.is_empty())
            .map(|section| {
                if section.chars().count() < HEADING_MAX_CHARS && !section.contains('.') {
                    ContentSection::Heading(section)
                } else if section.starts_with('"') || section.starts_with('\u{201C}') {
                    ContentSection::Quote(section)
                } else {
                    ContentSection::Paragraph(section)
                }
            })
            .collect()
    }
}

/// Fields the author fills in; the id and publish date are not part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleInput {
    pub title: String,
    #[serde(rename = "category")]
    pub categories: Vec<String>,
    pub description: String,
    pub cover_image: String,
    pub content: String,
}

impl CreateArticleInput {
    /// Adds a category tag, normalized to upper case. Returns false for blank
    /// or duplicate tags.
    pub fn add_category(&mut self, raw: &str) -> bool {
        let category = raw.trim().to_uppercase();
        if category.is_empty() || self.categories.contains(&category) {
            return false;
        }
        self.categories.push(category);
        true
    }

    pub fn remove_category(&mut self, category: &str) {
        self.categories.retain(|existing| existing != category);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Checks the required fields before anything is sent to the backend.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        if !missing.is_empty() {
            return Err(BlogError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if self.categories.is_empty() {
            return Err(BlogError::Validation(
                "at least one category is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn article_with(date: &str, content: &str) -> Article {
        Article {
            id: "1".to_string(),
            title: "A".to_string(),
            categories: vec!["FINANCE".to_string()],
            description: "D".to_string(),
            date: date.to_string(),
            cover_image: String::new(),
            content: content.to_string(),
        }
    }

    #[test]
    fn deserializes_numeric_id_and_missing_cover_image() {
        let json = r#"{"id":7,"title":"T","category":["TECH"],"description":"D","date":"2024-01-05T10:00:00.000Z","content":"C"}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.id, "7");
        assert_eq!(article.cover_image, "");
        assert_eq!(article.primary_category(), Some("TECH"));
    }

    #[test]
    fn deserializes_string_id() {
        let json = r#"{"id":"a1b2","title":"T","category":["CAREER"],"description":"D","date":"","coverImage":"https://x/y.png","content":"C"}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.id, "a1b2");
        assert_eq!(article.cover_image, "https://x/y.png");
    }

    #[test]
    fn category_kind_and_tag_follow_primary_category() {
        let mut article = article_with("", "");
        assert_eq!(article.category_kind(), CategoryKind::Growth);
        assert_eq!(article.tag_label(), "Featured");

        article.categories = vec!["TECH".to_string(), "FINANCE".to_string()];
        assert_eq!(article.category_kind(), CategoryKind::Growth);
        assert_eq!(article.tag_label(), "Development");

        article.categories = vec!["CAREER".to_string()];
        assert_eq!(article.category_kind(), CategoryKind::Career);
        assert_eq!(article.tag_label(), "Study Tips");

        article.categories = vec!["REGULATIONS".to_string()];
        assert_eq!(article.category_kind(), CategoryKind::Regulation);
        assert_eq!(article.tag_label(), "Taxation");

        article.categories.clear();
        assert_eq!(article.category_kind(), CategoryKind::General);
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let at = |date: &str| article_with(date, "").relative_time_at(now);

        assert_eq!(at("2024-03-01T07:00:00Z"), "5 hours ago");
        assert_eq!(at("2024-02-29T10:00:00Z"), "1 day ago");
        assert_eq!(at("2024-02-27T12:00:00Z"), "3 days ago");
        assert_eq!(at("2024-02-22T12:00:00Z"), "1 week ago");
        assert_eq!(at("2024-02-08T12:00:00Z"), "3 weeks ago");
        assert_eq!(at("2024-01-05T12:00:00Z"), "Jan 5, 2024");
        assert_eq!(at("not a date"), "not a date");
    }

    #[test]
    fn read_time_rounds_up_with_minimum_of_one() {
        assert_eq!(article_with("", "").read_time_minutes(), 1);
        assert_eq!(article_with("", "word").read_time_minutes(), 1);

        let long = vec!["word"; 401].join(" ");
        assert_eq!(article_with("", &long).read_time_minutes(), 3);
    }

    #[test]
    fn sections_are_classified() {
        let content = "Introduction\n\nMarkets moved sharply this week. Analysts were surprised.\n\n\"Quoted words are here.\"\n\n\n\n\u{201C}Curly quotes too.\u{201D}";
        let article = article_with("", content);
        assert_eq!(
            article.sections(),
            vec![
                ContentSection::Heading("Introduction"),
                ContentSection::Paragraph("Markets moved sharply this week. Analysts were surprised."),
                ContentSection::Quote("\"Quoted words are here.\""),
                ContentSection::Quote("\u{201C}Curly quotes too.\u{201D}"),
            ]
        );
    }

    #[test]
    fn categories_are_normalized_and_deduplicated() {
        let mut input = CreateArticleInput::default();
        assert!(input.add_category("  tech "));
        assert!(!input.add_category("TECH"));
        assert!(!input.add_category("   "));
        assert!(input.add_category("finance"));
        assert_eq!(input.categories, vec!["TECH", "FINANCE"]);

        input.remove_category("TECH");
        assert_eq!(input.categories, vec!["FINANCE"]);

        input.reset();
        assert_eq!(input, CreateArticleInput::default());
    }

    #[test]
    fn validate_requires_fields_and_a_category() {
        let mut input = CreateArticleInput {
            title: "T".to_string(),
            categories: Vec::new(),
            description: "D".to_string(),
            cover_image: String::new(),
            content: "C".to_string(),
        };
        assert!(matches!(input.validate(), Err(BlogError::Validation(_))));

        input.categories.push("TECH".to_string());
        assert_eq!(input.validate(), Ok(()));

        input.title = "  ".to_string();
        let err = input.validate().unwrap_err();
        assert_eq!(
            err,
            BlogError::Validation("missing required fields: title".to_string())
        );
    }

    #[test]
    fn create_input_serializes_with_wire_names() {
        let input = CreateArticleInput {
            title: "T".to_string(),
            categories: vec!["TECH".to_string()],
            description: "D".to_string(),
            cover_image: "img".to_string(),
            content: "C".to_string(),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["category"][0], "TECH");
        assert_eq!(value["coverImage"], "img");
    }
}
