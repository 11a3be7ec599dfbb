use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{DomainError, DomainResult, NewsId, UserId};

pub const TITLE_MAX_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub news_id: NewsId,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewsArticle {
    /// New articles start unpublished.
    pub fn draft(content: NewsContent, author_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            news_id: NewsId::new(),
            title: content.title,
            content: content.content,
            author_id: Some(author_id),
            published_at: None,
            is_published: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn edit(&mut self, content: NewsContent, now: DateTime<Utc>) {
        self.title = content.title;
        self.content = content.content;
        self.updated_at = now;
    }

    pub fn publish(&mut self, now: DateTime<Utc>) {
        self.is_published = true;
        self.published_at = Some(now);
        self.updated_at = now;
    }

    pub fn unpublish(&mut self, now: DateTime<Utc>) {
        self.is_published = false;
        self.published_at = None;
        self.updated_at = now;
    }
}

/// Title and body for a create or edit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewsContent {
    pub title: String,
    pub content: String,
}

impl NewsContent {
    pub fn validate(self) -> DomainResult<NewsContent> {
        let title = self.title.trim().to_string();
        let len = title.chars().count();
        if len == 0 || len > TITLE_MAX_LEN {
            return Err(DomainError::validation(format!(
                "title must be between 1 and {TITLE_MAX_LEN} characters"
            )));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::validation("content must not be empty"));
        }
        Ok(NewsContent {
            title,
            content: self.content,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsWithAuthor {
    #[serde(flatten)]
    pub article: NewsArticle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

/// Feed order: by `published_at` descending with unpublished last, then by
/// `created_at` descending.
pub fn newest_published_first(a: &NewsArticle, b: &NewsArticle) -> Ordering {
    let by_published = match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_published.then_with(|| b.created_at.cmp(&a.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn content(title: &str, body: &str) -> NewsContent {
        NewsContent {
            title: title.into(),
            content: body.into(),
        }
    }

    #[test]
    fn validate_checks_title_and_content() {
        assert!(content("Spring sale", "Big discounts").validate().is_ok());
        assert!(content("  ", "x").validate().is_err());
        assert!(content(&"t".repeat(TITLE_MAX_LEN + 1), "x").validate().is_err());
        assert!(content(&"t".repeat(TITLE_MAX_LEN), "x").validate().is_ok());
        assert!(matches!(content("t", " \n").validate(), Err(DomainError::Validation(m)) if m.contains("content")));
    }

    #[test]
    fn feed_entry_flattens_article_with_author_name() {
        let article = NewsArticle::draft(content("Spring sale", "Big discounts"), UserId::new(), Utc::now());
        let entry = NewsWithAuthor {
            article,
            author_name: Some("Anna Petrova".into()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["title"], "Spring sale");
        assert_eq!(json["is_published"], false);
        assert_eq!(json["author_name"], "Anna Petrova");
        assert!(json.get("published_at").is_none());
        assert!(json.get("article").is_none());
    }

    #[test]
    fn publish_and_unpublish_manage_timestamp() {
        let now = Utc::now();
        let mut a = NewsArticle::draft(content("t", "c"), UserId::new(), now);
        assert!(!a.is_published);
        assert_eq!(a.published_at, None);

        a.publish(now + Duration::minutes(1));
        assert!(a.is_published);
        assert_eq!(a.published_at, Some(now + Duration::minutes(1)));

        a.unpublish(now + Duration::minutes(2));
        assert!(!a.is_published);
        assert_eq!(a.published_at, None);
    }

    #[test]
    fn feed_order_puts_latest_published_first_and_drafts_last() {
        let now = Utc::now();
        let mut old = NewsArticle::draft(content("old", "c"), UserId::new(), now);
        old.publish(now);
        let mut new = NewsArticle::draft(content("new", "c"), UserId::new(), now);
        new.publish(now + Duration::hours(1));
        let draft_recent = NewsArticle::draft(content("d2", "c"), UserId::new(), now + Duration::hours(3));
        let draft_older = NewsArticle::draft(content("d1", "c"), UserId::new(), now + Duration::hours(2));

        let mut feed = vec![draft_older, old, draft_recent, new];
        feed.sort_by(newest_published_first);
        let titles: Vec<_> = feed.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "d2", "d1"]);
    }
}
