//! Dealership news articles.

pub mod article;

pub use article::{NewsArticle, NewsContent, NewsWithAuthor, newest_published_first};
