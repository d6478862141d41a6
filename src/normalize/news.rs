use serde::Serialize;
use serde_json::Value;

use super::fields::{items, opt_text, text};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<String>,
    pub image: Option<String>,
}

/// Headlines with a title. `source` may be a plain name or an object.
pub fn articles(raw: &Value) -> Vec<Article> {
    items(raw.get("articles"))
        .iter()
        .filter_map(|a| {
            let title = opt_text(a.get("title"))?;
            Some(Article {
                title,
                summary: opt_text(a.get("description"))
                    .or_else(|| opt_text(a.get("summary")))
                    .unwrap_or_default(),
                url: text(a.get("url"), ""),
                source: opt_text(a.pointer("/source/name"))
                    .or_else(|| opt_text(a.get("source")))
                    .unwrap_or_else(|| "Sports News".to_string()),
                published_at: opt_text(a.get("publishedAt")),
                image: opt_text(a.get("urlToImage")).or_else(|| opt_text(a.get("image"))),
            })
        })
        .collect()
}

/// Topic names; topics arrive as strings or `{ "name": .. }` objects.
pub fn topics(raw: &Value) -> Vec<String> {
    items(raw.get("topics"))
        .iter()
        .filter_map(|t| opt_text(Some(t)).or_else(|| opt_text(t.get("name"))))
        .collect()
}
