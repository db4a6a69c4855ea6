//! Article download and metadata extraction.

use std::collections::HashMap;

use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::services::http::{HttpSettings, get_ok};

const MIN_PARAGRAPH_CHARS: usize = 20;
const MAX_KEYWORDS: usize = 10;

#[rustfmt::skip]
const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "been", "before", "being", "between", "both", "could",
    "does", "doing", "down", "during", "each", "from", "further", "have", "having", "here",
    "into", "just", "more", "most", "much", "must", "only", "other", "over", "said", "same",
    "says", "should", "some", "such", "than", "that", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "under", "until", "very", "were", "what",
    "when", "where", "which", "while", "will", "with", "would", "your", "year", "years",
];

/// Metadata and body text of one news article.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Article {
    pub url: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publish_date: Option<String>,
    pub top_image: Option<String>,
    pub images: Vec<String>,
    pub keywords: Vec<String>,
    pub text: String,
}

pub trait ArticleSource: Send + Sync {
    fn fetch(&self, url: &str) -> NewsreelResult<Article>;
}

#[derive(Clone, Debug)]
pub struct HttpArticleSource {
    client: Client,
}

impl HttpArticleSource {
    pub fn new(http: &HttpSettings) -> NewsreelResult<Self> {
        Ok(Self {
            client: http.build_client()?,
        })
    }
}

impl ArticleSource for HttpArticleSource {
    #[tracing::instrument(level = "debug", skip(self))]
    fn fetch(&self, url: &str) -> NewsreelResult<Article> {
        let base = Url::parse(url)
            .map_err(|e| NewsreelError::fetch(format!("invalid article url '{url}': {e}")))?;
        let what = format!("fetch article '{url}'");
        let html = get_ok(&self.client, url, &what)?
            .text()
            .map_err(|e| NewsreelError::from_reqwest(&what, &e))?;

        let article = parse_article(&html, &base);
        if article.text.trim().is_empty() {
            return Err(NewsreelError::fetch("no content found in the article"));
        }
        tracing::debug!(
            title = article.title.as_deref().unwrap_or(""),
            chars = article.text.len(),
            images = article.images.len(),
            "article extracted"
        );
        Ok(article)
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn clean(s: &str) -> Option<String> {
    let joined = s.split_whitespace().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

fn element_text(el: ElementRef<'_>) -> Option<String> {
    clean(&el.text().collect::<String>())
}

fn first_attr(doc: &Html, css: &str, attr: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .find_map(clean)
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel).find_map(element_text)
}

fn absolute(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(String::from)
}

fn push_unique(out: &mut Vec<String>, value: String) {
    if !out.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
        out.push(value);
    }
}

/// Extract article metadata and body text from an HTML page.
pub fn parse_article(html: &str, base: &Url) -> Article {
    let doc = Html::parse_document(html);

    let title = first_attr(&doc, r#"meta[property="og:title"]"#, "content")
        .or_else(|| first_text(&doc, "title"))
        .or_else(|| first_text(&doc, "h1"));

    let mut authors = Vec::new();
    for (css, attr) in [
        (r#"meta[name="author"]"#, Some("content")),
        (r#"meta[property="article:author"]"#, Some("content")),
        (r#"[rel="author"]"#, None),
    ] {
        let Some(sel) = selector(css) else { continue };
        for el in doc.select(&sel) {
            let value = match attr {
                Some(a) => el.value().attr(a).and_then(clean),
                None => element_text(el),
            };
            if let Some(v) = value.filter(|v| !v.starts_with("http")) {
                push_unique(&mut authors, v);
            }
        }
    }

    let publish_date = first_attr(&doc, r#"meta[property="article:published_time"]"#, "content")
        .or_else(|| first_attr(&doc, r#"meta[name="date"]"#, "content"))
        .or_else(|| first_attr(&doc, r#"meta[name="pubdate"]"#, "content"))
        .or_else(|| first_attr(&doc, "time[datetime]", "datetime"));

    let mut images = Vec::new();
    let meta_image = first_attr(&doc, r#"meta[property="og:image"]"#, "content")
        .or_else(|| first_attr(&doc, r#"meta[name="twitter:image"]"#, "content"))
        .and_then(|src| absolute(base, &src));
    if let Some(img) = &meta_image {
        push_unique(&mut images, img.clone());
    }
    if let Some(sel) = selector("img[src]") {
        for el in doc.select(&sel) {
            if let Some(src) = el.value().attr("src").and_then(|s| absolute(base, s)) {
                push_unique(&mut images, src);
            }
        }
    }
    let top_image = meta_image.or_else(|| {
        first_attr(&doc, "article img[src]", "src").and_then(|src| absolute(base, &src))
    });

    let text = body_text(&doc);

    let mut keywords: Vec<String> = first_attr(&doc, r#"meta[name="keywords"]"#, "content")
        .map(|k| {
            k.split(',')
                .filter_map(clean)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if keywords.is_empty() {
        keywords = frequent_terms(&text, MAX_KEYWORDS);
    }

    Article {
        url: base.to_string(),
        title,
        authors,
        publish_date,
        top_image,
        images,
        keywords,
        text,
    }
}

fn body_text(doc: &Html) -> String {
    let paragraphs = |css: &str| -> Vec<String> {
        let Some(sel) = selector(css) else {
            return Vec::new();
        };
        doc.select(&sel)
            .filter_map(element_text)
            .filter(|p| p.chars().count() >= MIN_PARAGRAPH_CHARS)
            .collect()
    };
    let mut found = paragraphs("article p");
    if found.is_empty() {
        found = paragraphs("p");
    }
    found.join("\n\n")
}

/// Most frequent non-stopword terms of `text`, ties broken by first occurrence.
pub fn frequent_terms(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let terms = text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 4 && !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !STOPWORDS.contains(&w.as_str()));
    for (pos, term) in terms.enumerate() {
        counts.entry(term).or_insert((0, pos)).0 += 1;
    }
    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
    ranked.into_iter().take(limit).map(|(t, _)| t).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/services/article.rs"]
mod tests;
