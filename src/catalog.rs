//! Scraping client for the remote model catalog.
//!
//! The catalog has no JSON API; the library index and per-model tag pages
//! are HTML. Empty results and transport errors are distinct conditions:
//! the caller decides what an empty page means.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use scraper::{ElementRef, Html, Selector};

use crate::format::collapse_whitespace;
use crate::model::CatalogModel;

pub const DEFAULT_CATALOG_URL: &str = "https://ollama.com";

#[derive(Clone)]
pub struct CatalogClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("modelman")
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// All installable models on the library index, in page order.
    pub fn fetch_models(&self) -> Result<Vec<CatalogModel>> {
        let url = format!("{}/library", self.base_url);
        let body = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("fetch {url}"))?
            .error_for_status()
            .context("catalog status")?
            .text()
            .context("read catalog body")?;
        parse_library(&body)
    }

    /// Tag strings for one base model name, in page order.
    pub fn fetch_tags(&self, name: &str) -> Result<Vec<String>> {
        let url = format!("{}/library/{}/tags", self.base_url, name);
        let body = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("fetch {url}"))?
            .error_for_status()
            .with_context(|| format!("tags status for {name}"))?
            .text()
            .context("read tags body")?;
        parse_tags(&body, name)
    }
}

fn sel(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("css selector `{css}`: {e}"))
}

fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn first_text(el: ElementRef<'_>, selector: &Selector) -> String {
    el.select(selector).next().map(text_of).unwrap_or_default()
}

pub fn parse_library(html: &str) -> Result<Vec<CatalogModel>> {
    let doc = Html::parse_document(html);

    let entry_sel = sel("#repo ul li")?;
    let name_sel = sel("h2 span")?;
    let desc_sel = sel("p")?;
    let pulls_sel = sel("span[x-test-pull-count]")?;
    let tag_count_sel = sel("span[x-test-tag-count]")?;
    let updated_sel = sel("span[x-test-updated]")?;
    let badge_sel = sel("span[x-test-capability], span[x-test-size]")?;

    let mut models = Vec::new();
    for entry in doc.select(&entry_sel) {
        let name = first_text(entry, &name_sel);
        if name.is_empty() {
            continue;
        }
        models.push(CatalogModel {
            name,
            description: first_text(entry, &desc_sel),
            pulls: first_text(entry, &pulls_sel),
            tag_count: first_text(entry, &tag_count_sel),
            updated: first_text(entry, &updated_sel),
            badges: entry.select(&badge_sel).map(text_of).collect(),
        });
    }
    Ok(models)
}

pub fn parse_tags(html: &str, name: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let anchor_sel = sel("a[href]")?;
    let prefix = format!("/library/{name}:");

    let mut tags = Vec::new();
    for anchor in doc.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(tag) = href.strip_prefix(prefix.as_str()) else {
            continue;
        };
        let tag = tag.to_string();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY_FIXTURE: &str = r#"
        <html><body><div id="repo"><ul>
          <li>
            <a href="/library/llama3">
              <div>
                <h2><div><span> llama3 </span></div></h2>
                <div>
                  <span x-test-size>8b</span>
                  <span x-test-size>70b</span>
                </div>
                <p>
                  Meta Llama 3: the most capable openly
                  available LLM to date
                </p>
              </div>
              <p>
                <span><span x-test-pull-count>6.6M</span> Pulls</span>
                <span><span x-test-tag-count>68</span> Tags</span>
                <span>Updated <span x-test-updated>3 months ago</span></span>
              </p>
            </a>
          </li>
          <li>
            <a href="/library/llava">
              <div>
                <h2><div><span>llava</span></div></h2>
                <div><span x-test-capability>vision</span></div>
                <p>Multimodal model combining a vision encoder and Vicuna</p>
              </div>
              <p>
                <span><span x-test-pull-count>1.2M</span> Pulls</span>
                <span><span x-test-tag-count>98</span> Tags</span>
                <span>Updated <span x-test-updated>8 months ago</span></span>
              </p>
            </a>
          </li>
        </ul></div></body></html>
    "#;

    #[test]
    fn library_entries_parse() {
        let models = parse_library(LIBRARY_FIXTURE).unwrap();
        assert_eq!(models.len(), 2);

        assert_eq!(models[0].name, "llama3");
        assert_eq!(
            models[0].description,
            "Meta Llama 3: the most capable openly available LLM to date"
        );
        assert_eq!(models[0].pulls, "6.6M");
        assert_eq!(models[0].tag_count, "68");
        assert_eq!(models[0].updated, "3 months ago");
        assert_eq!(models[0].badges, vec!["8b", "70b"]);

        assert_eq!(models[1].name, "llava");
        assert_eq!(models[1].badges, vec!["vision"]);
    }

    #[test]
    fn library_parse_of_unrelated_page_is_empty() {
        let models = parse_library("<html><body><p>nope</p></body></html>").unwrap();
        assert!(models.is_empty());
    }

    #[test]
    fn tags_parse_ordered_and_deduped() {
        let html = r#"
            <html><body>
              <a href="/library/llama3:latest">latest</a>
              <a href="/library/llama3:8b">8b</a>
              <a href="/library/llama3:latest">latest again</a>
              <a href="/library/other:1b">other model</a>
              <a href="/blog/post">blog</a>
            </body></html>
        "#;
        let tags = parse_tags(html, "llama3").unwrap();
        assert_eq!(tags, vec!["latest", "8b"]);
    }

    #[test]
    fn tags_of_unknown_model_are_empty() {
        let tags = parse_tags("<html></html>", "missing").unwrap();
        assert!(tags.is_empty());
    }
}
