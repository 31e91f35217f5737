use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::AppConfig;
use crate::images::{is_valid_image_url, ImageCandidate, ImageProvider};

pub const PROVIDER_NAME: &str = "wikipedia";
const USER_AGENT: &str = "StudyBuddyAI/1.0 (Educational Project)";

pub struct WikipediaProvider {
  client: reqwest::Client,
  base_url: String,
}

impl WikipediaProvider {
  pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(USER_AGENT)
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
    })
  }

  pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
    Self::new(
      &config.wikipedia_base_url,
      Duration::from_secs(config.image_lookup_timeout_secs),
    )
  }

  async fn get_json(&self, url: &str) -> Option<Value> {
    let resp = self.client.get(url).send().await.ok()?;
    if !resp.status().is_success() {
      return None;
    }
    resp.json::<Value>().await.ok()
  }

  async fn summary_lookup(&self, title: &str) -> Vec<ImageCandidate> {
    let url = format!(
      "{}/api/rest_v1/page/summary/{}",
      self.base_url,
      urlencoding::encode(title)
    );
    match self.get_json(&url).await {
      Some(body) => summary_candidates(&body),
      None => Vec::new(),
    }
  }
}

#[async_trait]
impl ImageProvider for WikipediaProvider {
  fn name(&self) -> &'static str {
    PROVIDER_NAME
  }

  // Only a variant with at least one usable URL ends the walk.
  async fn lookup_image(&self, phrase: &str) -> Vec<ImageCandidate> {
    for variant in phrase_variants(phrase) {
      let candidates = self.summary_lookup(&variant).await;
      if candidates.iter().any(is_valid_image_url) {
        return candidates;
      }
    }
    Vec::new()
  }

  async fn search_titles(&self, query: &str, limit: usize) -> Vec<String> {
    if query.trim().is_empty() || limit == 0 {
      return Vec::new();
    }
    let url = format!(
      "{}/w/api.php?action=query&format=json&list=search&srsearch={}&srlimit={}",
      self.base_url,
      urlencoding::encode(query.trim()),
      limit
    );
    let Some(body) = self.get_json(&url).await else {
      return Vec::new();
    };
    body["query"]["search"]
      .as_array()
      .map(|items| {
        items
          .iter()
          .filter_map(|item| item["title"].as_str())
          .map(str::to_string)
          .take(limit)
          .collect()
      })
      .unwrap_or_default()
  }
}

pub fn phrase_variants(phrase: &str) -> Vec<String> {
  let base = phrase.trim();
  if base.is_empty() {
    return Vec::new();
  }
  let titled = title_case(base);
  let candidates = [
    base.to_string(),
    base.replace(' ', "_"),
    titled.clone(),
    titled.replace(' ', "_"),
  ];

  let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
  for candidate in candidates {
    if !variants.contains(&candidate) {
      variants.push(candidate);
    }
  }
  variants
}

pub fn title_case(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut prev_alpha = false;
  for c in text.chars() {
    if c.is_alphabetic() {
      if prev_alpha {
        out.extend(c.to_lowercase());
      } else {
        out.extend(c.to_uppercase());
      }
      prev_alpha = true;
    } else {
      out.push(c);
      prev_alpha = false;
    }
  }
  out
}

/// `thumbnail.source` then `originalimage.source`, whatever their JSON type,
/// skipping absent or null ones. Disambiguation pages yield nothing.
pub fn summary_candidates(body: &Value) -> Vec<ImageCandidate> {
  if body["type"].as_str() == Some("disambiguation") {
    return Vec::new();
  }
  ["thumbnail", "originalimage"]
    .iter()
    .filter_map(|field| body.get(field).and_then(|f| f.get("source")))
    .filter(|source| !source.is_null())
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::extract::{Path, State};
  use axum::http::{HeaderMap, StatusCode};
  use axum::response::{IntoResponse, Response};
  use axum::routing::get;
  use axum::{Json, Router};
  use serde_json::json;

  use super::*;
  use crate::images::{resolve_images, ResolverSettings};

  type Seen = Arc<Mutex<Vec<String>>>;

  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
  }

  async fn summary(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Path(title): Path<String>,
  ) -> Response {
    let agent = headers
      .get("user-agent")
      .and_then(|v| v.to_str().ok())
      .unwrap_or("");
    if !agent.starts_with("StudyBuddyAI/") {
      return StatusCode::FORBIDDEN.into_response();
    }
    seen.lock().unwrap().push(title.clone());
    match title.as_str() {
      "Albert Einstein" => Json(json!({
        "type": "standard",
        "thumbnail": { "source": "https://upload.example/thumb.jpg" },
        "originalimage": { "source": "https://upload.example/orig.jpg" }
      }))
      .into_response(),
      "marie curie" => Json(json!({ "thumbnail": { "source": "" } })).into_response(),
      "marie_curie" => Json(json!({ "thumbnail": { "source": 42 } })).into_response(),
      "Marie_Curie" => Json(json!({
        "thumbnail": { "source": "https://upload.example/curie.jpg" }
      }))
      .into_response(),
      "Isaac_Newton" => Json(json!({
        "thumbnail": { "source": "https://upload.example/newton.jpg" }
      }))
      .into_response(),
      "Mercury" => Json(json!({ "type": "disambiguation", "thumbnail": { "source": "https://x" } }))
        .into_response(),
      "garbled" => (StatusCode::OK, "<html>not json</html>").into_response(),
      "slow" => {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Json(json!({ "thumbnail": { "source": "https://late" } })).into_response()
      }
      _ => StatusCode::NOT_FOUND.into_response(),
    }
  }

  async fn search() -> Json<Value> {
    Json(json!({
      "query": {
        "search": [ { "title": "Photosynthesis" }, { "title": 12 }, { "title": "Chlorophyll" } ]
      }
    }))
  }

  async fn fake_wiki() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
      .route("/api/rest_v1/page/summary/:title", get(summary))
      .route("/w/api.php", get(search))
      .with_state(seen.clone());
    (serve(app).await, seen)
  }

  fn provider(base: &str) -> WikipediaProvider {
    WikipediaProvider::new(base, Duration::from_millis(500)).unwrap()
  }

  #[test]
  fn variants_cover_case_and_spacing() {
    assert_eq!(
      phrase_variants(" isaac newton "),
      vec!["isaac newton", "isaac_newton", "Isaac Newton", "Isaac_Newton"]
    );
    assert_eq!(phrase_variants("Newton"), vec!["Newton"]);
    assert!(phrase_variants("  ").is_empty());
  }

  #[test]
  fn title_case_resets_after_non_letters() {
    assert_eq!(title_case("DNA double-helix"), "Dna Double-Helix");
    assert_eq!(title_case("world war 2"), "World War 2");
  }

  #[test]
  fn candidates_keep_raw_values_and_skip_nulls() {
    let body = json!({
      "thumbnail": { "source": 17 },
      "originalimage": { "source": null }
    });
    assert_eq!(summary_candidates(&body), vec![json!(17)]);
    assert!(summary_candidates(&json!({ "thumbnail": "https://flat" })).is_empty());
    assert!(summary_candidates(&json!([])).is_empty());
  }

  #[tokio::test]
  async fn first_matching_variant_stops_the_lookup() {
    let (base, seen) = fake_wiki().await;
    let found = provider(&base).lookup_image("Albert Einstein").await;
    assert_eq!(
      found,
      vec![json!("https://upload.example/thumb.jpg"), json!("https://upload.example/orig.jpg")]
    );
    assert_eq!(seen.lock().unwrap().clone(), vec!["Albert Einstein"]);
  }

  #[tokio::test]
  async fn later_variant_is_tried_after_misses() {
    let (base, seen) = fake_wiki().await;
    let found = provider(&base).lookup_image("isaac newton").await;
    assert_eq!(found, vec![json!("https://upload.example/newton.jpg")]);
    assert_eq!(
      seen.lock().unwrap().clone(),
      vec!["isaac newton", "isaac_newton", "Isaac Newton", "Isaac_Newton"]
    );
  }

  #[tokio::test]
  async fn unusable_sources_do_not_stop_the_lookup() {
    let (base, seen) = fake_wiki().await;
    let p = provider(&base);
    let found = p.lookup_image("marie curie").await;
    assert_eq!(found, vec![json!("https://upload.example/curie.jpg")]);
    assert_eq!(
      seen.lock().unwrap().clone(),
      vec!["marie curie", "marie_curie", "Marie Curie", "Marie_Curie"]
    );

    let resolved = resolve_images(&p, "marie curie", ResolverSettings::default()).await;
    assert_eq!(resolved.urls, vec!["https://upload.example/curie.jpg"]);
    assert_eq!(resolved.provider, Some(PROVIDER_NAME));
  }

  #[tokio::test]
  async fn failures_become_empty_results() {
    let (base, _) = fake_wiki().await;
    let p = provider(&base);
    assert!(p.lookup_image("Mercury").await.is_empty());
    assert!(p.lookup_image("garbled").await.is_empty());
    assert!(p.lookup_image("slow").await.is_empty());
    assert!(p.lookup_image("nothing here").await.is_empty());
  }

  #[tokio::test]
  async fn unreachable_host_is_empty_not_an_error() {
    let p = provider("http://127.0.0.1:1");
    assert!(p.lookup_image("anything").await.is_empty());
    assert!(p.search_titles("anything", 3).await.is_empty());
  }

  #[tokio::test]
  async fn search_returns_string_titles_only() {
    let (base, _) = fake_wiki().await;
    let titles = provider(&base).search_titles("how plants make food", 5).await;
    assert_eq!(titles, vec!["Photosynthesis", "Chlorophyll"]);
  }
}
