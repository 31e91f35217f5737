use async_trait::async_trait;
use serde_json::Value;

use crate::config::AppConfig;

/// Raw value handed back by a provider before validation. It may be a
/// string, a number, null, or anything else the upstream JSON contained.
pub type ImageCandidate = Value;

pub fn is_valid_image_url(value: &ImageCandidate) -> bool {
  value.as_str().is_some_and(|s| s.starts_with("http"))
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
  fn name(&self) -> &'static str;

  async fn lookup_image(&self, phrase: &str) -> Vec<ImageCandidate>;

  async fn search_titles(&self, _query: &str, _limit: usize) -> Vec<String> {
    Vec::new()
  }
}

#[derive(Clone, Copy, Debug)]
pub struct ResolverSettings {
  pub limit: usize,
  pub min_word_len: usize,
  pub search_titles: usize,
}

impl Default for ResolverSettings {
  fn default() -> Self {
    Self {
      limit: 3,
      min_word_len: 3,
      search_titles: 5,
    }
  }
}

impl From<&AppConfig> for ResolverSettings {
  fn from(config: &AppConfig) -> Self {
    Self {
      limit: config.image_limit,
      min_word_len: config.min_word_len,
      search_titles: config.search_fallback_titles,
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedImages {
  pub urls: Vec<String>,
  pub provider: Option<&'static str>,
}

impl ResolvedImages {
  pub fn is_empty(&self) -> bool {
    self.urls.is_empty()
  }
}

struct Accumulator {
  urls: Vec<String>,
  limit: usize,
}

impl Accumulator {
  fn full(&self) -> bool {
    self.urls.len() >= self.limit
  }

  fn extend(&mut self, candidates: Vec<ImageCandidate>) {
    for candidate in candidates {
      if self.full() {
        return;
      }
      if !is_valid_image_url(&candidate) {
        continue;
      }
      if let Value::String(url) = candidate {
        if !self.urls.contains(&url) {
          self.urls.push(url);
        }
      }
    }
  }
}

pub fn significant_words(phrase: &str, min_len: usize) -> Vec<String> {
  let mut words: Vec<String> = Vec::new();
  for raw in phrase.split_whitespace() {
    let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
    if word.chars().count() <= min_len {
      continue;
    }
    if words.iter().any(|w| w.eq_ignore_ascii_case(word)) {
      continue;
    }
    words.push(word.to_string());
  }
  words
}

/// Full phrase first, then each significant word, then (if the provider can
/// search) the titles its search returns. Stops as soon as `limit` distinct
/// valid URLs are collected. Attempts run one after another, never in parallel.
pub async fn resolve_images(
  provider: &dyn ImageProvider,
  phrase: &str,
  settings: ResolverSettings,
) -> ResolvedImages {
  let phrase = phrase.trim();
  let mut acc = Accumulator {
    urls: Vec::new(),
    limit: settings.limit,
  };
  if phrase.is_empty() || acc.full() {
    return ResolvedImages::default();
  }

  acc.extend(provider.lookup_image(phrase).await);

  if !acc.full() {
    for word in significant_words(phrase, settings.min_word_len) {
      if acc.full() {
        break;
      }
      if word == phrase {
        continue;
      }
      acc.extend(provider.lookup_image(&word).await);
    }
  }

  if !acc.full() && settings.search_titles > 0 {
    for title in provider.search_titles(phrase, settings.search_titles).await {
      if acc.full() {
        break;
      }
      acc.extend(provider.lookup_image(&title).await);
    }
  }

  let mut urls = acc.urls;
  urls.truncate(settings.limit);
  let provider = if urls.is_empty() { None } else { Some(provider.name()) };
  ResolvedImages { urls, provider }
}
