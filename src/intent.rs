use std::sync::OnceLock;

use regex::Regex;

const VERBS: [&str; 6] = ["show me", "give me", "display", "provide me", "send me", "show"];
const ARTICLES: [&str; 3] = ["an ", "a ", ""];
const NOUNS: [&str; 8] = [
  "image", "picture", "photo", "photograph", "images", "pictures", "photos", "photographs",
];
const FILLERS: [&str; 4] = ["of", "for", "about", "showing"];

fn triggers() -> &'static [String] {
  static TRIGGERS: OnceLock<Vec<String>> = OnceLock::new();
  TRIGGERS.get_or_init(|| {
    let mut all = Vec::new();
    for verb in VERBS {
      for article in ARTICLES {
        for noun in NOUNS {
          all.push(format!("{verb} {article}{noun} of"));
          all.push(format!("{verb} {article}{noun}"));
        }
      }
    }
    for noun in NOUNS {
      all.push(format!("{noun} of"));
    }
    all
  })
}

fn trailing_courtesy() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"(?i)[\s,]+(please|pls|thanks|thank you)[\s.!?]*$").expect("static regex")
  })
}

/// Returns the search phrase when `raw` asks for imagery, `None` otherwise.
/// Among matching triggers the earliest start wins, then the longest.
pub fn detect_image_request(raw: &str) -> Option<String> {
  let lowered = raw.to_ascii_lowercase();

  let mut best: Option<(usize, usize)> = None;
  for trigger in triggers() {
    let Some(start) = find_whole_words(&lowered, trigger) else {
      continue;
    };
    let end = start + trigger.len();
    best = match best {
      Some((s, e)) if s < start || (s == start && e >= end) => Some((s, e)),
      _ => Some((start, end)),
    };
  }

  let (_, end) = best?;
  Some(clean_phrase(&raw[end..]))
}

// First occurrence not glued to a letter or digit on either side.
fn find_whole_words(haystack: &str, needle: &str) -> Option<usize> {
  haystack.match_indices(needle).map(|(start, _)| start).find(|&start| {
    let end = start + needle.len();
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
  })
}

fn clean_phrase(rest: &str) -> String {
  let mut phrase = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ':').to_string();

  if let Some((first, tail)) = phrase.split_once(char::is_whitespace) {
    if FILLERS.iter().any(|f| first.eq_ignore_ascii_case(f)) {
      phrase = tail.trim_start().to_string();
    }
  }

  let phrase = trailing_courtesy().replace(&phrase, "");
  phrase
    .trim_end_matches(['?', '!', '.'])
    .trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_trigger_and_trims() {
    assert_eq!(
      detect_image_request("show me an image of Isaac Newton").as_deref(),
      Some("Isaac Newton")
    );
  }

  #[test]
  fn plain_question_is_not_an_image_request() {
    assert_eq!(detect_image_request("what is photosynthesis"), None);
    assert_eq!(detect_image_request(""), None);
  }

  #[test]
  fn bare_trigger_matches_anywhere() {
    assert_eq!(
      detect_image_request("Can I get a picture of the Eiffel Tower?").as_deref(),
      Some("the Eiffel Tower")
    );
    assert_eq!(
      detect_image_request("image of Albert Einstein").as_deref(),
      Some("Albert Einstein")
    );
  }

  #[test]
  fn earliest_then_longest_trigger_wins() {
    // "show me a photo of" and "photo of" both match; the earlier start wins.
    assert_eq!(
      detect_image_request("SHOW ME A PHOTO OF Marie Curie").as_deref(),
      Some("Marie Curie")
    );
    // trigger without "of" still drops a leading filler word
    assert_eq!(
      detect_image_request("display pictures about volcanoes").as_deref(),
      Some("volcanoes")
    );
  }

  #[test]
  fn courtesy_words_and_quotes_are_removed() {
    assert_eq!(
      detect_image_request("send me a image of \"black holes\" please").as_deref(),
      Some("black holes")
    );
    assert_eq!(
      detect_image_request("photo of mitochondria, thank you!").as_deref(),
      Some("mitochondria")
    );
  }

  #[test]
  fn triggers_never_split_a_word() {
    assert_eq!(
      detect_image_request("show me a photograph of a cat").as_deref(),
      Some("a cat")
    );
    assert_eq!(detect_image_request("show me imagery of Mars"), None);
    assert_eq!(detect_image_request("give me a pictured timeline of WW2"), None);
    assert_eq!(detect_image_request("what does a telephoto of lens do"), None);
    assert_eq!(
      detect_image_request("my photos of Rome: show me a picture of the Colosseum").as_deref(),
      Some("Rome: show me a picture of the Colosseum")
    );
  }

  #[test]
  fn trigger_without_subject_yields_empty_phrase() {
    assert_eq!(detect_image_request("show me a picture").as_deref(), Some(""));
  }

  #[test]
  fn keeps_non_ascii_phrase_intact() {
    assert_eq!(
      detect_image_request("Picture of Érdős Pál").as_deref(),
      Some("Érdős Pál")
    );
  }
}
