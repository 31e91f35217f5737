use std::sync::Arc;

use crate::config::AppConfig;
use crate::images::{resolve_images, ImageProvider, ResolverSettings};
use crate::intent::detect_image_request;
use crate::llm::{CompletionRequest, LanguageModel, LlmError};
use crate::logger::Logger;
use crate::models::{
  ChatMessage, Conversation, ExplainNotesRequest, Explanation, ImageData, UiOptions,
};
use crate::ocr::{decode_upload, OcrEngine};
use crate::{prompts, validate};

pub const NO_IMAGES_NOTE: &str =
  "I couldn't find images for your request. Here is a text explanation instead.";
pub const NO_TEXT_FOUND: &str =
  "I couldn't detect any readable text in the image. Please try a clearer photo.";

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
  #[error("{0}")]
  Invalid(String),
  #[error("{}", NO_TEXT_FOUND)]
  NoText,
  #[error("Could not read the image: {0}")]
  Ocr(anyhow::Error),
  #[error("{}", .0.user_message())]
  Llm(#[from] LlmError),
}

pub struct Tutor {
  llm: Arc<dyn LanguageModel>,
  images: Arc<dyn ImageProvider>,
  ocr: Arc<dyn OcrEngine>,
  logger: Arc<Logger>,
  resolver: ResolverSettings,
  context_messages: usize,
}

impl Tutor {
  pub fn new(
    config: &AppConfig,
    llm: Arc<dyn LanguageModel>,
    images: Arc<dyn ImageProvider>,
    ocr: Arc<dyn OcrEngine>,
    logger: Arc<Logger>,
  ) -> Self {
    Self {
      llm,
      images,
      ocr,
      logger,
      resolver: ResolverSettings::from(config),
      context_messages: config.context_messages,
    }
  }

  pub async fn handle_turn(
    &self,
    mut history: Conversation,
    user_text: &str,
    options: UiOptions,
  ) -> Conversation {
    let context = self.context_window(&history);
    history.push(ChatMessage::user(user_text));

    let reply = match detect_image_request(user_text) {
      Some(phrase) => self.image_reply(&phrase, user_text, options, context).await,
      None => ChatMessage::assistant(self.answer(user_text, options, context).await),
    };
    history.push(reply);
    history
  }

  fn context_window(&self, history: &Conversation) -> Vec<ChatMessage> {
    let messages = history.messages();
    let start = messages.len().saturating_sub(self.context_messages);
    messages[start..].to_vec()
  }

  async fn image_reply(
    &self,
    phrase: &str,
    user_text: &str,
    options: UiOptions,
    context: Vec<ChatMessage>,
  ) -> ChatMessage {
    self.logger.info(&format!("image request for \"{phrase}\""));
    let resolved = resolve_images(self.images.as_ref(), phrase, self.resolver).await;

    if resolved.is_empty() {
      self.logger.info(&format!("no images for \"{phrase}\", answering in text"));
      let answer = self.answer(user_text, options, context).await;
      return ChatMessage::assistant(format!("{NO_IMAGES_NOTE}\n\n{answer}"));
    }
    let provider = resolved.provider.unwrap_or_else(|| self.images.name());
    self
      .logger
      .info(&format!("{} image(s) for \"{phrase}\" from {provider}", resolved.urls.len()));

    let request = CompletionRequest::new(prompts::image_caption(phrase)).with_history(context);
    let caption = match self.llm.complete(&request).await {
      Ok(text) => text,
      Err(err) => {
        self.logger.warn(&format!("caption failed: {err}"));
        format!("Here are images related to {phrase}.")
      }
    };

    let content = format!("{caption}\n\n*Images from {}*", capitalize(provider));
    ChatMessage::assistant_with_images(content, resolved.urls)
  }

  async fn answer(&self, user_text: &str, options: UiOptions, context: Vec<ChatMessage>) -> String {
    let request =
      CompletionRequest::new(prompts::text_tutor(user_text, options)).with_history(context);
    match self.llm.complete(&request).await {
      Ok(text) => text,
      Err(err) => {
        self.logger.warn(&format!("language model failed: {err}"));
        err.user_message()
      }
    }
  }

  pub async fn solve_image(
    &self,
    upload: &ImageData,
    is_question: bool,
  ) -> Result<Explanation, PanelError> {
    let text = self.read_image(upload).await?;
    let explanation = self.explain(prompts::image_solver(&text, is_question)).await?;
    Ok(Explanation {
      extracted_text: Some(text),
      explanation,
    })
  }

  pub async fn explain_notes(&self, req: &ExplainNotesRequest) -> Result<Explanation, PanelError> {
    if let Some(notes) = req.text.as_deref().filter(|t| !t.trim().is_empty()) {
      validate::text_input(notes, "notes").map_err(PanelError::Invalid)?;
      let explanation = self.explain(prompts::explain_notes_text(notes)).await?;
      return Ok(Explanation {
        extracted_text: None,
        explanation,
      });
    }

    let Some(upload) = req.image.as_ref() else {
      return Err(PanelError::Invalid(
        "Please paste your notes or upload an image of them.".to_string(),
      ));
    };
    let text = self.read_image(upload).await?;
    let explanation = self.explain(prompts::explain_notes_image(&text)).await?;
    Ok(Explanation {
      extracted_text: Some(text),
      explanation,
    })
  }

  async fn read_image(&self, upload: &ImageData) -> Result<String, PanelError> {
    let bytes = decode_upload(upload).map_err(PanelError::Invalid)?;
    let text = self.ocr.extract_text(&bytes).await.map_err(|err| {
      self.logger.warn(&format!("ocr failed: {err:#}"));
      PanelError::Ocr(err)
    })?;
    if text.trim().is_empty() {
      return Err(PanelError::NoText);
    }
    Ok(text)
  }

  async fn explain(&self, prompt: String) -> Result<String, PanelError> {
    self.llm.complete(&CompletionRequest::new(prompt)).await.map_err(|err| {
      self.logger.warn(&format!("language model failed: {err}"));
      PanelError::Llm(err)
    })
  }
}

fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
