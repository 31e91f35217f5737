use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
  pub role: Role,
  pub content: String,
  #[serde(default)]
  pub images: Vec<String>,
}

impl ChatMessage {
  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role: Role::User,
      content: content.into(),
      images: Vec::new(),
    }
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self {
      role: Role::Assistant,
      content: content.into(),
      images: Vec::new(),
    }
  }

  pub fn assistant_with_images(content: impl Into<String>, images: Vec<String>) -> Self {
    Self {
      role: Role::Assistant,
      content: content.into(),
      images,
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Conversation {
  messages: Vec<ChatMessage>,
}

impl Conversation {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, message: ChatMessage) {
    self.messages.push(message);
  }

  pub fn clear(&mut self) {
    self.messages.clear();
  }

  pub fn messages(&self) -> &[ChatMessage] {
    &self.messages
  }

  pub fn len(&self) -> usize {
    self.messages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.messages.is_empty()
  }

  pub fn last(&self) -> Option<&ChatMessage> {
    self.messages.last()
  }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StudentLevel {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

impl StudentLevel {
  pub fn label(self) -> &'static str {
    match self {
      StudentLevel::Beginner => "Beginner",
      StudentLevel::Intermediate => "Intermediate",
      StudentLevel::Advanced => "Advanced",
    }
  }

  pub fn from_label(label: &str) -> Self {
    match label.trim().to_ascii_lowercase().as_str() {
      "intermediate" => StudentLevel::Intermediate,
      "advanced" => StudentLevel::Advanced,
      _ => StudentLevel::Beginner,
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TaskType {
  #[default]
  Explain,
  Examples,
  PracticeQuestions,
  Quiz,
  StudyPlan,
}

impl TaskType {
  pub fn label(self) -> &'static str {
    match self {
      TaskType::Explain => "Explain",
      TaskType::Examples => "Examples",
      TaskType::PracticeQuestions => "Practice Questions",
      TaskType::Quiz => "Quiz",
      TaskType::StudyPlan => "Study Plan",
    }
  }

  pub fn from_label(label: &str) -> Self {
    match label.trim().to_ascii_lowercase().as_str() {
      "examples" => TaskType::Examples,
      "practice questions" | "practice_questions" | "practice" => TaskType::PracticeQuestions,
      "quiz" => TaskType::Quiz,
      "study plan" | "study_plan" => TaskType::StudyPlan,
      _ => TaskType::Explain,
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiOptions {
  pub student_level: StudentLevel,
  pub task_type: TaskType,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ImageData {
  pub mime: String,
  pub base64: String,
  #[serde(default)]
  pub filename: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatTurnRequest {
  #[serde(default)]
  pub session_id: Option<String>,
  pub message: String,
  #[serde(default)]
  pub student_level: Option<String>,
  #[serde(default)]
  pub task_type: Option<String>,
}

impl ChatTurnRequest {
  pub fn ui_options(&self) -> UiOptions {
    UiOptions {
      student_level: self
        .student_level
        .as_deref()
        .map(StudentLevel::from_label)
        .unwrap_or_default(),
      task_type: self
        .task_type
        .as_deref()
        .map(TaskType::from_label)
        .unwrap_or_default(),
    }
  }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatTurnResponse {
  pub session_id: String,
  pub reply: Option<ChatMessage>,
  pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HistoryResponse {
  pub session_id: String,
  pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SolveImageRequest {
  pub image: ImageData,
  #[serde(default = "default_is_question")]
  pub is_question: bool,
}

fn default_is_question() -> bool {
  true
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExplainNotesRequest {
  #[serde(default)]
  pub text: Option<String>,
  #[serde(default)]
  pub image: Option<ImageData>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Explanation {
  pub extracted_text: Option<String>,
  pub explanation: String,
}

#[derive(Serialize, Deserialize)]
pub struct ModelsResponse {
  pub default_model: String,
  pub fallback_models: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct StoreKeyRequest {
  pub key: String,
}
