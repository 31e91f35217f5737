use crate::models::{TaskType, UiOptions};

fn task_instructions(task: TaskType) -> &'static str {
  match task {
    TaskType::Explain => {
      "Explain the topic step by step in plain language. Keep sentences short, \
       use everyday examples, and organise the answer under clear headings."
    }
    TaskType::Examples => {
      "Give several practical examples of the main ideas, starting with very easy \
       ones and moving to slightly harder ones."
    }
    TaskType::PracticeQuestions => {
      "Write 3 to 7 practice questions, mixing easy and moderate ones, each followed \
       by its answer and a short explanation."
    }
    TaskType::Quiz => {
      "Write a 5-question quiz. List the correct answers with short explanations \
       at the end, after all the questions."
    }
    TaskType::StudyPlan => {
      "Lay out a structured study plan in daily or weekly steps, with an estimated \
       time and a learning goal for each step."
    }
  }
}

pub fn text_tutor(user_input: &str, options: UiOptions) -> String {
  let level = options.student_level.label();
  let task = options.task_type.label();
  format!(
    "You are StudyBuddy AI, tutoring a student at the {lower} level.\n\n\
     Student level: {level}\n\
     Requested task: {task}\n\n\
     What to do:\n{instructions}\n\n\
     The student's question or topic:\n{user_input}\n\n\
     Answer in Markdown using ### headings, bullet points for lists, step-by-step \
     reasoning where it helps, and finish with a short section titled 'Summary'.\n",
    lower = level.to_lowercase(),
    instructions = task_instructions(options.task_type),
  )
}

pub fn image_caption(phrase: &str) -> String {
  format!(
    "In 2-3 sentences, give a short informative description of: {phrase}. \
     Keep it brief because pictures are shown next to your answer."
  )
}

pub fn image_solver(ocr_text: &str, is_question: bool) -> String {
  let (intro, steps) = if is_question {
    (
      "The text below is a question or problem the student wants solved.",
      "1. Restate briefly what is being asked.\n\
       2. Solve it step by step, showing the reasoning.\n\
       3. Explain every step in beginner-friendly words.\n\
       4. Name and explain any formula you use.\n\
       5. Close with a one-paragraph recap of the key idea.",
    )
  } else {
    (
      "The text below is a set of notes or textbook explanations the student wants explained.",
      "1. Pick out the main ideas and key terms.\n\
       2. Explain each part simply and clearly.\n\
       3. Organise the answer with headings and bullet points.\n\
       4. Close with a short recap of the big picture.",
    )
  };
  format!(
    "You are StudyBuddy AI, a friendly tutor.\n\n{intro}\n\n\
     Text read from the student's image:\n-----\n{ocr_text}\n-----\n\n\
     Your steps:\n{steps}\n\n\
     Answer in Markdown with clear headings and bullet points."
  )
}

const NOTES_RULES: &str = "Please:\n\
  - Explain each part in simple words.\n\
  - Clarify technical terms using only what is written.\n\
  - Use headings and bullet points.\n";

pub fn explain_notes_text(notes: &str) -> String {
  format!(
    "You are StudyBuddy AI, a careful tutor.\n\n\
     The student pasted their own notes. Only explain and clarify what the notes \
     already say. Do not add facts, formulas or examples that are not in them.\n\n\
     The notes:\n-----\n{notes}\n-----\n\n\
     {NOTES_RULES}\
     - End with a short 'Summary of Your Notes' section.\n"
  )
}

pub fn explain_notes_image(ocr_text: &str) -> String {
  format!(
    "You are StudyBuddy AI, a careful tutor.\n\n\
     The student photographed their notes or textbook, and the text below is what \
     could be read from that photo. Only explain and clarify what is written there. \
     Do not add facts, formulas or examples that are not in it.\n\n\
     Text read from the image:\n-----\n{ocr_text}\n-----\n\n\
     {NOTES_RULES}\
     - End with a short 'Summary of What Your Notes Say' section.\n"
  )
}
