pub const MAX_TEXT_LEN: usize = 8000;

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

pub fn text_input(text: &str, field: &str) -> Result<(), String> {
  if text.trim().is_empty() {
    return Err(format!("Please enter some {field}."));
  }
  if text.chars().count() > MAX_TEXT_LEN {
    return Err(format!("The {field} is too long. Please shorten it a bit."));
  }
  Ok(())
}

pub fn image_filename(filename: Option<&str>) -> Result<(), String> {
  let Some(name) = filename else {
    return Ok(());
  };
  let lower = name.to_ascii_lowercase();
  if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
    Ok(())
  } else {
    Err("Unsupported file type. Please upload a JPG or PNG image.".to_string())
  }
}
