//! Multipart form payloads.
//!
//! A `reqwest::multipart::Form` is consumed when sent, so uploads are kept
//! as owned field data and rebuilt for every attempt of a request.

use std::path::Path;

use reqwest::multipart::{Form, Part};

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File { file_name: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields
            .push((name.to_string(), FormValue::Text(value.into())));
        self
    }

    /// Append a text field only when the value is non-empty
    pub fn text_if_present(self, name: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.text(name, value)
        }
    }

    /// Read a file from disk into a file field
    pub fn file(mut self, name: &str, path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        self.fields
            .push((name.to_string(), FormValue::File { file_name, bytes }));
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FormValue::Text(value) => Some(value),
            FormValue::File { .. } => None,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn to_multipart(&self) -> Form {
        self.fields
            .iter()
            .fold(Form::new(), |form, (name, value)| match value {
                FormValue::Text(text) => form.text(name.clone(), text.clone()),
                FormValue::File { file_name, bytes } => form.part(
                    name.clone(),
                    Part::bytes(bytes.clone()).file_name(file_name.clone()),
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_if_present_skips_empty() {
        let form = FormData::new()
            .text_if_present("name", "Spring Fair")
            .text_if_present("website", "");
        assert_eq!(form.field_names().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(form.get_text("name"), Some("Spring Fair"));
    }

    #[test]
    fn test_file_field_reads_bytes() {
        let path = std::env::temp_dir().join(format!("diradmin-form-{}.png", std::process::id()));
        std::fs::write(&path, b"png").unwrap();

        let form = FormData::new().file("image", &path).unwrap();
        match form.get("image") {
            Some(FormValue::File { file_name, bytes }) => {
                assert!(file_name.ends_with(".png"));
                assert_eq!(bytes, b"png");
            }
            other => panic!("unexpected field: {:?}", other),
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_errors() {
        let result = FormData::new().file("image", Path::new("/definitely/not/here.png"));
        assert!(result.is_err());
    }
}
