use reqwest::multipart::{Form, Part};

/// File attached to a multipart request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(Upload),
}

/// Ordered multipart fields, kept inspectable until sent
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormFields {
    fields: Vec<(&'static str, FormValue)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, FormValue::Text(value.into())));
        self
    }

    /// Repeated field, one entry per value
    pub fn texts<I, S>(mut self, name: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.fields.push((name, FormValue::Text(value.into())));
        }
        self
    }

    /// Booleans travel as `1` / `0`
    pub fn flag(self, name: &'static str, value: bool) -> Self {
        self.text(name, if value { "1" } else { "0" })
    }

    pub fn file(mut self, name: &'static str, upload: Upload) -> Self {
        self.fields.push((name, FormValue::File(upload)));
        self
    }

    /// Text values of a field in insertion order
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(field, _)| *field == name)
            .filter_map(|(_, value)| match value {
                FormValue::Text(text) => Some(text.as_str()),
                FormValue::File(_) => None,
            })
            .collect()
    }

    pub fn files(&self, name: &str) -> Vec<&Upload> {
        self.fields
            .iter()
            .filter(|(field, _)| *field == name)
            .filter_map(|(_, value)| match value {
                FormValue::File(upload) => Some(upload),
                FormValue::Text(_) => None,
            })
            .collect()
    }

    pub fn into_multipart(self) -> Form {
        self.fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File(upload) => {
                    form.part(name, Part::bytes(upload.bytes).file_name(upload.file_name))
                }
            })
    }
}
