//! Submitted form data.
//!
//! [`FormData`] holds the text values and file uploads of one submission,
//! keyed by HTML input name. Both halves are insertion-ordered multi-value
//! dictionaries, so repeated inputs (`tags=a&tags=b`) keep every value.

use docforms_core::utils::MultiValueDict;

/// An uploaded file from a multipart form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The original filename as provided by the client.
    pub name: String,
    /// The MIME content type of the file.
    pub content_type: String,
    /// The raw file content.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Creates an upload from its parts.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// The size of the content in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Browsers submit an unnamed, empty part for a file input left blank.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.content.is_empty()
    }

    /// The lowercase extension of the original name, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = crate::files::split_extension(&self.name);
        ext.strip_prefix('.').map(str::to_lowercase)
    }
}

/// The text fields and uploads of one submission.
///
/// # Examples
///
/// ```
/// use docforms_forms::data::FormData;
///
/// let data = FormData::parse("text=buy+milk&tags=a&tags=b");
/// assert_eq!(data.get("text"), Some("buy milk"));
/// assert_eq!(data.get_list("tags"), ["a", "b"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: MultiValueDict<String, String>,
    files: MultiValueDict<String, UploadedFile>,
}

impl FormData {
    /// Creates an empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body or query string.
    pub fn parse(encoded: &str) -> Self {
        let mut data = Self::new();
        for (key, value) in url::form_urlencoded::parse(encoded.as_bytes()) {
            data.fields.append(key.into_owned(), value.into_owned());
        }
        data
    }

    /// Builds a submission from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = Self::new();
        for (key, value) in pairs {
            data.fields.append(key.into(), value.into());
        }
        data
    }

    /// The last value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Every value submitted under `name`.
    pub fn get_list(&self, name: &str) -> &[String] {
        self.fields.get_list(name)
    }

    /// Replaces the values under `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.set(name.into(), value.into());
    }

    /// Adds a value under `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.append(name.into(), value.into());
    }

    /// Adds an upload under `name`.
    pub fn add_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.files.append(name.into(), file);
    }

    /// Builder form of [`add_file`](Self::add_file).
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.add_file(name, file);
        self
    }

    /// The last upload under `name`, ignoring blank file inputs.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).filter(|f| !f.is_empty())
    }

    /// Uploads whose input name starts with `{prefix}-`, with the remainder
    /// of the name as key.
    pub fn files_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a UploadedFile)> + 'a {
        self.files.iter().filter_map(move |(name, files)| {
            let key = name.strip_prefix(prefix)?.strip_prefix('-')?;
            let file = files.last().filter(|f| !f.is_empty())?;
            Some((key, file))
        })
    }

    /// Returns `true` if any text value or upload was submitted under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.files.contains_key(name)
    }

    /// Returns `true` when nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// The submitted text field names.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Encodes the text fields as a query string.
    pub fn urlencode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in self.fields.iter() {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}
