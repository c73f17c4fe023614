//! The records contributed by a data loader.

use indexmap::IndexMap;
use indexmap::map::Entry;

/// A single rendered statement that a type implements the trait of the page,
/// e.g. `impl Drop for Report`.
///
/// Records are immutable once produced: the registry hands out shared
/// references only.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImplementorRecord {
    /// The rendered signature of the `impl` block.
    ///
    /// It may contain HTML markup (e.g. `<span class="where fmt-newline">`)
    /// and escaped entities (`&lt;`). It is kept verbatim.
    text: String,
    /// `true` for auto-trait and blanket implementations synthesized by `rustdoc`.
    #[serde(default)]
    synthetic: bool,
    /// The identifiers of the types referenced by the implementation.
    #[serde(default)]
    types: Vec<String>,
}

impl ImplementorRecord {
    /// A non-synthetic record that doesn't reference any type.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            synthetic: false,
            types: Vec::new(),
        }
    }

    /// Mark the record as synthesized by `rustdoc`.
    pub fn synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    /// Set the identifiers of the types referenced by the implementation.
    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn referenced_types(&self) -> &[String] {
        &self.types
    }
}

/// The implementor records contributed by one data loader, grouped by subject
/// (the name of the crate that contains the implementations).
///
/// Subjects are unique. Both the order of the subjects and the order of the
/// records for each subject are preserved, since they determine the order in
/// which implementors are displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImplementorBatch {
    subjects: IndexMap<String, Vec<ImplementorRecord>>,
}

impl ImplementorBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the records for `subject`.
    ///
    /// If the subject was already assigned, its records are replaced and it keeps
    /// its original position. The previous records are returned.
    pub fn insert(
        &mut self,
        subject: impl Into<String>,
        records: Vec<ImplementorRecord>,
    ) -> Option<Vec<ImplementorRecord>> {
        match self.subjects.entry(subject.into()) {
            Entry::Occupied(mut entry) => Some(std::mem::replace(entry.get_mut(), records)),
            Entry::Vacant(entry) => {
                entry.insert(records);
                None
            }
        }
    }

    pub fn get(&self, subject: &str) -> Option<&[ImplementorRecord]> {
        self.subjects.get(subject).map(Vec::as_slice)
    }

    /// Iterate over the subjects, in insertion order.
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    /// Iterate over subjects and their records, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ImplementorRecord])> {
        self.subjects
            .iter()
            .map(|(subject, records)| (subject.as_str(), records.as_slice()))
    }

    /// The number of subjects in the batch.
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<ImplementorRecord>)> for ImplementorBatch {
    fn from_iter<T: IntoIterator<Item = (S, Vec<ImplementorRecord>)>>(iter: T) -> Self {
        let mut batch = Self::new();
        for (subject, records) in iter {
            batch.insert(subject, records);
        }
        batch
    }
}

impl IntoIterator for ImplementorBatch {
    type Item = (String, Vec<ImplementorRecord>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<ImplementorRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.subjects.into_iter()
    }
}
