use indexmap::IndexMap;

use crate::types::{ImplementorBatch, ImplementorRecord};

/// The implementors known to a trait page, grouped by subject.
///
/// The registry only grows: merging a batch adds the subjects it hasn't seen yet
/// and replaces the records of the ones it has. Subjects are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Registry {
    subjects: IndexMap<String, Vec<ImplementorRecord>>,
}

/// The changes applied to a [`Registry`] by [`Registry::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Subjects that were not in the registry before the merge.
    pub inserted: Vec<String>,
    /// Subjects whose records were overwritten by the merge.
    pub replaced: Vec<String>,
}

impl MergeOutcome {
    /// `true` if the merge didn't touch the registry.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.replaced.is_empty()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch into the registry.
    ///
    /// For every subject in the batch, the registry entry is set to the batch's
    /// records: last write wins, records are not accumulated across batches.
    /// An empty batch leaves the registry untouched.
    pub fn merge(&mut self, batch: ImplementorBatch) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for (subject, records) in batch {
            match self.subjects.insert(subject.clone(), records) {
                None => outcome.inserted.push(subject),
                Some(_) => {
                    tracing::warn!(
                        subject = %subject,
                        "The implementors of a subject have been contributed more than once. \
                        The most recent contribution replaces the previous one."
                    );
                    outcome.replaced.push(subject);
                }
            }
        }
        outcome
    }

    pub fn get(&self, subject: &str) -> Option<&[ImplementorRecord]> {
        self.subjects.get(subject).map(Vec::as_slice)
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.subjects.contains_key(subject)
    }

    /// Iterate over the subjects, in the order they were first registered.
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ImplementorRecord])> {
        self.subjects
            .iter()
            .map(|(subject, records)| (subject.as_str(), records.as_slice()))
    }

    /// The number of subjects in the registry.
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::{ImplementorBatch, ImplementorRecord, Registry};

    fn batch(entries: &[(&str, &[&str])]) -> ImplementorBatch {
        entries
            .iter()
            .map(|(subject, texts)| {
                let records: Vec<_> = texts.iter().map(|t| ImplementorRecord::new(*t)).collect();
                (*subject, records)
            })
            .collect()
    }

    #[test]
    fn merging_an_empty_batch_is_a_no_op() {
        let mut registry = Registry::new();
        registry.merge(batch(&[("eyre", &["impl Drop for Report"])]));
        let before = registry.clone();

        let outcome = registry.merge(ImplementorBatch::new());

        assert!(outcome.is_empty());
        assert_eq!(registry, before);
    }

    #[test]
    fn merge_preserves_record_order() {
        let mut registry = Registry::new();
        registry.merge(batch(&[(
            "tracing",
            &["impl Drop for Span", "impl Drop for Entered", "impl Drop for EnteredSpan"],
        )]));

        let texts: Vec<_> = registry
            .get("tracing")
            .unwrap()
            .iter()
            .map(|r| r.text())
            .collect();
        assert_eq!(
            texts,
            ["impl Drop for Span", "impl Drop for Entered", "impl Drop for EnteredSpan"]
        );
    }

    #[test]
    fn a_later_contribution_replaces_the_records_of_a_subject() {
        let mut registry = Registry::new();
        registry.merge(batch(&[("a", &["impl T for A"]), ("b", &["impl T for B"])]));

        let outcome = registry.merge(batch(&[("b", &["impl T for B2"]), ("c", &["impl T for C"])]));

        assert_eq!(outcome.inserted, vec!["c".to_string()]);
        assert_eq!(outcome.replaced, vec!["b".to_string()]);
        assert_eq!(registry.subjects().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(registry.get("b").unwrap(), &[ImplementorRecord::new("impl T for B2")]);
    }
}
