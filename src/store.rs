use crate::{core::View, error::OralmarkResult, model::AnnotationRecord};

/// Ordered annotation records for each of the three views. Insertion order
/// is paint order. This is also the persisted document shape:
/// `{ "upper": [...], "front": [...], "bottom": [...] }`, with missing keys
/// loading as empty lists.
///
/// Fields stay private so every mutation goes through an operation that is
/// scoped to a single view (or explicitly to the whole mapping).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewAnnotations {
    upper: Vec<AnnotationRecord>,
    front: Vec<AnnotationRecord>,
    bottom: Vec<AnnotationRecord>,
}

impl ViewAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, view: View) -> &Vec<AnnotationRecord> {
        match view {
            View::Upper => &self.upper,
            View::Front => &self.front,
            View::Bottom => &self.bottom,
        }
    }

    fn list_mut(&mut self, view: View) -> &mut Vec<AnnotationRecord> {
        match view {
            View::Upper => &mut self.upper,
            View::Front => &mut self.front,
            View::Bottom => &mut self.bottom,
        }
    }

    /// Append one record to the end of `view`'s sequence. No deduplication,
    /// no capacity limit.
    pub fn append(&mut self, view: View, record: AnnotationRecord) {
        self.list_mut(view).push(record);
    }

    /// Replace the entire mapping at once; the load path for a previously
    /// saved submission.
    pub fn replace_all(&mut self, full_set: ViewAnnotations) {
        *self = full_set;
    }

    /// Replace one view's records, leaving the other views untouched; the
    /// partial-update write used when persisting a single view.
    pub fn replace_view(&mut self, view: View, records: Vec<AnnotationRecord>) {
        *self.list_mut(view) = records;
    }

    /// Empty exactly one view's sequence. Never clears the whole mapping.
    pub fn clear(&mut self, view: View) {
        self.list_mut(view).clear();
    }

    /// The ordered records for `view`; empty for a view never drawn on.
    pub fn get(&self, view: View) -> &[AnnotationRecord] {
        self.list(view)
    }

    pub fn len(&self, view: View) -> usize {
        self.list(view).len()
    }

    pub fn is_empty(&self) -> bool {
        View::ALL.iter().all(|&v| self.list(v).is_empty())
    }

    pub fn total_len(&self) -> usize {
        View::ALL.iter().map(|&v| self.list(v).len()).sum()
    }

    pub fn validate(&self) -> OralmarkResult<()> {
        for view in View::ALL {
            for record in self.get(view) {
                record.validate()?;
            }
        }
        Ok(())
    }
}
