/// Quick-capture note inbox. Notes are turned into tasks one at a time or
/// all at once; they are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrainDump {
    notes: Vec<String>,
}

impl BrainDump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: Vec<String>) -> Self {
        Self { notes }
    }

    /// Newest first.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Prepend a note. Blank input is ignored and returns false.
    pub fn add_note(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.notes.insert(0, text.to_string());
        true
    }

    pub fn remove_note(&mut self, idx: usize) -> Option<String> {
        (idx < self.notes.len()).then(|| self.notes.remove(idx))
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.notes.get(idx).map(String::as_str)
    }

    /// Empty the inbox, returning notes in display order.
    pub fn take_all(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notes)
    }
}

pub fn sample_notes() -> Vec<String> {
    vec![
        "Need to research standing desks before the sale ends on Friday".into(),
        "Gift idea for mom: digital photo frame with wifi sync".into(),
        "Cancel the gym subscription".into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_ignores_blank_and_prepends() {
        let mut inbox = BrainDump::with_notes(sample_notes());
        assert!(!inbox.add_note("   "));
        assert!(inbox.add_note(" Call the bank "));
        assert_eq!(inbox.get(0), Some("Call the bank"));
        assert_eq!(inbox.len(), 4);
    }

    #[test]
    fn remove_out_of_range() {
        let mut inbox = BrainDump::with_notes(sample_notes());
        assert!(inbox.remove_note(7).is_none());
        assert_eq!(inbox.remove_note(2).as_deref(), Some("Cancel the gym subscription"));
        assert_eq!(inbox.len(), 2);
    }

    #[test]
    fn take_all_clears() {
        let mut inbox = BrainDump::with_notes(sample_notes());
        assert_eq!(inbox.take_all().len(), 3);
        assert!(inbox.is_empty());
    }
}
