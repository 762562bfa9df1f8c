use std::collections::BTreeSet;

use crate::models::FacetOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Single,
    Multi,
}

/// Read side of a facet control, as consumed by the filter engine.
pub trait FacetSelection {
    fn selected(&self) -> &BTreeSet<String>;

    fn is_active(&self) -> bool {
        !self.selected().is_empty()
    }

    fn accepts(&self, value: &str) -> bool {
        !self.is_active() || self.selected().contains(value)
    }
}

/// Choice state behind one filter facet.
///
/// In `Single` mode at most one value is selected at any time.
#[derive(Debug, Clone)]
pub struct SelectionControl {
    mode: SelectionMode,
    options: Vec<FacetOption>,
    selected: BTreeSet<String>,
    filter_text: String,
}

impl SelectionControl {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            options: Vec::new(),
            selected: BTreeSet::new(),
            filter_text: String::new(),
        }
    }

    pub fn with_options(mode: SelectionMode, options: Vec<FacetOption>) -> Self {
        let mut control = Self::new(mode);
        control.options = options;
        control
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn options(&self) -> &[FacetOption] {
        &self.options
    }

    pub fn get_selected(&self) -> BTreeSet<String> {
        self.selected.clone()
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.contains(value)
    }

    /// Replaces the option list; selected values still offered stay selected.
    pub fn set_options(&mut self, options: Vec<FacetOption>) {
        self.selected
            .retain(|value| options.iter().any(|opt| &opt.value == value));
        self.options = options;
    }

    /// Flips one value. Returns false when the value is not an option.
    ///
    /// Single mode behaves like a radio group that can be cleared: picking a
    /// new value drops the previous one, picking the current value clears it.
    pub fn toggle(&mut self, value: &str) -> bool {
        if !self.has_option(value) {
            return false;
        }
        if self.selected.contains(value) {
            self.selected.remove(value);
            return true;
        }
        if self.mode == SelectionMode::Single {
            self.selected.clear();
        }
        self.selected.insert(value.to_string());
        true
    }

    /// Multi mode only; single mode has no meaningful "all".
    pub fn select_all(&mut self) -> bool {
        if self.mode == SelectionMode::Single {
            return false;
        }
        self.selected = self.options.iter().map(|opt| opt.value.clone()).collect();
        true
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn set_filter_text(&mut self, text: impl Into<String>) {
        self.filter_text = text.into();
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    /// Options matching the filter text on label or value, case-insensitively.
    pub fn visible_options(&self) -> Vec<&FacetOption> {
        let needle = self.filter_text.trim().to_lowercase();
        if needle.is_empty() {
            return self.options.iter().collect();
        }
        self.options
            .iter()
            .filter(|opt| {
                opt.label.to_lowercase().contains(&needle) || opt.value.to_lowercase().contains(&needle)
            })
            .collect()
    }

    fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|opt| opt.value == value)
    }
}

impl FacetSelection for SelectionControl {
    fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }
}
