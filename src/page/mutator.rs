//! In-place rewriting of displayed text from a lookup table.

use log::{debug, trace};
use serde_json::Value;
use std::collections::BTreeSet;

use super::scan::{displayed_text_mut, marked_names};
use crate::table::LookupTable;

/// What one [`PageMutator::apply`] call did to a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageChanges {
    /// Text fields that matched a table entry and were written
    pub fields_written: usize,
    /// Written fields whose content actually differs from before
    pub fields_changed: usize,
    /// Labels that matched at least one object
    pub labels_applied: BTreeSet<String>,
}

impl PageChanges {
    pub fn is_modified(&self) -> bool {
        self.fields_changed > 0
    }
}

/// Rewrites marker-tagged objects of a page with table text
pub struct PageMutator<'t> {
    table: &'t LookupTable,
    prefix: &'t str,
}

impl<'t> PageMutator<'t> {
    pub fn new(table: &'t LookupTable, prefix: &'t str) -> Self {
        Self { table, prefix }
    }

    /// Overwrite the displayed text of every marker-tagged object whose
    /// label has table entries. Entries are applied in table order, so the
    /// last one for a label wins. Objects with no matching entry, or with
    /// no displayed text, are left untouched.
    pub fn apply(&self, page: &mut Value) -> PageChanges {
        let mut changes = PageChanges::default();

        // Paths are computed on the unmodified page; the rewrites below only
        // replace string contents, so they stay valid.
        for marked in marked_names(page, self.prefix) {
            let mut entries = self.table.matching(&marked.label).peekable();
            if entries.peek().is_none() {
                trace!("No table entry for '{}'", marked.label);
                continue;
            }

            let Some(owner) = marked.owner.resolve_mut(page) else {
                debug!("'{}' no longer resolves at {}", marked.label, marked.owner);
                continue;
            };
            let Some(text) = displayed_text_mut(owner) else {
                debug!("'{}' at {} has no displayed text", marked.label, marked.owner);
                continue;
            };

            let original = text.clone();
            for entry in entries {
                text.clone_from(&entry.text);
            }

            changes.fields_written += 1;
            if *text != original {
                changes.fields_changed += 1;
                debug!("{} at {}: {:?} -> {:?}", marked.label, marked.owner, original, text);
            }
            changes.labels_applied.insert(marked.label);
        }

        changes
    }
}
