// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::{RosterError, ShotId};

/// Checked rows. Cleared whenever the roster is re-rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    ids: BTreeSet<ShotId>,
}

impl SelectionSet {
    /// Flips membership and returns whether the row is now checked.
    pub fn toggle(&mut self, id: ShotId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn contains(&self, id: ShotId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<ShotId> {
        self.ids.iter().copied().collect()
    }

    pub fn bulk_delete_visible(&self) -> bool {
        !self.is_empty()
    }

    /// Ids for one bulk request, or a validation error when nothing is
    /// checked.
    pub fn bulk_ids(&self) -> Result<Vec<ShotId>, RosterError> {
        if self.is_empty() {
            return Err(RosterError::validation("nothing selected"));
        }
        Ok(self.ids())
    }
}

#[cfg(test)]
mod tests {
    use super::SelectionSet;
    use crate::{RosterError, ShotId};

    #[test]
    fn toggle_flips_membership() {
        let mut selection = SelectionSet::default();
        assert!(!selection.bulk_delete_visible());

        assert!(selection.toggle(ShotId::new(3)));
        assert!(selection.toggle(ShotId::new(1)));
        assert!(selection.bulk_delete_visible());
        assert_eq!(selection.ids(), vec![ShotId::new(1), ShotId::new(3)]);

        assert!(!selection.toggle(ShotId::new(3)));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn empty_selection_reports_nothing_selected() {
        let selection = SelectionSet::default();
        assert_eq!(
            selection.bulk_ids(),
            Err(RosterError::validation("nothing selected"))
        );
    }
}
