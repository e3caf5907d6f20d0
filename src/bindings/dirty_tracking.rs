// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Dirty tracking.

Two flavors live here:

* [`DirtySet`] answers "which binding categories has this transaction captured?".  It is a
  typed set over [`BindingCategory`] with O(1) insert and membership.
* [`DirtyFlag`] is a single "this cached visual needs regeneration" marker that is consumed
  by whoever regenerates it.
*/

use crate::bindings::category::{BindingCategory, RESTORE_ORDER};
use std::fmt::{Debug, Formatter};

/// The set of binding categories captured within one open transaction.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtySet {
    bits: u64,
}

const _: () = assert!(BindingCategory::COUNT <= u64::BITS as usize);

impl DirtySet {
    pub const fn new() -> Self {
        DirtySet { bits: 0 }
    }

    const fn mask(category: BindingCategory) -> u64 {
        1u64 << category.index()
    }

    /// Inserts `category`.  Returns `true` if it was not already present.
    pub fn insert(&mut self, category: BindingCategory) -> bool {
        let was_present = self.contains(category);
        self.bits |= Self::mask(category);
        !was_present
    }

    pub const fn contains(&self, category: BindingCategory) -> bool {
        self.bits & Self::mask(category) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub const fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn clear(&mut self) {
        self.bits = 0;
    }

    /// Members, in restore order.
    pub fn iter(&self) -> impl Iterator<Item = BindingCategory> + '_ {
        RESTORE_ORDER.into_iter().filter(|c| self.contains(*c))
    }
}

impl Debug for DirtySet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A single consumable dirty marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyFlag(bool);

impl DirtyFlag {
    pub const fn new(dirty: bool) -> Self {
        DirtyFlag(dirty)
    }
    pub fn mark_dirty(&mut self) {
        self.0 = true;
    }
    pub const fn is_dirty(&self) -> bool {
        self.0
    }
    /// Returns whether the flag was set, clearing it.
    pub fn take(&mut self) -> bool {
        std::mem::replace(&mut self.0, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::category::Stage;

    #[test]
    fn insert_reports_first_entry_only() {
        let mut set = DirtySet::new();
        assert!(set.insert(BindingCategory::Viewports));
        assert!(!set.insert(BindingCategory::Viewports));
        assert!(set.insert(BindingCategory::Shader(Stage::Pixel)));
        assert_eq!(set.len(), 2);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn iterates_in_restore_order() {
        let mut set = DirtySet::new();
        set.insert(BindingCategory::Predication);
        set.insert(BindingCategory::RenderTargets);
        set.insert(BindingCategory::PrimitiveTopology);
        let order: Vec<_> = set.iter().collect();
        assert_eq!(
            order,
            vec![
                BindingCategory::PrimitiveTopology,
                BindingCategory::RenderTargets,
                BindingCategory::Predication
            ]
        );
    }

    #[test]
    fn flag_take_consumes() {
        let mut flag = DirtyFlag::new(false);
        assert!(!flag.take());
        flag.mark_dirty();
        assert!(flag.is_dirty());
        assert!(flag.take());
        assert!(!flag.is_dirty());
    }
}
