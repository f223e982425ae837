//! Append-only category registry with atomic enable bytes.
//!
//! A category group is the comma-separated string an instrumentation
//! site names, e.g. `"v8,devtools"`. Each distinct group string gets one
//! record in a fixed table; the record address is stable for the life of
//! the registry, so call sites may cache `&CategoryGroup` and re-check
//! only the enable byte on each hit.

use parking_lot::Mutex;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Session recording is on for this group.
pub const ENABLED_FOR_RECORDING: u8 = 1 << 0;
/// The registered event callback wants this group. Bit 1 is left
/// unassigned to keep these values wire-compatible with traces recorded
/// by Chromium, which used it for monitoring mode.
pub const ENABLED_FOR_EVENT_CALLBACK: u8 = 1 << 2;

pub const MAX_CATEGORY_GROUPS: usize = 1024;

/// Groups carrying this prefix are opt-in: `*` does not match them.
pub const DISABLED_BY_DEFAULT_PREFIX: &str = "disabled-by-default-";

/// Slot 0, handed out once the table is exhausted. Never enabled.
pub(crate) const CATEGORY_GROUP_OVERFLOW: &str =
    "category groups exhausted; raise MAX_CATEGORY_GROUPS";
/// Slot 1, used for synthetic metadata events. Never enabled by filters.
pub(crate) const CATEGORY_GROUP_METADATA: &str = "__metadata";

const RESERVED_GROUPS: usize = 2;
const OVERFLOW_SLOT: usize = 0;

pub struct CategoryGroup {
    name: UnsafeCell<&'static str>,
    enabled: AtomicU8,
}

// The name cell is written exactly once, before the slot is published
// via the registry length with release ordering.
unsafe impl Sync for CategoryGroup {}

impl CategoryGroup {
    const fn empty() -> Self {
        CategoryGroup {
            name: UnsafeCell::new(""),
            enabled: AtomicU8::new(0),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        unsafe { *self.name.get() }
    }

    #[inline]
    pub fn enabled_byte(&self) -> &AtomicU8 {
        &self.enabled
    }

    #[inline]
    pub fn state(&self) -> u8 {
        self.enabled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.state() != 0
    }

    #[inline]
    pub fn is_enabled_for_recording(&self) -> bool {
        self.state() & ENABLED_FOR_RECORDING != 0
    }
}

pub struct CategoryRegistry {
    slots: Box<[CategoryGroup]>,
    len: AtomicUsize,
    insert_lock: Mutex<()>,
}

impl CategoryRegistry {
    pub(crate) fn new() -> Self {
        let slots: Box<[CategoryGroup]> = (0..MAX_CATEGORY_GROUPS)
            .map(|_| CategoryGroup::empty())
            .collect();
        unsafe {
            *slots[OVERFLOW_SLOT].name.get() = CATEGORY_GROUP_OVERFLOW;
            *slots[1].name.get() = CATEGORY_GROUP_METADATA;
        }
        CategoryRegistry {
            slots,
            len: AtomicUsize::new(RESERVED_GROUPS),
            insert_lock: Mutex::new(()),
        }
    }

    pub(crate) fn metadata_group(&self) -> &CategoryGroup {
        &self.slots[1]
    }

    pub(crate) fn is_reserved(name: &str) -> bool {
        name == CATEGORY_GROUP_OVERFLOW || name == CATEGORY_GROUP_METADATA
    }

    /// Returns the record for `name`, creating it on first sight.
    ///
    /// `bits_for_new` computes the initial enable byte for a group that
    /// did not exist yet, so groups first seen mid-session come up with
    /// the session filter already applied.
    pub(crate) fn get_or_insert(
        &self,
        name: &'static str,
        bits_for_new: impl FnOnce(&str) -> u8,
    ) -> &CategoryGroup {
        let len = self.len.load(Ordering::Acquire);
        for slot in &self.slots[..len] {
            if slot.name() == name {
                return slot;
            }
        }

        let _guard = self.insert_lock.lock();
        let published = self.len.load(Ordering::Acquire);
        for slot in &self.slots[len..published] {
            if slot.name() == name {
                return slot;
            }
        }
        if published == self.slots.len() {
            tracing::warn!(category = name, "category table full");
            return &self.slots[OVERFLOW_SLOT];
        }
        let slot = &self.slots[published];
        unsafe {
            *slot.name.get() = name;
        }
        slot.enabled.store(bits_for_new(name), Ordering::Relaxed);
        self.len.store(published + 1, Ordering::Release);
        slot
    }

    /// All published groups, reserved slots included.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &CategoryGroup> {
        let len = self.len.load(Ordering::Acquire);
        self.slots[..len].iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> CategoryRegistry {
        CategoryRegistry::new()
    }

    #[rstest]
    fn same_name_resolves_to_same_record(registry: CategoryRegistry) {
        let a = registry.get_or_insert("gpu", |_| 0) as *const _;
        let b = registry.get_or_insert("gpu", |_| 0) as *const _;
        assert_eq!(a, b);
    }

    #[rstest]
    fn distinct_names_get_distinct_records(registry: CategoryRegistry) {
        let a = registry.get_or_insert("gpu", |_| 0) as *const CategoryGroup;
        let b = registry.get_or_insert("cc", |_| 0) as *const CategoryGroup;
        assert_ne!(a, b);
    }

    #[rstest]
    fn comma_list_is_a_single_group(registry: CategoryRegistry) {
        let group = registry.get_or_insert("v8,devtools", |_| 0);
        assert_eq!(group.name(), "v8,devtools");
        let count = registry.iter().count();
        assert_eq!(count, RESERVED_GROUPS + 1);
    }

    #[rstest]
    fn new_group_gets_computed_bits(registry: CategoryRegistry) {
        let group = registry.get_or_insert("net", |_| ENABLED_FOR_RECORDING);
        assert!(group.is_enabled_for_recording());
    }

    #[rstest]
    fn exhausted_table_resolves_to_overflow_slot(registry: CategoryRegistry) {
        let names: Vec<&'static str> = (0..MAX_CATEGORY_GROUPS)
            .map(|i| Box::leak(format!("cat-{i}").into_boxed_str()) as &'static str)
            .collect();
        for name in &names {
            registry.get_or_insert(name, |_| 0);
        }
        let overflow = registry.get_or_insert("one-too-many", |_| ENABLED_FOR_RECORDING);
        assert_eq!(overflow.name(), CATEGORY_GROUP_OVERFLOW);
        assert!(!overflow.is_enabled());
    }

    #[rstest]
    fn concurrent_inserts_agree_on_one_record(registry: CategoryRegistry) {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.get_or_insert("racy", |_| 0) as *const CategoryGroup as usize))
                .collect();
            let first = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>();
            assert!(first.windows(2).all(|w| w[0] == w[1]));
        });
    }
}
