//! The variable store: an arena of field assignments grouped into copy classes.
//!
//! Every class is a circular list threaded through `next`/`prev`, and every record
//! points at the class's canonical index. Merging splices two rings and relabels
//! the smaller one, so `canonical` is always a single lookup.
use crate::plonk::constraint_system::VarIndex;
use ark_ff::PrimeField;
use std::collections::BTreeMap;

/// The tag of a variable that takes no part in a generalized permutation.
pub const DUMMY_TAG: u32 = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
struct VariableRecord<F> {
    value: F,
    real_index: VarIndex,
    next: VarIndex,
    prev: VarIndex,
}

/// Result of merging two classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Merge {
    /// Both indices were already in one class.
    AlreadyEqual,
    /// The classes were merged.
    Merged,
    /// The classes were merged, but they carried two different non-dummy tags.
    TagClash,
}

/// Arena of variables with copy classes and permutation tags.
#[derive(Clone, Debug, Default)]
pub struct VariableStore<F> {
    records: Vec<VariableRecord<F>>,
    /// Tag of each class, stored at the canonical index.
    real_variable_tags: Vec<u32>,
    /// Size of each class, stored at the canonical index.
    class_sizes: Vec<u32>,
    tau: BTreeMap<u32, u32>,
    current_tag: u32,
}

impl<F: PrimeField> VariableStore<F> {
    /// An empty store.
    pub fn new() -> Self {
        VariableStore {
            records: vec![],
            real_variable_tags: vec![],
            class_sizes: vec![],
            tau: BTreeMap::new(),
            current_tag: DUMMY_TAG,
        }
    }

    /// An empty store with room for `capacity` variables.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut store = Self::new();
        store.records.reserve(capacity);
        store.real_variable_tags.reserve(capacity);
        store.class_sizes.reserve(capacity);
        store
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no variable.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a variable in its own class.
    pub fn add_variable(&mut self, value: F) -> VarIndex {
        let index = self.records.len() as VarIndex;
        self.records.push(VariableRecord {
            value,
            real_index: index,
            next: index,
            prev: index,
        });
        self.real_variable_tags.push(DUMMY_TAG);
        index
    }

    /// Panic unless `index` names a variable.
    #[inline]
    pub fn assert_valid(&self, index: VarIndex) {
        assert!(
            (index as usize) < self.records.len(),
            "variable index {} out of bounds ({} variables)",
            index,
            self.records.len()
        );
    }

    /// The canonical index of the class of `index`.
    #[inline]
    pub fn canonical(&self, index: VarIndex) -> VarIndex {
        self.assert_valid(index);
        self.records[index as usize].real_index
    }

    /// The value of the class of `index`.
    pub fn get(&self, index: VarIndex) -> F {
        self.records[self.canonical(index) as usize].value
    }

    /// Overwrite the value of the class of `index`.
    pub fn set(&mut self, index: VarIndex, value: F) {
        let real = self.canonical(index) as usize;
        self.records[real].value = value;
    }

    /// Members of the class of `index`, walking the ring from `index`.
    pub fn class_members(&self, index: VarIndex) -> Vec<VarIndex> {
        self.assert_valid(index);
        let mut members = vec![index];
        let mut cursor = self.records[index as usize].next;
        while cursor != index {
            members.push(cursor);
            cursor = self.records[cursor as usize].next;
        }
        members
    }

    /// Merge the classes of `a` and `b`. The canonical index of the larger class
    /// survives, that of `a` on a tie; the value and tag of `a`'s class win.
    pub fn merge(&mut self, a: VarIndex, b: VarIndex) -> Merge {
        let a_real = self.canonical(a);
        let b_real = self.canonical(b);
        if a_real == b_real {
            return Merge::AlreadyEqual;
        }

        let a_tag = self.real_variable_tags[a_real as usize];
        let b_tag = self.real_variable_tags[b_real as usize];
        let value = self.records[a_real as usize].value;
        let (keep, absorb) =
            if self.class_sizes[b_real as usize] > self.class_sizes[a_real as usize] {
                (b_real, a_real)
            } else {
                (a_real, b_real)
            };

        for member in self.class_members(absorb) {
            self.records[member as usize].real_index = keep;
        }

        // splice the absorbed ring in right after `keep`
        let keep_next = self.records[keep as usize].next;
        let absorb_prev = self.records[absorb as usize].prev;
        self.records[keep as usize].next = absorb;
        self.records[absorb as usize].prev = keep;
        self.records[absorb_prev as usize].next = keep_next;
        self.records[keep_next as usize].prev = absorb_prev;

        self.class_sizes[keep as usize] += self.class_sizes[absorb as usize];
        self.records[keep as usize].value = value;
        self.real_variable_tags[keep as usize] = if a_tag == DUMMY_TAG { b_tag } else { a_tag };
        if a_tag != DUMMY_TAG && b_tag != DUMMY_TAG && a_tag != b_tag {
            Merge::TagClash
        } else {
            Merge::Merged
        }
    }

    /// Number of variables in the class of `index`.
    pub fn class_size(&self, index: VarIndex) -> usize {
        self.class_sizes[self.canonical(index) as usize] as usize
    }

    /// Allocate a fresh tag.
    pub fn get_new_tag(&mut self) -> u32 {
        self.current_tag += 1;
        self.current_tag
    }

    /// Register `tau_tag` as the partner of `tag`.
    pub fn create_tag(&mut self, tag: u32, tau_tag: u32) -> u32 {
        self.tau.insert(tag, tau_tag);
        tag
    }

    /// Tag the class of `index`. The class must be untagged.
    pub fn assign_tag(&mut self, index: VarIndex, tag: u32) {
        assert!(tag <= self.current_tag, "tag {} was never allocated", tag);
        let real = self.canonical(index) as usize;
        assert_eq!(
            self.real_variable_tags[real], DUMMY_TAG,
            "variable {} is already tagged",
            index
        );
        self.real_variable_tags[real] = tag;
    }

    /// The tag of the class of `index`.
    pub fn tag(&self, index: VarIndex) -> u32 {
        self.real_variable_tags[self.canonical(index) as usize]
    }

    /// The partner of `tag`.
    pub fn tau(&self, tag: u32) -> Option<u32> {
        self.tau.get(&tag).copied()
    }

    /// The last allocated tag.
    pub fn current_tag(&self) -> u32 {
        self.current_tag
    }
}
