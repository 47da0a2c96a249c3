//! DOM Observers
//!
//! MutationObserver. The tree queues records into every observer whose
//! registration matches a mutation; the owner drains them with
//! [`DomTree::take_records`](crate::DomTree::take_records).

use crate::NodeId;

/// Handle returned by [`DomTree::observe`](crate::DomTree::observe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u32);

/// Mutation observer
#[derive(Debug)]
pub struct MutationObserver {
    observed: Vec<(NodeId, MutationObserverInit)>,
    records: Vec<MutationRecord>,
}

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// Watch the given attributes on the target only
    pub fn attributes(filter: &[&str]) -> Self {
        Self {
            attributes: true,
            attribute_filter: Some(filter.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Watch everything below the target
    pub fn subtree_all() -> Self {
        Self {
            child_list: true,
            attributes: true,
            subtree: true,
            attribute_filter: None,
        }
    }

    fn wants_attribute(&self, name: &str) -> bool {
        self.attributes
            && self
                .attribute_filter
                .as_ref()
                .is_none_or(|filter| filter.iter().any(|f| f == name))
    }
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

impl MutationRecord {
    pub(crate) fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }

    pub(crate) fn child_list(target: NodeId, added: Option<NodeId>, removed: Option<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added.into_iter().collect(),
            removed_nodes: removed.into_iter().collect(),
            attribute_name: None,
            old_value: None,
        }
    }
}

impl MutationObserver {
    pub(crate) fn new() -> Self {
        Self {
            observed: Vec::new(),
            records: Vec::new(),
        }
    }

    pub(crate) fn observe(&mut self, target: NodeId, options: MutationObserverInit) {
        match self.observed.iter_mut().find(|(id, _)| *id == target) {
            Some(entry) => entry.1 = options,
            None => self.observed.push((target, options)),
        }
    }

    pub(crate) fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    /// Queue `record` if any registration matches. `in_subtree` answers
    /// whether the record target lies below a registered node.
    pub(crate) fn offer(&mut self, record: &MutationRecord, in_subtree: impl Fn(NodeId) -> bool) {
        let matches = self.observed.iter().any(|(target, options)| {
            let kind_ok = match record.mutation_type {
                MutationType::Attributes => record
                    .attribute_name
                    .as_deref()
                    .is_some_and(|name| options.wants_attribute(name)),
                MutationType::ChildList => options.child_list,
            };
            kind_ok && (*target == record.target || (options.subtree && in_subtree(*target)))
        });
        if matches {
            self.records.push(record.clone());
        }
    }

    /// Targets this observer watches
    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.observed.iter().map(|(id, _)| *id)
    }
}
