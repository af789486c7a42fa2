// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Distributed object reference counting.
//!
//! The registry is the ground truth for when an owner may unpin a plasma
//! object: the supervisor parks a `WaitForObjectEviction` reply per pinned
//! object, and the delete callback attached here releases it. Each object
//! has exactly one owner for its lifetime; borrowers record the owner's
//! identity so the object can be re-serialized.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use hive_common::id::{ObjectId, TaskId};
use hive_proto::rpc::Address;

/// Fires at most once, when the local reference record dies.
pub type DeleteCallback = Box<dyn FnOnce(ObjectId) + Send>;

struct Reference {
    local_ref_count: u64,
    owner: Option<(TaskId, Address)>,
    owned_by_us: bool,
    delete_callback: Option<DeleteCallback>,
    contained_object_ids: HashSet<ObjectId>,
}

impl Reference {
    fn new() -> Self {
        Self {
            local_ref_count: 0,
            owner: None,
            owned_by_us: false,
            delete_callback: None,
            contained_object_ids: HashSet::new(),
        }
    }
}

/// Process-wide registry mapping ObjectId to its reference record.
pub struct ReferenceCounter {
    refs: Mutex<HashMap<ObjectId, Reference>>,
}

impl Default for ReferenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceCounter {
    pub fn new() -> Self {
        Self {
            refs: Mutex::new(HashMap::new()),
        }
    }

    /// Register an object created by this worker. The creator holds the
    /// first local reference.
    pub fn add_owned_object(&self, object_id: ObjectId, owner_id: TaskId, owner_address: Address) {
        let mut refs = self.refs.lock();
        let entry = refs.entry(object_id).or_insert_with(Reference::new);
        entry.owned_by_us = true;
        entry.owner = Some((owner_id, owner_address));
        entry.local_ref_count += 1;
    }

    /// Register an object owned by another worker. The owner identity is
    /// authoritative once known; re-registration merges.
    pub fn add_borrowed_object(
        &self,
        object_id: ObjectId,
        owner_id: TaskId,
        owner_address: Address,
    ) {
        let mut refs = self.refs.lock();
        let entry = refs.entry(object_id).or_insert_with(Reference::new);
        if entry.owner.is_none() {
            entry.owner = Some((owner_id, owner_address));
        }
    }

    /// Record that `object_id`'s payload references `contained` ids.
    /// Containment does not yet gate eviction.
    pub fn add_contained_object_ids(&self, object_id: ObjectId, contained: &[ObjectId]) {
        let mut refs = self.refs.lock();
        let entry = refs.entry(object_id).or_insert_with(Reference::new);
        entry.contained_object_ids.extend(contained.iter().copied());
    }

    pub fn add_local_reference(&self, object_id: ObjectId) {
        let mut refs = self.refs.lock();
        let entry = refs.entry(object_id).or_insert_with(Reference::new);
        entry.local_ref_count += 1;
    }

    /// Drop one local reference. When the count reaches zero the record is
    /// removed and its delete callback fires (exactly once).
    pub fn remove_local_reference(&self, object_id: &ObjectId) -> Vec<ObjectId> {
        let mut deleted = Vec::new();
        let callback = {
            let mut refs = self.refs.lock();
            let reached_zero = match refs.get_mut(object_id) {
                Some(entry) => {
                    entry.local_ref_count = entry.local_ref_count.saturating_sub(1);
                    entry.local_ref_count == 0
                }
                None => false,
            };
            if reached_zero {
                deleted.push(*object_id);
                refs.remove(object_id)
                    .and_then(|mut entry| entry.delete_callback.take())
            } else {
                None
            }
        };
        if let Some(cb) = callback {
            cb(*object_id);
        }
        deleted
    }

    /// The owner identity, absent when the object was constructed from
    /// random or out-of-band bytes.
    pub fn get_owner(&self, object_id: &ObjectId) -> Option<(TaskId, Address)> {
        self.refs
            .lock()
            .get(object_id)
            .and_then(|r| r.owner.clone())
    }

    pub fn owned_by_us(&self, object_id: &ObjectId) -> bool {
        self.refs
            .lock()
            .get(object_id)
            .is_some_and(|r| r.owned_by_us)
    }

    /// Attach the owner-side eviction trigger. Returns false if no record
    /// exists — the caller must reply to the supervisor immediately.
    pub fn set_delete_callback(&self, object_id: &ObjectId, callback: DeleteCallback) -> bool {
        let mut refs = self.refs.lock();
        match refs.get_mut(object_id) {
            Some(entry) => {
                entry.delete_callback = Some(callback);
                true
            }
            None => false,
        }
    }

    /// Explicitly drop references; delete callbacks fire.
    pub fn delete_references(&self, object_ids: &[ObjectId]) {
        let mut callbacks = Vec::new();
        {
            let mut refs = self.refs.lock();
            for object_id in object_ids {
                if let Some(mut entry) = refs.remove(object_id) {
                    if let Some(cb) = entry.delete_callback.take() {
                        callbacks.push((*object_id, cb));
                    }
                }
            }
        }
        for (object_id, cb) in callbacks {
            cb(object_id);
        }
    }

    pub fn has_reference(&self, object_id: &ObjectId) -> bool {
        self.refs.lock().contains_key(object_id)
    }

    /// Diagnostic: number of ObjectIds with live records.
    pub fn num_object_ids_in_scope(&self) -> usize {
        self.refs.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn make_address() -> Address {
        Address {
            raylet_id: vec![0u8; 16],
            ip_address: "127.0.0.1".to_string(),
            port: 1234,
            worker_id: vec![0u8; 16],
        }
    }

    fn make_id(v: u8) -> ObjectId {
        let mut data = [0u8; ObjectId::SIZE];
        data[0] = v;
        ObjectId::from_binary(&data)
    }

    #[test]
    fn test_owned_object_starts_with_one_reference() {
        let rc = ReferenceCounter::new();
        let oid = make_id(1);
        rc.add_owned_object(oid, TaskId::from_random(), make_address());
        assert!(rc.owned_by_us(&oid));
        assert_eq!(rc.num_object_ids_in_scope(), 1);
        // The creator's single reference keeps it alive; one removal frees.
        let deleted = rc.remove_local_reference(&oid);
        assert_eq!(deleted, vec![oid]);
        assert_eq!(rc.num_object_ids_in_scope(), 0);
    }

    #[test]
    fn test_exactly_one_owner_for_lifetime() {
        let rc = ReferenceCounter::new();
        let oid = make_id(1);
        let owner_task = TaskId::from_random();
        rc.add_owned_object(oid, owner_task, make_address());
        // A later borrow registration must not displace the owner.
        rc.add_borrowed_object(oid, TaskId::from_random(), make_address());
        let (got_task, _) = rc.get_owner(&oid).unwrap();
        assert_eq!(got_task, owner_task);
        assert!(rc.owned_by_us(&oid));
    }

    #[test]
    fn test_borrowed_object_owner_recorded() {
        let rc = ReferenceCounter::new();
        let oid = make_id(2);
        let owner_task = TaskId::from_random();
        let addr = make_address();
        rc.add_borrowed_object(oid, owner_task, addr.clone());
        assert!(!rc.owned_by_us(&oid));
        let (got_task, got_addr) = rc.get_owner(&oid).unwrap();
        assert_eq!(got_task, owner_task);
        assert_eq!(got_addr.ip_address, addr.ip_address);
    }

    #[test]
    fn test_get_owner_absent_for_untracked() {
        let rc = ReferenceCounter::new();
        assert!(rc.get_owner(&make_id(9)).is_none());
    }

    #[test]
    fn test_local_reference_counting() {
        let rc = ReferenceCounter::new();
        let oid = make_id(3);
        rc.add_local_reference(oid);
        rc.add_local_reference(oid);
        assert!(rc.remove_local_reference(&oid).is_empty());
        assert!(rc.has_reference(&oid));
        assert_eq!(rc.remove_local_reference(&oid), vec![oid]);
        assert!(!rc.has_reference(&oid));
    }

    #[test]
    fn test_remove_nonexistent_is_noop() {
        let rc = ReferenceCounter::new();
        assert!(rc.remove_local_reference(&make_id(4)).is_empty());
    }

    #[test]
    fn test_delete_callback_fires_exactly_once() {
        let rc = ReferenceCounter::new();
        let oid = make_id(5);
        rc.add_local_reference(oid);

        let fired = Arc::new(AtomicU32::new(0));
        let fired2 = fired.clone();
        assert!(rc.set_delete_callback(&oid, Box::new(move |_| {
            fired2.fetch_add(1, Ordering::Relaxed);
        })));

        rc.remove_local_reference(&oid);
        assert_eq!(fired.load(Ordering::Relaxed), 1);
        // A second delete of the now-absent record must not refire.
        rc.delete_references(&[oid]);
        assert_eq!(fired.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_set_delete_callback_without_record() {
        let rc = ReferenceCounter::new();
        assert!(!rc.set_delete_callback(&make_id(6), Box::new(|_| {})));
    }

    #[test]
    fn test_delete_references_fires_callbacks() {
        let rc = ReferenceCounter::new();
        let oid = make_id(7);
        rc.add_owned_object(oid, TaskId::from_random(), make_address());

        let fired = Arc::new(AtomicU32::new(0));
        let fired2 = fired.clone();
        rc.set_delete_callback(&oid, Box::new(move |_| {
            fired2.fetch_add(1, Ordering::Relaxed);
        }));

        rc.delete_references(&[oid]);
        assert_eq!(fired.load(Ordering::Relaxed), 1);
        assert!(!rc.has_reference(&oid));
    }

    #[test]
    fn test_contained_object_ids_recorded() {
        let rc = ReferenceCounter::new();
        let parent = make_id(8);
        let child = make_id(9);
        rc.add_owned_object(parent, TaskId::from_random(), make_address());
        rc.add_contained_object_ids(parent, &[child]);
        // Containment is metadata only; the child has no record of its own.
        assert!(rc.has_reference(&parent));
        assert!(!rc.has_reference(&child));
    }
}
