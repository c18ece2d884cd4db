//! Handler-side store of decoded scene objects.
//!
//! The session never keeps decoded objects; it only emits events. A host that
//! wants a local copy of the remote scene applies those events to a
//! [`SceneMirror`], or installs a [`MirrorHandler`] which does so for it.
//!
//! Objects are keyed by filename and [`IdScope`]: numeric ids are unique only
//! within one scope, so an item and a group may share an id.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use crate::{
    client::SceneHandler,
    codec::{RefacetBatch, RefacetItem, SceneObject, Transaction},
    message::ObjectKind,
};

/// Partition of the id space within one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdScope {
    /// Solids, sheets, wires and unrecognised kinds.
    Item,
    /// Groups.
    Group,
    /// Empties.
    Empty,
}

impl IdScope {
    /// Every scope, in lookup order.
    pub const ALL: [Self; 3] = [Self::Item, Self::Group, Self::Empty];

    /// Scope that objects of `kind` are stored in.
    ///
    /// # Examples
    ///
    /// ```
    /// use livelink::{message::ObjectKind, mirror::IdScope};
    ///
    /// assert_eq!(IdScope::of(ObjectKind::Group), IdScope::Group);
    /// assert_eq!(IdScope::of(ObjectKind::Wire), IdScope::Item);
    /// ```
    #[must_use]
    pub const fn of(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Group => Self::Group,
            ObjectKind::Empty => Self::Empty,
            _ => Self::Item,
        }
    }
}

/// One mirrored object.
#[derive(Clone, Debug, PartialEq)]
pub struct MirroredObject {
    /// Record from the last add, update or list that named this object.
    pub object: SceneObject,
    /// Geometry from the last refacet reply since that record arrived.
    pub facets: Option<RefacetItem>,
}

impl MirroredObject {
    /// Version of the newest data applied to this object.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.facets
            .as_ref()
            .map_or(self.object.version, |facets| facets.version)
    }
}

/// Mirrored contents of one file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileScene {
    version: Option<u32>,
    scopes: HashMap<IdScope, BTreeMap<u32, MirroredObject>>,
}

impl FileScene {
    /// Version of the last change applied, if any carried one.
    #[must_use]
    pub const fn version(&self) -> Option<u32> { self.version }

    /// Look up `id` within `scope`.
    #[must_use]
    pub fn get(&self, scope: IdScope, id: u32) -> Option<&MirroredObject> {
        self.scopes.get(&scope)?.get(&id)
    }

    /// Ids stored in `scope`, ascending.
    pub fn ids(&self, scope: IdScope) -> impl Iterator<Item = u32> + '_ {
        self.scopes.get(&scope).into_iter().flat_map(|objects| objects.keys().copied())
    }

    /// Number of objects stored in `scope`.
    #[must_use]
    pub fn len(&self, scope: IdScope) -> usize { self.scopes.get(&scope).map_or(0, BTreeMap::len) }

    /// Returns `true` if no scope holds an object.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.scopes.values().all(BTreeMap::is_empty) }

    fn upsert(&mut self, object: SceneObject) {
        let scope = IdScope::of(object.kind);
        self.scopes.entry(scope).or_default().insert(
            object.id,
            MirroredObject {
                object,
                facets: None,
            },
        );
    }

    // Delete ids carry no kind; the first scope holding the id wins.
    fn remove(&mut self, id: u32) -> bool {
        IdScope::ALL.into_iter().any(|scope| {
            self.scopes
                .get_mut(&scope)
                .is_some_and(|objects| objects.remove(&id).is_some())
        })
    }
}

/// Counts of what a transaction changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Records inserted or replaced.
    pub upserted: usize,
    /// Objects removed.
    pub removed: usize,
    /// Delete ids that matched nothing.
    pub missing: usize,
}

/// Local copy of the remote scene, keyed by filename and id scope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneMirror {
    files: HashMap<String, FileScene>,
}

impl SceneMirror {
    /// Create an empty mirror.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Mirrored contents of `filename`.
    #[must_use]
    pub fn file(&self, filename: &str) -> Option<&FileScene> { self.files.get(filename) }

    /// Look up one object.
    #[must_use]
    pub fn get(&self, filename: &str, scope: IdScope, id: u32) -> Option<&MirroredObject> {
        self.files.get(filename)?.get(scope, id)
    }

    /// Names of every mirrored file, in no particular order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> { self.files.keys().map(String::as_str) }

    /// Forget every file.
    pub fn clear(&mut self) { self.files.clear(); }

    /// Start `filename` afresh, discarding anything mirrored for it.
    pub fn new_file(&mut self, filename: &str) { self.files.insert(filename.to_owned(), FileScene::default()); }

    /// Record that `filename` is now at `version`.
    pub fn set_version(&mut self, filename: &str, version: u32) {
        self.files.entry(filename.to_owned()).or_default().version = Some(version);
    }

    /// Apply deletes, then adds, then updates.
    ///
    /// A transaction for a file the mirror has not seen starts that file.
    pub fn apply_transaction(&mut self, transaction: &Transaction) -> ApplySummary {
        let scene = self.files.entry(transaction.filename.clone()).or_default();
        scene.version = Some(transaction.version);

        let mut summary = ApplySummary::default();
        for id in &transaction.delete {
            match u32::try_from(*id) {
                Ok(id) if scene.remove(id) => summary.removed += 1,
                _ => summary.missing += 1,
            }
        }
        for object in transaction.add.iter().chain(&transaction.update) {
            scene.upsert(object.clone());
            summary.upserted += 1;
        }
        summary
    }

    /// Replace the contents of the list's file with the listed objects.
    ///
    /// A list reply is a full snapshot, so objects it does not name are
    /// removed from every scope.
    pub fn apply_list(&mut self, list: &Transaction) -> ApplySummary {
        let previous = self
            .files
            .insert(list.filename.clone(), FileScene::default())
            .unwrap_or_default();
        let scene = self.files.entry(list.filename.clone()).or_default();
        scene.version = Some(list.version);

        let mut summary = ApplySummary::default();
        for object in list.add.iter().chain(&list.update) {
            scene.upsert(object.clone());
            summary.upserted += 1;
        }
        summary.removed = IdScope::ALL
            .into_iter()
            .flat_map(|scope| previous.ids(scope).map(move |id| (scope, id)))
            .filter(|(scope, id)| scene.get(*scope, *id).is_none())
            .count();
        summary
    }

    /// Attach refaceted geometry to known items.
    ///
    /// Only the item scope is patched. Returns the ids that matched no
    /// mirrored item; nothing is created for them.
    pub fn apply_refacet(&mut self, batch: &RefacetBatch) -> Vec<u32> {
        let Some(items) = self
            .files
            .get_mut(&batch.filename)
            .and_then(|scene| scene.scopes.get_mut(&IdScope::Item))
        else {
            return batch.ids().collect();
        };

        let mut unknown = Vec::new();
        for item in &batch.items {
            match items.get_mut(&item.id) {
                Some(entry) => entry.facets = Some(item.clone()),
                None => unknown.push(item.id),
            }
        }
        unknown
    }
}

/// [`SceneHandler`] that keeps a [`SceneMirror`] current.
///
/// The mirror is cleared when the session ends.
#[derive(Debug, Default)]
pub struct MirrorHandler {
    mirror: Mutex<SceneMirror>,
}

impl MirrorHandler {
    /// Create a handler with an empty mirror.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Lock the mirror for reading or editing.
    pub fn lock(&self) -> MutexGuard<'_, SceneMirror> { self.mirror.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Copy of the current mirror.
    #[must_use]
    pub fn snapshot(&self) -> SceneMirror { self.lock().clone() }
}

impl SceneHandler for MirrorHandler {
    fn on_connect(&self) { self.lock().clear(); }

    fn on_disconnect(&self) { self.lock().clear(); }

    fn on_new_file(&self, filename: &str) { self.lock().new_file(filename); }

    fn on_new_version(&self, filename: &str, version: u32) { self.lock().set_version(filename, version); }

    fn on_transaction(&self, transaction: Transaction) {
        let summary = self.lock().apply_transaction(&transaction);
        debug!(
            filename = %transaction.filename,
            version = transaction.version,
            upserted = summary.upserted,
            removed = summary.removed,
            missing = summary.missing,
            "transaction mirrored"
        );
    }

    fn on_list(&self, transaction: Transaction) {
        let summary = self.lock().apply_list(&transaction);
        debug!(
            filename = %transaction.filename,
            objects = summary.upserted,
            removed = summary.removed,
            "list mirrored"
        );
    }

    fn on_refacet(&self, batch: RefacetBatch) {
        let unknown = self.lock().apply_refacet(&batch);
        if !unknown.is_empty() {
            debug!(filename = %batch.filename, ?unknown, "refacet for unknown items");
        }
    }
}
