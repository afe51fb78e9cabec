//! Visibility unification pass
//!
//! Hidden objects would be silently skipped by the host operators the
//! pipeline drives, so everything reachable is revealed before preparation
//! starts. Every flag that gets cleared is written to the run's
//! [`RestorationRecord`] so restoration can put it back. Excluded
//! collection subtrees stay untouched: their contents are outside the view
//! layer and never export anyway.

use crate::export::RestorationRecord;
use crate::scene::{CollectionKey, NodeKey, Scene, SceneError};

/// Reveal every reachable collection and object, recording prior state
pub(crate) fn unify(scene: &mut Scene, record: &mut RestorationRecord) -> Result<(), SceneError> {
    unify_collections(scene, scene.root_collection(), record)?;
    unify_objects(scene, record)?;
    log::debug!(
        "Cleared {} object and {} collection visibility flags",
        record.hidden_objects.len() + record.disabled_objects.len(),
        record.hidden_collections.len() + record.disabled_collections.len()
    );
    Ok(())
}

fn unify_collections(
    scene: &mut Scene,
    collection: CollectionKey,
    record: &mut RestorationRecord,
) -> Result<(), SceneError> {
    if scene.collection(collection)?.is_excluded() {
        return Ok(());
    }
    let children: Vec<CollectionKey> = scene.collection(collection)?.children().to_vec();
    for &child in &children {
        let c = scene.collection(child)?;
        if !c.is_excluded() && c.is_hidden() {
            record.hidden_collections.push(child);
            scene.set_collection_hidden(child, false)?;
        }
    }
    for &child in &children {
        let c = scene.collection(child)?;
        if !c.is_excluded() && c.is_disabled() {
            record.disabled_collections.push(child);
            scene.set_collection_disabled(child, false)?;
        }
    }
    for child in children {
        unify_collections(scene, child, record)?;
    }
    Ok(())
}

fn unify_objects(scene: &mut Scene, record: &mut RestorationRecord) -> Result<(), SceneError> {
    let keys: Vec<NodeKey> = scene.objects().collect();
    for key in keys {
        if !scene.in_view_layer(key)? {
            continue;
        }
        if scene.node(key)?.is_hidden() {
            record.hidden_objects.push(key);
            scene.set_hidden(key, false)?;
        }
        if scene.node(key)?.is_disabled() {
            record.disabled_objects.push(key);
            scene.set_disabled(key, false)?;
        }
    }
    Ok(())
}
