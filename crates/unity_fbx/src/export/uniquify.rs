//! Shared-payload uniquification pass
//!
//! Rotation baking writes into payload points, so two objects sharing one
//! payload would both receive the first object's bake. Before any baking,
//! every multi-referenced payload is split into per-object copies. Walking
//! objects in creation order means each sharer sees a shrinking referencer
//! set, and the final sharer keeps the original payload.
//!
//! Splits that are safe to merge back are written to the run's
//! [`RestorationRecord`]: mesh objects whose sharing group carries no
//! enabled modifier anywhere. Everything else stays split until rollback,
//! since a modifier bake gives each copy different points.

use crate::export::RestorationRecord;
use crate::scene::{NodeKey, ObjectKind, Scene, SceneError};

/// Give every sharing object its own payload copy, recording re-mergeable
/// splits
pub(crate) fn uniquify(
    scene: &mut Scene,
    record: &mut RestorationRecord,
) -> Result<(), SceneError> {
    let keys: Vec<NodeKey> = scene.objects().collect();
    for key in keys {
        let Some(payload) = scene.node(key)?.payload() else {
            continue;
        };
        if scene.payload_user_count(payload)? <= 1 {
            continue;
        }
        let referencers = scene.payload_referencers(payload)?;
        if referencers.len() <= 1 {
            continue;
        }
        if scene.node(key)?.kind() == ObjectKind::Mesh {
            let mut stack_total = 0;
            for &user in &referencers {
                stack_total += scene.node(user)?.enabled_modifier_count();
            }
            if stack_total == 0 {
                record
                    .shared_payloads
                    .insert(scene.node(key)?.name().to_owned(), payload);
            }
        }
        log::debug!(
            "Splitting payload '{}' for '{}'",
            scene.payload(payload)?.name(),
            scene.node(key)?.name()
        );
        let copy = scene.copy_payload(payload)?;
        scene.assign_payload(key, Some(copy))?;
    }
    Ok(())
}
