//! Scene store and host operators
//!
//! [`Scene`] owns the object, payload and collection arenas and exposes the
//! accessor contract the export pipeline is written against. World matrices
//! are caches: plain setters leave them untouched and [`Scene::update`]
//! rebuilds every cache top-down, so all cached reads between two rebuilds
//! see one consistent evaluation of the graph. The two host operators that
//! mirror authoring-tool behavior, [`Scene::apply_rotation_to_selected`]
//! and [`Scene::convert_selected_to_mesh`], end with a rebuild themselves.

use crate::foundation::collections::HandleMap;
use crate::foundation::math::{Mat4, Point3, Transform};
use crate::scene::{
    Collection, CollectionKey, GeometryPayload, Modifier, NodeKey, ObjectKind, PayloadKey,
    SceneNode,
};
use thiserror::Error;

/// Host interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Object-level editing; the only mode host operators run in
    #[default]
    Object,
    /// Component-level editing
    Edit,
    /// Armature posing
    Pose,
}

/// In-memory scene-graph host
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: HandleMap<SceneNode>,
    payloads: HandleMap<GeometryPayload>,
    collections: HandleMap<Collection>,
    object_order: Vec<NodeKey>,
    collection_order: Vec<CollectionKey>,
    root_collection: CollectionKey,
    mode: InteractionMode,
}

/// Deep copy of the scene used for rollback
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    scene: Scene,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene holding only the root collection
    pub fn new() -> Self {
        let mut collections = HandleMap::default();
        let root = CollectionKey::new(
            collections.insert(Collection::new(String::from("Scene Collection"), None)),
        );
        Self {
            nodes: HandleMap::default(),
            payloads: HandleMap::default(),
            collections,
            object_order: Vec::new(),
            collection_order: vec![root],
            root_collection: root,
            mode: InteractionMode::Object,
        }
    }

    // ----- construction ---------------------------------------------------

    /// Add an object to the root collection
    ///
    /// Duplicate names are suffixed (`Cube`, `Cube.001`, ...).
    pub fn add_object(&mut self, name: &str, kind: ObjectKind) -> NodeKey {
        let unique = unique_name(name, |candidate| self.object_name_taken(candidate));
        let key = NodeKey::new(self.nodes.insert(SceneNode::new(unique, kind)));
        self.object_order.push(key);
        if let Some(root) = self.collections.get_mut(self.root_collection.key()) {
            root.members.push(key);
        }
        key
    }

    /// Add an object as a member of `collection`
    pub fn add_object_in(
        &mut self,
        name: &str,
        kind: ObjectKind,
        collection: CollectionKey,
    ) -> Result<NodeKey, SceneError> {
        self.collection(collection)?;
        let unique = unique_name(name, |candidate| self.object_name_taken(candidate));
        let key = NodeKey::new(self.nodes.insert(SceneNode::new(unique, kind)));
        self.object_order.push(key);
        if let Some(owner) = self.collections.get_mut(collection.key()) {
            owner.members.push(key);
        }
        Ok(key)
    }

    /// Add a child collection under `parent`
    pub fn add_collection(
        &mut self,
        name: &str,
        parent: CollectionKey,
    ) -> Result<CollectionKey, SceneError> {
        self.collection(parent)?;
        let unique = unique_name(name, |candidate| self.collection_name_taken(candidate));
        let key = CollectionKey::new(
            self.collections
                .insert(Collection::new(unique, Some(parent))),
        );
        self.collection_order.push(key);
        if let Some(owner) = self.collections.get_mut(parent.key()) {
            owner.children.push(key);
        }
        Ok(key)
    }

    /// Link an existing object into an additional collection
    pub fn link_object(
        &mut self,
        node: NodeKey,
        collection: CollectionKey,
    ) -> Result<(), SceneError> {
        self.node(node)?;
        self.collection(collection)?;
        if let Some(owner) = self.collections.get_mut(collection.key()) {
            if !owner.members.contains(&node) {
                owner.members.push(node);
            }
        }
        Ok(())
    }

    /// Register a geometry payload
    pub fn add_payload(&mut self, name: &str, points: Vec<Point3>) -> PayloadKey {
        let unique = unique_name(name, |candidate| self.payload_name_taken(candidate));
        PayloadKey::new(self.payloads.insert(GeometryPayload::new(unique, points)))
    }

    /// Point an object at a payload, or detach it with `None`
    pub fn assign_payload(
        &mut self,
        node: NodeKey,
        payload: Option<PayloadKey>,
    ) -> Result<(), SceneError> {
        if let Some(key) = payload {
            self.payload(key)?;
        }
        self.node_mut(node)?.payload = payload;
        Ok(())
    }

    /// Pin or unpin a payload with a fake user
    pub fn set_payload_fake_user(
        &mut self,
        payload: PayloadKey,
        fake_user: bool,
    ) -> Result<(), SceneError> {
        self.payload_mut(payload)?.fake_user = fake_user;
        Ok(())
    }

    /// Attach a modifier to the end of an object's stack
    pub fn add_modifier(&mut self, node: NodeKey, modifier: Modifier) -> Result<(), SceneError> {
        self.node_mut(node)?.modifiers.push(modifier);
        Ok(())
    }

    /// Toggle a modifier by stack position
    pub fn set_modifier_enabled(
        &mut self,
        node: NodeKey,
        index: usize,
        enabled: bool,
    ) -> Result<(), SceneError> {
        let modifiers = &mut self.node_mut(node)?.modifiers;
        let modifier = modifiers.get_mut(index).ok_or(SceneError::UnknownModifier)?;
        modifier.enabled = enabled;
        Ok(())
    }

    // ----- access ---------------------------------------------------------

    /// Look up an object
    pub fn node(&self, key: NodeKey) -> Result<&SceneNode, SceneError> {
        self.nodes.get(key.key()).ok_or(SceneError::UnknownObject)
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut SceneNode, SceneError> {
        self.nodes
            .get_mut(key.key())
            .ok_or(SceneError::UnknownObject)
    }

    /// Look up a payload
    pub fn payload(&self, key: PayloadKey) -> Result<&GeometryPayload, SceneError> {
        self.payloads
            .get(key.key())
            .ok_or(SceneError::UnknownPayload)
    }

    fn payload_mut(&mut self, key: PayloadKey) -> Result<&mut GeometryPayload, SceneError> {
        self.payloads
            .get_mut(key.key())
            .ok_or(SceneError::UnknownPayload)
    }

    /// Look up a collection
    pub fn collection(&self, key: CollectionKey) -> Result<&Collection, SceneError> {
        self.collections
            .get(key.key())
            .ok_or(SceneError::UnknownCollection)
    }

    fn collection_mut(&mut self, key: CollectionKey) -> Result<&mut Collection, SceneError> {
        self.collections
            .get_mut(key.key())
            .ok_or(SceneError::UnknownCollection)
    }

    /// All objects in creation order
    pub fn objects(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.object_order.iter().copied()
    }

    /// Number of objects in the scene
    pub fn object_count(&self) -> usize {
        self.object_order.len()
    }

    /// Find an object by name
    pub fn find_object(&self, name: &str) -> Option<NodeKey> {
        self.objects()
            .find(|&key| self.nodes.get(key.key()).is_some_and(|n| n.name == name))
    }

    /// The scene's root collection
    pub fn root_collection(&self) -> CollectionKey {
        self.root_collection
    }

    /// Current interaction mode
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Switch the interaction mode
    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    // ----- hierarchy ------------------------------------------------------

    /// Parent `child` under `parent` with an identity correction
    ///
    /// The child's world placement changes unless the parent's world matrix
    /// is the identity; use [`Scene::set_parent_keep_transform`] to preserve
    /// placement.
    pub fn set_parent(&mut self, child: NodeKey, parent: NodeKey) -> Result<(), SceneError> {
        self.link_child(child, parent)?;
        self.node_mut(child)?.parent_inverse = Mat4::identity();
        Ok(())
    }

    /// Parent `child` under `parent` while preserving the child's current
    /// world placement
    ///
    /// Captures the parent's inverted world matrix as the child's
    /// parent-inverse correction, the way authoring tools implement
    /// "keep transform" parenting. This is the operation that puts
    /// non-trivial corrections into a scene.
    pub fn set_parent_keep_transform(
        &mut self,
        child: NodeKey,
        parent: NodeKey,
    ) -> Result<(), SceneError> {
        let world = self.resolved_world(child)?;
        let parent_world = self.resolved_world(parent)?;
        let inverse = parent_world
            .try_inverse()
            .ok_or_else(|| self.non_invertible(parent))?;
        self.link_child(child, parent)?;
        let node = self.node_mut(child)?;
        node.basis = world;
        node.parent_inverse = inverse;
        Ok(())
    }

    fn link_child(&mut self, child: NodeKey, parent: NodeKey) -> Result<(), SceneError> {
        self.node(child)?;
        let mut cursor = Some(parent);
        while let Some(key) = cursor {
            if key == child {
                return Err(SceneError::ParentCycle {
                    child: self.node(child)?.name.clone(),
                    parent: self.node(parent)?.name.clone(),
                });
            }
            cursor = self.node(key)?.parent;
        }
        if let Some(old) = self.node(child)?.parent {
            if let Some(node) = self.nodes.get_mut(old.key()) {
                node.children.retain(|&key| key != child);
            }
        }
        if let Some(node) = self.nodes.get_mut(parent.key()) {
            node.children.push(child);
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    // ----- selection ------------------------------------------------------

    /// Select or deselect one object
    pub fn set_selected(&mut self, node: NodeKey, selected: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.selected = selected;
        Ok(())
    }

    /// Deselect everything, then select exactly `node`
    pub fn select_only(&mut self, node: NodeKey) -> Result<(), SceneError> {
        self.node(node)?;
        self.clear_selection();
        self.set_selected(node, true)
    }

    /// Deselect every object
    pub fn clear_selection(&mut self) {
        for node in self.nodes.values_mut() {
            node.selected = false;
        }
    }

    /// Selected objects in creation order
    pub fn selected_objects(&self) -> Vec<NodeKey> {
        self.objects()
            .filter(|&key| self.nodes.get(key.key()).is_some_and(|n| n.selected))
            .collect()
    }

    // ----- visibility -----------------------------------------------------

    /// Hide or show one object
    pub fn set_hidden(&mut self, node: NodeKey, hidden: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.hidden = hidden;
        Ok(())
    }

    /// Disable or enable one object in the viewport
    pub fn set_disabled(&mut self, node: NodeKey, disabled: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.disabled = disabled;
        Ok(())
    }

    /// Hide or show a collection; the root collection is always shown
    pub fn set_collection_hidden(
        &mut self,
        collection: CollectionKey,
        hidden: bool,
    ) -> Result<(), SceneError> {
        if collection == self.root_collection {
            return Err(SceneError::RootCollection);
        }
        self.collection_mut(collection)?.hidden = hidden;
        Ok(())
    }

    /// Disable or enable a collection; the root collection is always enabled
    pub fn set_collection_disabled(
        &mut self,
        collection: CollectionKey,
        disabled: bool,
    ) -> Result<(), SceneError> {
        if collection == self.root_collection {
            return Err(SceneError::RootCollection);
        }
        self.collection_mut(collection)?.disabled = disabled;
        Ok(())
    }

    /// Exclude or include a collection subtree; the root collection is
    /// always included
    pub fn set_collection_excluded(
        &mut self,
        collection: CollectionKey,
        excluded: bool,
    ) -> Result<(), SceneError> {
        if collection == self.root_collection {
            return Err(SceneError::RootCollection);
        }
        self.collection_mut(collection)?.excluded = excluded;
        Ok(())
    }

    /// Whether some containing collection reaches the object without
    /// crossing an excluded collection
    pub fn in_view_layer(&self, node: NodeKey) -> Result<bool, SceneError> {
        self.node(node)?;
        for key in self.collections_of(node) {
            if self.collection_chain_included(key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether host operators can act on the object
    ///
    /// Requires view-layer membership, clear object flags, and at least one
    /// containing collection whose chain is fully shown and enabled.
    pub fn is_object_visible(&self, node: NodeKey) -> Result<bool, SceneError> {
        let n = self.node(node)?;
        if n.hidden || n.disabled {
            return Ok(false);
        }
        for key in self.collections_of(node) {
            if self.collection_chain_shown(key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn collections_of(&self, node: NodeKey) -> Vec<CollectionKey> {
        self.collection_order
            .iter()
            .copied()
            .filter(|&key| {
                self.collections
                    .get(key.key())
                    .is_some_and(|c| c.members.contains(&node))
            })
            .collect()
    }

    fn collection_chain_included(&self, start: CollectionKey) -> Result<bool, SceneError> {
        let mut cursor = start;
        loop {
            let collection = self.collection(cursor)?;
            if collection.excluded {
                return Ok(false);
            }
            match collection.parent {
                Some(parent) => cursor = parent,
                None => return Ok(true),
            }
        }
    }

    fn collection_chain_shown(&self, start: CollectionKey) -> Result<bool, SceneError> {
        let mut cursor = start;
        loop {
            let collection = self.collection(cursor)?;
            if collection.excluded || collection.hidden || collection.disabled {
                return Ok(false);
            }
            match collection.parent {
                Some(parent) => cursor = parent,
                None => return Ok(true),
            }
        }
    }

    // ----- matrices -------------------------------------------------------

    /// Cached world matrix from the last [`Scene::update`]
    pub fn world_matrix(&self, node: NodeKey) -> Result<Mat4, SceneError> {
        Ok(self.node(node)?.world_matrix())
    }

    /// Local matrix (parent-inverse correction times basis)
    pub fn local_matrix(&self, node: NodeKey) -> Result<Mat4, SceneError> {
        Ok(self.node(node)?.local_matrix())
    }

    /// Set the local matrix, keeping the parent-inverse correction
    ///
    /// Solves the basis so that correction times basis equals `value`.
    pub fn set_local_matrix(&mut self, node: NodeKey, value: Mat4) -> Result<(), SceneError> {
        let n = self.node(node)?;
        let basis = if n.parent.is_some() {
            let inverse = n
                .parent_inverse
                .try_inverse()
                .ok_or_else(|| self.non_invertible(node))?;
            inverse * value
        } else {
            value
        };
        self.node_mut(node)?.basis = basis;
        Ok(())
    }

    /// Authored transform channels
    pub fn basis(&self, node: NodeKey) -> Result<Mat4, SceneError> {
        Ok(self.node(node)?.basis())
    }

    /// Replace the authored transform channels
    pub fn set_basis(&mut self, node: NodeKey, basis: Mat4) -> Result<(), SceneError> {
        self.node_mut(node)?.basis = basis;
        Ok(())
    }

    /// Parent-inverse correction
    pub fn parent_inverse(&self, node: NodeKey) -> Result<Mat4, SceneError> {
        Ok(self.node(node)?.parent_inverse())
    }

    /// Replace the parent-inverse correction
    pub fn set_parent_inverse(&mut self, node: NodeKey, value: Mat4) -> Result<(), SceneError> {
        self.node_mut(node)?.parent_inverse = value;
        Ok(())
    }

    /// Fold the parent-inverse correction into the basis
    ///
    /// Reads the cached world matrices, so the basis afterwards expresses
    /// the same placement the last recompute saw, with an identity
    /// correction. No effect on parentless objects.
    pub fn reset_parent_inverse(&mut self, node: NodeKey) -> Result<(), SceneError> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(());
        };
        let world = self.node(node)?.world_matrix();
        let inverse = self
            .node(parent)?
            .world_matrix()
            .try_inverse()
            .ok_or_else(|| self.non_invertible(parent))?;
        let n = self.node_mut(node)?;
        n.parent_inverse = Mat4::identity();
        n.basis = inverse * world;
        Ok(())
    }

    /// Rebuild every world-matrix cache top-down
    pub fn update(&mut self) {
        let roots: Vec<NodeKey> = self
            .objects()
            .filter(|&key| self.nodes.get(key.key()).is_some_and(|n| n.parent.is_none()))
            .collect();
        for root in roots {
            self.update_subtree(root, Mat4::identity());
        }
    }

    fn update_subtree(&mut self, key: NodeKey, parent_world: Mat4) {
        let Some(node) = self.nodes.get_mut(key.key()) else {
            return;
        };
        node.world = parent_world * node.local_matrix();
        let world = node.world;
        let children = node.children.clone();
        for child in children {
            self.update_subtree(child, world);
        }
    }

    fn resolved_world(&self, key: NodeKey) -> Result<Mat4, SceneError> {
        let node = self.node(key)?;
        let local = node.local_matrix();
        match node.parent {
            Some(parent) => Ok(self.resolved_world(parent)? * local),
            None => Ok(local),
        }
    }

    // ----- payload ownership ----------------------------------------------

    /// Reference count of a payload: referencing objects plus one for a
    /// fake user
    pub fn payload_user_count(&self, payload: PayloadKey) -> Result<usize, SceneError> {
        let fake = usize::from(self.payload(payload)?.fake_user);
        Ok(self.payload_referencers(payload)?.len() + fake)
    }

    /// Objects referencing a payload, in creation order
    pub fn payload_referencers(&self, payload: PayloadKey) -> Result<Vec<NodeKey>, SceneError> {
        self.payload(payload)?;
        Ok(self
            .objects()
            .filter(|&key| {
                self.nodes
                    .get(key.key())
                    .is_some_and(|n| n.payload == Some(payload))
            })
            .collect())
    }

    /// Deep-copy a payload under a suffixed name
    ///
    /// The copy starts with no referencers and no fake user.
    pub fn copy_payload(&mut self, payload: PayloadKey) -> Result<PayloadKey, SceneError> {
        let source = self.payload(payload)?;
        let base = strip_copy_suffix(&source.name).to_owned();
        let points = source.points.clone();
        let unique = unique_name(&base, |candidate| self.payload_name_taken(candidate));
        Ok(PayloadKey::new(
            self.payloads.insert(GeometryPayload::new(unique, points)),
        ))
    }

    // ----- host operators -------------------------------------------------

    /// Collapse the modifier stacks of the selected convertible objects and
    /// retag them as meshes
    ///
    /// Only visible objects of a convertible kind take part; anything else
    /// in the selection is left alone. Returns how many objects were
    /// converted; zero is a valid no-op.
    pub fn convert_selected_to_mesh(&mut self) -> Result<usize, SceneError> {
        self.require_object_mode()?;
        let mut converted = 0;
        for key in self.selected_objects() {
            if !self.is_object_visible(key)? {
                continue;
            }
            let node = self.node_mut(key)?;
            if !node.kind.is_convertible() {
                continue;
            }
            node.kind = ObjectKind::Mesh;
            node.modifiers.clear();
            converted += 1;
        }
        self.update();
        Ok(converted)
    }

    /// Bake the rotation channel of each selected visible object into its
    /// payload
    ///
    /// Per object: the basis is decomposed into translation, rotation and
    /// scale; payload points are transformed by the rotation; the basis is
    /// rewritten as translation times scale. Translation and scale channels
    /// are untouched. Direct children get their parent-inverse correction
    /// premultiplied so their world placement is unaffected.
    ///
    /// Fails on a payload with more than one referencing object; invisible
    /// selected objects are skipped without effect. Ends with a cache
    /// rebuild.
    pub fn apply_rotation_to_selected(&mut self) -> Result<usize, SceneError> {
        self.require_object_mode()?;
        let mut applied = 0;
        for key in self.selected_objects() {
            if !self.is_object_visible(key)? {
                continue;
            }
            if let Some(payload) = self.node(key)?.payload {
                if self.payload_referencers(payload)?.len() > 1 {
                    return Err(SceneError::SharedPayload {
                        object: self.node(key)?.name.clone(),
                        payload: self.payload(payload)?.name.clone(),
                    });
                }
            }
            let basis = self.node(key)?.basis;
            let channels = Transform::from_matrix(basis);
            if let Some(payload) = self.node(key)?.payload {
                let rotation = channels.rotation_matrix();
                self.payload_mut(payload)?.transform_points(&rotation);
            }
            let new_basis = channels.translation_scale_matrix();
            let compensation = new_basis
                .try_inverse()
                .ok_or_else(|| self.non_invertible(key))?
                * basis;
            self.node_mut(key)?.basis = new_basis;
            for child in self.node(key)?.children.clone() {
                let node = self.node_mut(child)?;
                node.parent_inverse = compensation * node.parent_inverse;
            }
            applied += 1;
        }
        self.update();
        Ok(applied)
    }

    fn require_object_mode(&self) -> Result<(), SceneError> {
        if self.mode == InteractionMode::Object {
            Ok(())
        } else {
            Err(SceneError::WrongMode {
                required: InteractionMode::Object,
                actual: self.mode,
            })
        }
    }

    // ----- snapshot -------------------------------------------------------

    /// Capture the complete scene state
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            scene: self.clone(),
        }
    }

    /// Restore the state captured by [`Scene::snapshot`]
    ///
    /// Handles taken before the snapshot remain valid afterwards.
    pub fn rollback(&mut self, snapshot: &SceneSnapshot) {
        *self = snapshot.scene.clone();
    }

    fn object_name_taken(&self, name: &str) -> bool {
        self.nodes.values().any(|n| n.name == name)
    }

    fn payload_name_taken(&self, name: &str) -> bool {
        self.payloads.values().any(|p| p.name == name)
    }

    fn collection_name_taken(&self, name: &str) -> bool {
        self.collections.values().any(|c| c.name == name)
    }

    fn non_invertible(&self, key: NodeKey) -> SceneError {
        let object = self
            .node(key)
            .map_or_else(|_| String::from("<unknown>"), |n| n.name.clone());
        SceneError::NonInvertible { object }
    }
}

fn unique_name<F: Fn(&str) -> bool>(base: &str, taken: F) -> String {
    if !taken(base) {
        return base.to_owned();
    }
    let mut index = 1;
    loop {
        let candidate = format!("{base}.{index:03}");
        if !taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

fn strip_copy_suffix(name: &str) -> &str {
    if let Some((stem, suffix)) = name.rsplit_once('.') {
        if suffix.len() == 3 && suffix.chars().all(|c| c.is_ascii_digit()) && !stem.is_empty() {
            return stem;
        }
    }
    name
}

/// Scene host errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// Object handle does not resolve
    #[error("unknown object handle")]
    UnknownObject,

    /// Payload handle does not resolve
    #[error("unknown payload handle")]
    UnknownPayload,

    /// Collection handle does not resolve
    #[error("unknown collection handle")]
    UnknownCollection,

    /// Modifier index out of range
    #[error("no modifier at that stack position")]
    UnknownModifier,

    /// Operator invoked in the wrong interaction mode
    #[error("operator requires {required:?} mode, scene is in {actual:?} mode")]
    WrongMode {
        /// Mode the operator needs
        required: InteractionMode,
        /// Mode the scene is in
        actual: InteractionMode,
    },

    /// Rotation bake hit a payload with multiple referencing objects
    #[error("cannot apply rotation to '{object}': payload '{payload}' has multiple users")]
    SharedPayload {
        /// Object the bake was applied to
        object: String,
        /// The shared payload
        payload: String,
    },

    /// A matrix that must be inverted is singular
    #[error("matrix for '{object}' is not invertible")]
    NonInvertible {
        /// Object owning the matrix
        object: String,
    },

    /// The root collection cannot be hidden, disabled or excluded
    #[error("the root collection is always visible")]
    RootCollection,

    /// Requested parenting would make an object its own ancestor
    #[error("parenting '{child}' to '{parent}' would create a cycle")]
    ParentCycle {
        /// Object being parented
        child: String,
        /// Requested parent
        parent: String,
    },
}
