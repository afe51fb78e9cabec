//! In-memory scene-graph host
//!
//! Models the authoring-tool state the export pipeline operates on:
//! named objects in parent/child hierarchies, geometry payloads with
//! reference counting, a collection tree driving view-layer membership and
//! visibility, and the host-side operators the pipeline invokes (rotation
//! bake, convert to mesh, snapshot and rollback).

pub mod collection;
pub mod graph;
pub mod node;
pub mod payload;

pub use collection::Collection;
pub use graph::{InteractionMode, Scene, SceneError, SceneSnapshot};
pub use node::{Modifier, ModifierKind, ObjectKind, SceneNode};
pub use payload::GeometryPayload;

use crate::foundation::collections::TypedHandle;

/// Stable handle to a scene object
pub type NodeKey = TypedHandle<SceneNode>;

/// Stable handle to a geometry payload
pub type PayloadKey = TypedHandle<GeometryPayload>;

/// Stable handle to a collection
pub type CollectionKey = TypedHandle<Collection>;
