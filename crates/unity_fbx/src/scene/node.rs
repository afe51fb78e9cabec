//! Scene objects and their transform state

use crate::foundation::math::Mat4;
use crate::scene::{NodeKey, PayloadKey};

/// Object kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Plain transform node without a payload
    Empty,
    /// Polygonal geometry
    Mesh,
    /// Skeleton with bone rest positions
    Armature,
    /// Curve geometry
    Curve,
    /// Surface geometry
    Surface,
    /// Text geometry
    Font,
    /// Camera object
    Camera,
    /// Light object
    Light,
}

impl ObjectKind {
    /// Kinds that start an export hierarchy when parentless
    pub fn is_exportable_root(self) -> bool {
        matches!(
            self,
            Self::Empty | Self::Mesh | Self::Armature | Self::Curve | Self::Surface | Self::Font
        )
    }

    /// Kinds the convert-to-mesh operator accepts
    pub fn is_convertible(self) -> bool {
        matches!(self, Self::Mesh | Self::Curve | Self::Surface | Self::Font)
    }
}

/// Modifier kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKind {
    /// Skeletal deform binding; exempts its object from modifier baking
    Armature,
    /// Subdivision surface
    Subdivision,
    /// Mirror duplication
    Mirror,
    /// Edge bevel
    Bevel,
}

/// An entry in an object's modifier stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    /// Display name
    pub name: String,

    /// What the modifier does
    pub kind: ModifierKind,

    /// Whether the modifier currently takes effect
    pub enabled: bool,
}

impl Modifier {
    /// Create an enabled modifier
    pub fn new(name: &str, kind: ModifierKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            enabled: true,
        }
    }
}

/// A node in the scene hierarchy
///
/// Transform state follows the authoring-tool split: `basis` holds the
/// authored channels, `parent_inverse` the correction captured at parenting
/// time, and `world` a cache rebuilt by [`crate::scene::Scene::update`].
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) name: String,
    pub(crate) kind: ObjectKind,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) payload: Option<PayloadKey>,
    pub(crate) parent_inverse: Mat4,
    pub(crate) basis: Mat4,
    pub(crate) world: Mat4,
    pub(crate) hidden: bool,
    pub(crate) disabled: bool,
    pub(crate) selected: bool,
    pub(crate) modifiers: Vec<Modifier>,
}

impl SceneNode {
    pub(crate) fn new(name: String, kind: ObjectKind) -> Self {
        Self {
            name,
            kind,
            parent: None,
            children: Vec::new(),
            payload: None,
            parent_inverse: Mat4::identity(),
            basis: Mat4::identity(),
            world: Mat4::identity(),
            hidden: false,
            disabled: false,
            selected: false,
            modifiers: Vec::new(),
        }
    }

    /// Object name, unique within the scene
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object kind tag
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Parent object, if any
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Child objects in attachment order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Geometry payload, if any
    pub fn payload(&self) -> Option<PayloadKey> {
        self.payload
    }

    /// Cached world matrix from the last recompute
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// Local matrix: parent-inverse correction times basis for parented
    /// objects, bare basis otherwise
    pub fn local_matrix(&self) -> Mat4 {
        if self.parent.is_some() {
            self.parent_inverse * self.basis
        } else {
            self.basis
        }
    }

    /// Authored transform channels
    pub fn basis(&self) -> Mat4 {
        self.basis
    }

    /// Correction captured when the object was parented
    pub fn parent_inverse(&self) -> Mat4 {
        self.parent_inverse
    }

    /// Whether the object is individually hidden
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether the object is disabled in the viewport
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether the object is selected
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Modifier stack in evaluation order
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Whether the stack holds an enabled modifier of `kind`
    pub fn has_enabled_modifier(&self, kind: ModifierKind) -> bool {
        self.modifiers.iter().any(|m| m.enabled && m.kind == kind)
    }

    /// Number of enabled modifiers of any kind
    pub fn enabled_modifier_count(&self) -> usize {
        self.modifiers.iter().filter(|m| m.enabled).count()
    }
}
