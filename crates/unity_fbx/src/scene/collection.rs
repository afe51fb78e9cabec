//! Collections and view-layer membership
//!
//! Collections form a tree rooted at the scene's root collection and own
//! object membership. The tree is orthogonal to object parenting: an object
//! deep in a hierarchy can live in a different collection than its parent.
//!
//! Three flags control what the view layer sees. `excluded` removes a whole
//! subtree from the view layer. `hidden` and `disabled` keep membership but
//! hide the members, which would silence host operators if the visibility
//! unifier did not lift them for the duration of an export run.

use crate::scene::{CollectionKey, NodeKey};

/// Named group of objects inside the collection tree
#[derive(Debug, Clone)]
pub struct Collection {
    pub(crate) name: String,
    pub(crate) parent: Option<CollectionKey>,
    pub(crate) children: Vec<CollectionKey>,
    pub(crate) members: Vec<NodeKey>,
    pub(crate) excluded: bool,
    pub(crate) hidden: bool,
    pub(crate) disabled: bool,
}

impl Collection {
    pub(crate) fn new(name: String, parent: Option<CollectionKey>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            members: Vec::new(),
            excluded: false,
            hidden: false,
            disabled: false,
        }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent collection; `None` only for the root
    pub fn parent(&self) -> Option<CollectionKey> {
        self.parent
    }

    /// Child collections in creation order
    pub fn children(&self) -> &[CollectionKey] {
        &self.children
    }

    /// Member objects in link order
    pub fn members(&self) -> &[NodeKey] {
        &self.members
    }

    /// Whether this subtree is excluded from the view layer
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    /// Whether this collection is hidden in the viewport
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether this collection is disabled in the viewport
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}
