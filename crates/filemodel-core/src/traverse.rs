//! Generic walk over a model tree
//!
//! A [`TreeTraverser`] is configured with up to four callbacks and threads an
//! accumulator through a depth-first walk starting at one node. Children are
//! taken from [`ModelNode::children`] in schema order.
//!
//! ```
//! use filemodel_core::{ChildField, ModelArena, ModelId, ModelNode, TreeTraverser};
//!
//! #[derive(Debug)]
//! struct Dir(Vec<ModelId>);
//!
//! impl ModelNode for Dir {
//!     fn kind(&self) -> &'static str {
//!         "dir"
//!     }
//!
//!     fn children(&self) -> Vec<ChildField> {
//!         vec![ChildField::many("entries", &self.0)]
//!     }
//! }
//!
//! let mut models = ModelArena::new();
//! let leaf = models.insert(Dir(vec![]));
//! let root = models.insert(Dir(vec![leaf]));
//!
//! let order = TreeTraverser::new()
//!     .post_visit(|_, id, mut acc: Vec<ModelId>| {
//!         acc.push(id);
//!         Ok(acc)
//!     })
//!     .traverse(&mut models, root, Vec::new())
//!     .unwrap();
//!
//! assert_eq!(order, vec![leaf, root]);
//! ```

use crate::arena::{ModelArena, ModelId};
use crate::model::ModelNode;
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;

type Predicate<'f, Acc> = Box<dyn Fn(&dyn ModelNode, &Acc) -> bool + 'f>;
type Visitor<'f, Acc> = Box<dyn FnMut(&mut ModelArena, ModelId, Acc) -> Result<Acc> + 'f>;

/// Depth-first traversal with optional pre- and post-order callbacks.
///
/// Unset predicates accept every node and unset visitors leave the
/// accumulator untouched. Each node is visited at most once per call to
/// [`traverse`](Self::traverse), so a node shared by several parents is only
/// processed under the first of them.
pub struct TreeTraverser<'f, Acc> {
    should_descend: Option<Predicate<'f, Acc>>,
    should_visit: Option<Predicate<'f, Acc>>,
    pre_visit: Option<Visitor<'f, Acc>>,
    post_visit: Option<Visitor<'f, Acc>>,
}

impl<Acc> Default for TreeTraverser<'_, Acc> {
    fn default() -> Self {
        Self {
            should_descend: None,
            should_visit: None,
            pre_visit: None,
            post_visit: None,
        }
    }
}

impl<Acc> fmt::Debug for TreeTraverser<'_, Acc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeTraverser")
            .field("should_descend", &self.should_descend.is_some())
            .field("should_visit", &self.should_visit.is_some())
            .field("pre_visit", &self.pre_visit.is_some())
            .field("post_visit", &self.post_visit.is_some())
            .finish()
    }
}

impl<'f, Acc> TreeTraverser<'f, Acc> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only recurse into children for which `f` holds.
    pub fn should_descend<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn ModelNode, &Acc) -> bool + 'f,
    {
        self.should_descend = Some(Box::new(f));
        self
    }

    /// Only run the visitors on nodes for which `f` holds.
    pub fn should_visit<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn ModelNode, &Acc) -> bool + 'f,
    {
        self.should_visit = Some(Box::new(f));
        self
    }

    /// Callback run before a node's children are walked.
    pub fn pre_visit<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut ModelArena, ModelId, Acc) -> Result<Acc> + 'f,
    {
        self.pre_visit = Some(Box::new(f));
        self
    }

    /// Callback run after all of a node's children were walked.
    pub fn post_visit<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut ModelArena, ModelId, Acc) -> Result<Acc> + 'f,
    {
        self.post_visit = Some(Box::new(f));
        self
    }

    /// Walk the tree under `root`, returning the final accumulator.
    ///
    /// The first callback error aborts the walk and is returned as is.
    pub fn traverse(&mut self, models: &mut ModelArena, root: ModelId, acc: Acc) -> Result<Acc> {
        if models.node(root).is_none() {
            return Err(Error::ModelMissing { id: root });
        }
        let mut visited = HashSet::new();
        self.walk(models, root, acc, &mut visited)
    }

    fn walk(
        &mut self,
        models: &mut ModelArena,
        id: ModelId,
        mut acc: Acc,
        visited: &mut HashSet<ModelId>,
    ) -> Result<Acc> {
        if !visited.insert(id) {
            return Ok(acc);
        }

        if self.visits(models, id, &acc) {
            if let Some(pre) = self.pre_visit.as_mut() {
                acc = pre(models, id, acc)?;
            }
        }

        // Children are read after the pre-visit so it can add or replace them
        let children: Vec<ModelId> = match models.node(id) {
            Some(node) => node.children().into_iter().flat_map(|field| field.ids).collect(),
            None => return Ok(acc),
        };

        for child in children {
            let descend = match models.node(child) {
                Some(node) => self
                    .should_descend
                    .as_ref()
                    .is_none_or(|descend| descend(node, &acc)),
                // Removed or still under construction
                None => false,
            };
            if descend {
                acc = self.walk(models, child, acc, visited)?;
            }
        }

        if self.visits(models, id, &acc) {
            if let Some(post) = self.post_visit.as_mut() {
                acc = post(models, id, acc)?;
            }
        }

        Ok(acc)
    }

    fn visits(&self, models: &ModelArena, id: ModelId, acc: &Acc) -> bool {
        match models.node(id) {
            Some(node) => self
                .should_visit
                .as_ref()
                .is_none_or(|visit| visit(node, acc)),
            None => false,
        }
    }
}
