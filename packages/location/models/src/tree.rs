//! Arena-backed location hierarchy.
//!
//! Locations are stored in a flat arena and looked up by id through an
//! index. Children are recorded as arena indices on their main branch, in
//! the order they were supplied, so lookups never need to walk the tree.

use std::collections::BTreeMap;

use crate::{Location, LocationId, LocationLevel};

/// A validated two-level location hierarchy.
#[derive(Debug, Clone, Default)]
pub struct LocationTree {
    nodes: Vec<Location>,
    index: BTreeMap<LocationId, usize>,
    children: BTreeMap<usize, Vec<usize>>,
}

/// Error returned when a set of locations does not form a valid hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// Two locations share the same id.
    DuplicateId(LocationId),
    /// A sub-branch or unit has no parent.
    MissingParent(LocationId),
    /// A main branch declares a parent.
    UnexpectedParent(LocationId),
    /// A parent id does not refer to any known location.
    UnknownParent {
        /// The child declaring the parent.
        id: LocationId,
        /// The parent id that could not be resolved.
        parent_id: LocationId,
    },
    /// A parent id refers to a location that is not a main branch.
    ParentNotMainBranch {
        /// The child declaring the parent.
        id: LocationId,
        /// The parent id, which resolves to a sub-branch or unit.
        parent_id: LocationId,
    },
}

impl std::fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate location id {id}"),
            Self::MissingParent(id) => write!(f, "location {id} has no parent main branch"),
            Self::UnexpectedParent(id) => write!(f, "main branch {id} must not have a parent"),
            Self::UnknownParent { id, parent_id } => {
                write!(f, "location {id} refers to unknown parent {parent_id}")
            }
            Self::ParentNotMainBranch { id, parent_id } => {
                write!(f, "location {id} has parent {parent_id} which is not a main branch")
            }
        }
    }
}

impl std::error::Error for HierarchyError {}

impl LocationTree {
    /// Builds a hierarchy from a flat list of locations.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError`] if ids are duplicated or a parent
    /// reference breaks the main-branch / child invariant.
    pub fn new(locations: Vec<Location>) -> Result<Self, HierarchyError> {
        let mut index = BTreeMap::new();
        for (i, location) in locations.iter().enumerate() {
            if index.insert(location.id.clone(), i).is_some() {
                return Err(HierarchyError::DuplicateId(location.id.clone()));
            }
        }

        let mut children: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, location) in locations.iter().enumerate() {
            match (location.level, &location.parent_id) {
                (LocationLevel::MainBranch, None) => {}
                (LocationLevel::MainBranch, Some(_)) => {
                    return Err(HierarchyError::UnexpectedParent(location.id.clone()));
                }
                (LocationLevel::SubBranch | LocationLevel::Unit, None) => {
                    return Err(HierarchyError::MissingParent(location.id.clone()));
                }
                (LocationLevel::SubBranch | LocationLevel::Unit, Some(parent_id)) => {
                    let Some(&parent) = index.get(parent_id) else {
                        return Err(HierarchyError::UnknownParent {
                            id: location.id.clone(),
                            parent_id: parent_id.clone(),
                        });
                    };
                    if !locations[parent].level.owns_children() {
                        return Err(HierarchyError::ParentNotMainBranch {
                            id: location.id.clone(),
                            parent_id: parent_id.clone(),
                        });
                    }
                    children.entry(parent).or_default().push(i);
                }
            }
        }

        Ok(Self {
            nodes: locations,
            index,
            children,
        })
    }

    /// Looks up a location by id.
    #[must_use]
    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Returns the direct children of `id` in insertion order.
    ///
    /// Empty for unknown ids and for sub-branches and units.
    pub fn children<'a>(
        &'a self,
        id: &LocationId,
    ) -> impl Iterator<Item = &'a Location> + use<'a> {
        self.index
            .get(id)
            .and_then(|i| self.children.get(i))
            .into_iter()
            .flatten()
            .map(|&i| &self.nodes[i])
    }

    /// Returns all main branches in insertion order.
    pub fn main_branches(&self) -> impl Iterator<Item = &Location> {
        self.nodes
            .iter()
            .filter(|l| l.level == LocationLevel::MainBranch)
    }

    /// Returns the main branch a location belongs to (itself for a main
    /// branch).
    #[must_use]
    pub fn main_branch_of(&self, id: &LocationId) -> Option<&Location> {
        let location = self.get(id)?;
        match &location.parent_id {
            None => Some(location),
            Some(parent_id) => self.get(parent_id),
        }
    }

    /// Iterates over every location in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.nodes.iter()
    }

    /// Number of locations in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no locations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
