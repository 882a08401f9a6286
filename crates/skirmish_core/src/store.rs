//! Entity and component storage.
//!
//! Every known component type has its own strongly-typed map from
//! [`EntityId`] to component value. The [`Component`] trait ties a type to
//! its map so that [`ComponentStore::get`], [`ComponentStore::assign`] and
//! friends are resolved at compile time with no runtime type casting.
//!
//! Iteration order is entity creation order everywhere. Systems that scan
//! "all entities" rely on this for deterministic tie-breaks.
//!
//! # Example
//!
//! ```
//! use skirmish_core::components::{Health, Transform};
//! use skirmish_core::math::{Fixed, Vec3Fixed};
//! use skirmish_core::store::ComponentStore;
//!
//! let mut store = ComponentStore::new();
//! let id = store.create_entity();
//! store.assign(id, Transform::at(Vec3Fixed::ZERO)).unwrap();
//! store.assign(id, Health::new(Fixed::from_num(50))).unwrap();
//!
//! assert_eq!(store.query::<Health>(), vec![id]);
//! store.remove_entity(id);
//! assert!(store.get::<Health>(id).is_none());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::{
    Attacker, Defender, EntityId, Health, PlayerAffiliation, Portal, Renderable, Tile, Transform,
};
use crate::error::{GameError, Result};

/// Per-type component map.
pub type ComponentMap<T> = HashMap<EntityId, T>;

mod sealed {
    pub trait Sealed {}
}

/// A component type known to the [`ComponentStore`].
///
/// The trait is sealed: the set of component types is fixed by this crate.
pub trait Component: sealed::Sealed + Sized {
    /// The store's map for this component type.
    fn map(store: &ComponentStore) -> &ComponentMap<Self>;

    /// The store's map for this component type, mutably.
    fn map_mut(store: &mut ComponentStore) -> &mut ComponentMap<Self>;
}

macro_rules! register_components {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Component for $ty {
                fn map(store: &ComponentStore) -> &ComponentMap<Self> {
                    &store.$field
                }

                fn map_mut(store: &mut ComponentStore) -> &mut ComponentMap<Self> {
                    &mut store.$field
                }
            }
        )*

        impl ComponentStore {
            fn clear_components(&mut self, entity: EntityId) {
                $( self.$field.remove(&entity); )*
            }
        }
    };
}

/// Storage for all entities and their components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStore {
    /// Live entities in creation order.
    entities: Vec<EntityId>,
    /// Next entity ID to assign.
    next_id: EntityId,
    transforms: ComponentMap<Transform>,
    healths: ComponentMap<Health>,
    attackers: ComponentMap<Attacker>,
    defenders: ComponentMap<Defender>,
    affiliations: ComponentMap<PlayerAffiliation>,
    renderables: ComponentMap<Renderable>,
    portals: ComponentMap<Portal>,
    tiles: ComponentMap<Tile>,
}

register_components! {
    Transform => transforms,
    Health => healths,
    Attacker => attackers,
    Defender => defenders,
    PlayerAffiliation => affiliations,
    Renderable => renderables,
    Portal => portals,
    Tile => tiles,
}

impl ComponentStore {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
            transforms: HashMap::new(),
            healths: HashMap::new(),
            attackers: HashMap::new(),
            defenders: HashMap::new(),
            affiliations: HashMap::new(),
            renderables: HashMap::new(),
            portals: HashMap::new(),
            tiles: HashMap::new(),
        }
    }

    /// Allocate a fresh entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(id);
        tracing::trace!(entity = id, "Entity created");
        id
    }

    /// Allocate a fresh entity and attach components to it in one chain.
    pub fn spawn(&mut self) -> EntityBuilder<'_> {
        let id = self.create_entity();
        EntityBuilder { store: self, id }
    }

    /// Check if an entity is live.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        // Live ids are pushed in increasing order, so the list stays sorted.
        self.entities.binary_search(&entity).is_ok()
    }

    /// Insert or overwrite the single `T` attached to `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidEntity`] if the entity is not live.
    pub fn assign<T: Component>(&mut self, entity: EntityId, component: T) -> Result<()> {
        if !self.contains(entity) {
            return Err(GameError::InvalidEntity(entity));
        }
        T::map_mut(self).insert(entity, component);
        Ok(())
    }

    /// Get the `T` attached to `entity`, if any.
    #[must_use]
    pub fn get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        T::map(self).get(&entity)
    }

    /// Get the `T` attached to `entity` mutably, if any.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        T::map_mut(self).get_mut(&entity)
    }

    /// Check whether `entity` carries a `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        T::map(self).contains_key(&entity)
    }

    /// Detach and return the `T` attached to `entity`.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        T::map_mut(self).remove(&entity)
    }

    /// Every live entity carrying a `T`, in creation order.
    ///
    /// This is a full scan of the live set on every call.
    #[must_use]
    pub fn query<T: Component>(&self) -> Vec<EntityId> {
        let map = T::map(self);
        self.entities
            .iter()
            .copied()
            .filter(|id| map.contains_key(id))
            .collect()
    }

    /// Remove an entity and all of its components.
    ///
    /// Removing an entity that does not exist is a no-op. Returns whether
    /// anything was removed.
    pub fn remove_entity(&mut self, entity: EntityId) -> bool {
        let Ok(index) = self.entities.binary_search(&entity) else {
            return false;
        };
        self.entities.remove(index);
        self.clear_components(entity);
        tracing::trace!(entity, "Entity removed");
        true
    }

    /// All live entities in creation order.
    #[must_use]
    pub fn all_entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Get the number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Attaches components to a freshly spawned entity.
///
/// The entity is live for the builder's whole lifetime, so attaching
/// cannot fail.
#[must_use = "call `id()` to get the spawned entity"]
pub struct EntityBuilder<'a> {
    store: &'a mut ComponentStore,
    id: EntityId,
}

impl EntityBuilder<'_> {
    /// Attach `component`, replacing any earlier one of the same type.
    pub fn with<T: Component>(self, component: T) -> Self {
        T::map_mut(self.store).insert(self.id, component);
        self
    }

    /// The spawned entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }
}

impl Default for ComponentStore {
    fn default() -> Self {
        Self::new()
    }
}
