//! Component pool registry
//!
//! One fixed pool per component kind, kept sorted by kind so lookups are a
//! binary search. Shared archetype data never passes through here: it is not a
//! component, so it cannot be released per instance.

use super::component::{AnyComponent, Component, ComponentKind};
use super::pool::{FixedSizeArray, ObjectPool, PoolError};
use crate::settings::EngineSettings;

#[derive(Debug)]
pub struct ComponentPools {
    pools: FixedSizeArray<(ComponentKind, ObjectPool<AnyComponent>)>,
}

impl ComponentPools {
    /// Build and fill a pool for every kind. A capacity of 0 leaves the kind
    /// unregistered.
    pub fn new(capacity_for: impl Fn(ComponentKind) -> usize, fatal_on_exhaustion: bool) -> Self {
        let mut pools = FixedSizeArray::new(ComponentKind::ALL.len());
        for kind in ComponentKind::ALL {
            let capacity = capacity_for(kind);
            if capacity == 0 {
                log::debug!("Component pool '{}' disabled", kind.name());
                continue;
            }
            let mut pool = ObjectPool::new(kind.name(), capacity, || AnyComponent::new(kind));
            pool.set_fatal_on_exhaustion(fatal_on_exhaustion);
            let _ = pools.add((kind, pool));
        }
        pools.sort_by_key(|(kind, _)| *kind);
        Self { pools }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(|kind| settings.component_capacity(kind), settings.fatal_pool_exhaustion)
    }

    fn pool(&self, kind: ComponentKind) -> Option<&ObjectPool<AnyComponent>> {
        let index = self.pools.binary_search_by_key(&kind, |(k, _)| *k).ok()?;
        Some(&self.pools[index].1)
    }

    fn pool_mut(&mut self, kind: ComponentKind) -> Option<&mut ObjectPool<AnyComponent>> {
        let index = self.pools.binary_search_by_key(&kind, |(k, _)| *k).ok()?;
        Some(&mut self.pools[index].1)
    }

    pub fn allocate(&mut self, kind: ComponentKind) -> Result<AnyComponent, PoolError> {
        self.pool_mut(kind)
            .ok_or(PoolError::Unregistered(kind.name()))?
            .allocate()
    }

    /// Allocate a `C` and configure it before it is attached anywhere
    pub fn allocate_as<C: Component>(
        &mut self,
        configure: impl FnOnce(&mut C),
    ) -> Result<AnyComponent, PoolError> {
        let mut component = self.allocate(C::KIND)?;
        if let Some(typed) = C::downcast_mut(&mut component) {
            configure(typed);
        }
        Ok(component)
    }

    /// Return a component to its kind's pool
    pub fn release(&mut self, component: AnyComponent) {
        let kind = component.kind();
        match self.pool_mut(kind) {
            Some(pool) => pool.release(component),
            None => log::warn!("Released '{}' with no registered pool", kind.name()),
        }
    }

    pub fn allocated_count(&self, kind: ComponentKind) -> usize {
        self.pool(kind).map_or(0, ObjectPool::allocated_count)
    }

    pub fn capacity(&self, kind: ComponentKind) -> usize {
        self.pool(kind).map_or(0, ObjectPool::capacity)
    }

    pub fn total_allocated(&self) -> usize {
        self.pools.iter().map(|(_, pool)| pool.allocated_count()).sum()
    }

    /// Outstanding allocations per kind. Run between levels, when everything
    /// should have been released. Leaks are logged, never fatal.
    pub fn sanity_check(&self) -> Vec<(ComponentKind, usize)> {
        let leaks: Vec<_> = self
            .pools
            .iter()
            .filter(|(_, pool)| pool.allocated_count() > 0)
            .map(|(kind, pool)| (*kind, pool.allocated_count()))
            .collect();

        for (kind, count) in &leaks {
            if cfg!(debug_assertions) {
                log::error!("Component pool '{}' leaked {} instances", kind.name(), count);
            } else {
                log::warn!("Component pool '{}' leaked {} instances", kind.name(), count);
            }
        }
        leaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::components::{PatrolComponent, PhysicsComponent};

    #[test]
    fn test_routes_by_kind() {
        let mut pools = ComponentPools::new(|_| 2, false);
        let physics = pools.allocate(ComponentKind::Physics).unwrap();
        let patrol = pools.allocate(ComponentKind::Patrol).unwrap();
        assert_eq!(physics.kind(), ComponentKind::Physics);
        assert_eq!(pools.allocated_count(ComponentKind::Physics), 1);
        assert_eq!(pools.total_allocated(), 2);

        pools.release(physics);
        pools.release(patrol);
        assert_eq!(pools.total_allocated(), 0);
    }

    #[test]
    fn test_allocate_as_configures() {
        let mut pools = ComponentPools::new(|_| 1, false);
        let patrol = pools
            .allocate_as::<PatrolComponent>(|p| p.chase_radius = Some(32.0))
            .unwrap();
        assert_eq!(PatrolComponent::downcast_ref(&patrol).unwrap().chase_radius, Some(32.0));

        // Released instances come back reset
        pools.release(patrol);
        let patrol = pools.allocate(ComponentKind::Patrol).unwrap();
        assert_eq!(PatrolComponent::downcast_ref(&patrol).unwrap().chase_radius, None);
    }

    #[test]
    fn test_exhaustion_per_kind() {
        let mut pools = ComponentPools::new(|kind| kind.default_capacity().min(1), false);
        let _held = pools.allocate_as::<PhysicsComponent>(|_| {}).unwrap();
        assert!(matches!(
            pools.allocate(ComponentKind::Physics),
            Err(PoolError::Exhausted { name: "physics", .. })
        ));
        assert!(pools.allocate(ComponentKind::Gravity).is_ok());
    }

    #[test]
    fn test_zero_capacity_is_unregistered() {
        let mut pools = ComponentPools::new(
            |kind| if kind == ComponentKind::Animation { 0 } else { 4 },
            false,
        );
        assert_eq!(
            pools.allocate(ComponentKind::Animation).unwrap_err(),
            PoolError::Unregistered("animation")
        );
        assert_eq!(pools.capacity(ComponentKind::Animation), 0);
        assert_eq!(pools.capacity(ComponentKind::Lifetime), 4);
    }

    #[test]
    fn test_sanity_check_reports_leaks() {
        let mut pools = ComponentPools::new(|_| 4, false);
        let _a = pools.allocate(ComponentKind::Lifetime).unwrap();
        let _b = pools.allocate(ComponentKind::Lifetime).unwrap();
        let c = pools.allocate(ComponentKind::Gravity).unwrap();
        pools.release(c);

        assert_eq!(pools.sanity_check(), vec![(ComponentKind::Lifetime, 2)]);
    }
}
