use crate::sim::component::{Component, ComponentKind, Phase};
use crate::sim::context::FrameContext;
use crate::sim::object::{ActionType, GameObject, HitType};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LifeState {
    #[default]
    Alive,
    /// Death sequence running; seconds left before destruction is requested
    Dying(f32),
    Dead,
}

/// Ends an object's life.
///
/// Death starts when the timer runs out, when the object falls below
/// `die_below`, or when its life drops to zero. Control components are removed
/// at the next commit, and destruction is requested after `death_delay`.
#[derive(Debug, Clone, Default)]
pub struct LifetimeComponent {
    pub time_until_death: Option<f32>,
    pub die_below: Option<f32>,
    pub death_delay: f32,
    state: LifeState,
}

impl LifetimeComponent {
    pub fn state(&self) -> LifeState {
        self.state
    }

    fn begin_death(&mut self, parent: &mut GameObject) {
        log::debug!("Object {:?} dying", parent.id());
        parent.life = 0;
        parent.current_action = ActionType::Death;
        parent.last_received_hit_type = HitType::Death;
        parent.target_velocity = glam::Vec2::ZERO;
        parent.remove(ComponentKind::PlayerInput);
        parent.remove(ComponentKind::Patrol);
        self.state = LifeState::Dying(self.death_delay);
    }
}

impl Component for LifetimeComponent {
    const KIND: ComponentKind = ComponentKind::Lifetime;
    const PHASE: Phase = Phase::PostCollision;

    fn update(&mut self, dt: f32, parent: &mut GameObject, frame: &mut FrameContext<'_>) {
        if self.state == LifeState::Alive {
            if let Some(remaining) = self.time_until_death.as_mut() {
                *remaining -= dt;
            }
            let expired = self.time_until_death.is_some_and(|t| t <= 0.0);
            let fell_out = self.die_below.is_some_and(|floor| parent.position.y < floor);
            if expired || fell_out || parent.life <= 0 {
                self.begin_death(parent);
            }
        }

        if let LifeState::Dying(remaining) = self.state {
            if remaining <= 0.0 {
                frame.commands.destroy(parent.id());
                self.state = LifeState::Dead;
            } else {
                self.state = LifeState::Dying(remaining - dt);
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    super::downcasts!(Lifetime);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::components::test_support::Harness;
    use crate::sim::object::ObjectId;

    const DT: f32 = 0.25;

    #[test]
    fn test_timer_expiry_destroys_immediately_without_delay() {
        let mut harness = Harness::new();
        let mut dust = GameObject::new();
        dust.set_id(ObjectId(3));
        let mut lifetime = LifetimeComponent {
            time_until_death: Some(0.5),
            ..LifetimeComponent::default()
        };

        lifetime.update(DT, &mut dust, &mut harness.frame());
        assert_eq!(lifetime.state(), LifeState::Alive);
        assert_eq!(harness.commands.destroys().count(), 0);

        lifetime.update(DT, &mut dust, &mut harness.frame());
        assert_eq!(lifetime.state(), LifeState::Dead);
        assert_eq!(harness.commands.destroys().collect::<Vec<_>>(), vec![ObjectId(3)]);

        // Only requested once
        lifetime.update(DT, &mut dust, &mut harness.frame());
        assert_eq!(harness.commands.destroys().count(), 1);
    }

    #[test]
    fn test_falling_out_starts_death_sequence() {
        let mut harness = Harness::new();
        let mut player = GameObject::new();
        player.position.y = -10.0;
        let mut lifetime = LifetimeComponent {
            die_below: Some(0.0),
            death_delay: 0.5,
            ..LifetimeComponent::default()
        };

        lifetime.update(DT, &mut player, &mut harness.frame());
        assert!(matches!(lifetime.state(), LifeState::Dying(_)));
        assert_eq!(player.life, 0);
        assert_eq!(player.current_action, ActionType::Death);
        assert!(player.has_pending_changes());
        assert_eq!(harness.commands.destroys().count(), 0);

        lifetime.update(DT, &mut player, &mut harness.frame());
        lifetime.update(DT, &mut player, &mut harness.frame());
        assert_eq!(lifetime.state(), LifeState::Dead);
        assert_eq!(harness.commands.destroys().count(), 1);
    }

    #[test]
    fn test_zero_life_kills() {
        let mut harness = Harness::new();
        let mut enemy = GameObject::new();
        enemy.life = 0;
        let mut lifetime = LifetimeComponent::default();
        lifetime.update(DT, &mut enemy, &mut harness.frame());
        assert_eq!(lifetime.state(), LifeState::Dead);
        assert_eq!(enemy.last_received_hit_type, HitType::Death);
    }
}
