//! The live object set and the per-frame update
//!
//! Adds and destroys are buffered like component changes on a game object:
//! they land in side lists during the frame and are applied by
//! `commit_updates`, so objects can spawn or kill other objects mid-update.

use glam::Vec2;

use super::component::Phase;
use super::context::{EngineContext, FrameContext, ObjectCommands};
use super::object::{ActivationRadius, GameObject, ObjectId};
use super::tick::TickInput;

/// Spawn/destroy requests one frame can raise
const MAX_FRAME_COMMANDS: usize = 64;

#[derive(Debug)]
pub struct GameObjectManager {
    objects: Vec<GameObject>,
    pending_add: Vec<GameObject>,
    pending_destroy: Vec<ObjectId>,
    destroy_all: bool,
    player: Option<ObjectId>,
    focus: Option<Vec2>,
    commands: ObjectCommands,
}

impl GameObjectManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            pending_add: Vec::with_capacity(capacity),
            pending_destroy: Vec::with_capacity(capacity),
            destroy_all: false,
            player: None,
            focus: None,
            commands: ObjectCommands::new(MAX_FRAME_COMMANDS),
        }
    }

    /// Queue an object; it joins the live set at the next commit
    pub fn add(&mut self, object: GameObject) {
        self.pending_add.push(object);
    }

    /// Queue destruction of one object
    pub fn destroy(&mut self, id: ObjectId) {
        if !self.pending_destroy.contains(&id) {
            self.pending_destroy.push(id);
        }
    }

    /// Queue destruction of every object, including ones still pending
    pub fn destroy_all(&mut self) {
        self.destroy_all = true;
    }

    pub fn set_player(&mut self, id: Option<ObjectId>) {
        self.player = id;
    }

    pub fn player_id(&self) -> Option<ObjectId> {
        self.player
    }

    pub fn player(&self) -> Option<&GameObject> {
        self.get(self.player?)
    }

    /// Override the activation focal point (defaults to the player's center)
    pub fn set_focus(&mut self, focus: Option<Vec2>) {
        self.focus = focus;
    }

    pub fn focal_point(&self) -> Option<Vec2> {
        self.focus.or_else(|| self.player().map(GameObject::center))
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_active()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_add.len()
    }

    /// Toggle activation by distance to the focal point. With no focal point
    /// everything stays active.
    fn update_activation(&mut self) {
        let focal = self.focal_point();
        for object in self.objects.iter_mut() {
            let active = match (object.activation_radius, focal) {
                (ActivationRadius::Always, _) | (_, None) => true,
                (ActivationRadius::Within(radius), Some(point)) => {
                    object.center().distance_squared(point) <= radius * radius
                }
            };
            if !active && object.destroy_on_deactivation && !self.pending_destroy.contains(&object.id()) {
                self.pending_destroy.push(object.id());
            }
            object.set_active(active);
        }
    }

    /// Run one frame: every active object's components, phase by phase.
    /// Within a phase, objects run in live-set order.
    pub fn update(&mut self, ctx: &mut EngineContext, input: &TickInput, dt: f32) {
        self.update_activation();
        let player_position = self.player().map(GameObject::center);

        let mut frame = FrameContext {
            collision: &mut ctx.collision,
            input,
            player_position,
            commands: &mut self.commands,
        };
        run_phases(&mut self.objects, |phase, object| {
            object.update_phase(phase, dt, &mut frame)
        });
    }

    /// Apply everything buffered since the last commit: frame commands,
    /// destroys, per-object component changes, then additions.
    pub fn commit_updates(&mut self, ctx: &mut EngineContext) {
        for id in self.commands.take_destroys() {
            if !self.pending_destroy.contains(&id) {
                self.pending_destroy.push(id);
            }
        }
        for request in self.commands.take_spawns() {
            match ctx.factory.spawn(request.kind, request.position, request.flip) {
                Ok(object) => self.pending_add.push(object),
                Err(err) => log::warn!("Skipping {} spawn: {}", request.kind.name(), err),
            }
        }

        if self.destroy_all {
            self.destroy_all = false;
            self.pending_destroy.clear();
            let count = self.objects.len() + self.pending_add.len();
            for object in self.objects.drain(..).chain(self.pending_add.drain(..)) {
                ctx.factory.destroy(object);
            }
            self.player = None;
            log::info!("Destroyed all {} objects", count);
            return;
        }

        for id in self.pending_destroy.drain(..) {
            let index = self.objects.iter().position(|o| o.id() == id);
            let object = match index {
                Some(index) => Some(self.objects.remove(index)),
                None => self
                    .pending_add
                    .iter()
                    .position(|o| o.id() == id)
                    .map(|index| self.pending_add.remove(index)),
            };
            match object {
                Some(object) => {
                    if self.player == Some(id) {
                        log::info!("Player {:?} destroyed", id);
                        self.player = None;
                    }
                    ctx.factory.destroy(object);
                }
                None => log::debug!("Destroy requested for unknown object {:?}", id),
            }
        }

        let pools = ctx.factory.components_mut();
        for object in self.objects.iter_mut() {
            object.commit_updates(pools);
        }
        for mut object in self.pending_add.drain(..) {
            object.commit_updates(pools);
            self.objects.push(object);
        }
    }
}

/// Phase-major walk: every active object sees a phase before any object sees the next
fn run_phases(objects: &mut [GameObject], mut visit: impl FnMut(Phase, &mut GameObject)) {
    for phase in Phase::ALL {
        for object in objects.iter_mut().filter(|o| o.is_active()) {
            visit(phase, object);
        }
    }
}
