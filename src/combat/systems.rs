//! Bevy glue: fighters as components, physics-backed hit queries and damage
//! routing through events.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::character::{CombatCharacter, HitWorld};
use super::damage::{Damageable, Health};
use super::defense::BlockOutcome;
use super::hitbox::{ColliderHit, ColliderId, DamageTargets, HitBuffer, HitSphere, LayerMask, Pose, SpatialQuery, TargetId};
use super::input::CombatInput;
use super::timeline::ClipPlayer;
use crate::config::CombatConfig;

/// A fighting character driven by the reference clip clock
#[derive(Component)]
pub struct Fighter(pub CombatCharacter<ClipPlayer>);

impl Fighter {
    pub fn from_config(config: &CombatConfig) -> Self {
        let clock = ClipPlayer::standard(config.animator.clone(), config.steps.step_count());
        Self(CombatCharacter::new(config, Some(clock)))
    }
}

/// Queryable body for the physics-less hit backend
#[derive(Component, Debug, Clone, Copy)]
pub struct Hurtbox {
    pub radius: f32,
    pub layers: u32,
    pub is_trigger: bool,
}

impl Default for Hurtbox {
    fn default() -> Self {
        Self {
            radius: 0.4,
            layers: 1,
            is_trigger: false,
        }
    }
}

/// Intent for a specific fighter
#[derive(Event, Debug, Clone, Copy)]
pub struct CombatInputEvent {
    pub entity: Entity,
    pub input: CombatInput,
}

/// Damage dealt by a fighter's hit moment
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageEvent {
    pub attacker: Entity,
    pub target: Entity,
    pub amount: i32,
    /// Attacker position when the hit landed
    pub origin: Vec3,
}

/// Damage from outside the combo system (hazards, scripted enemies)
#[derive(Event, Debug, Clone, Copy)]
pub struct IncomingHit {
    pub target: Entity,
    pub amount: i32,
    pub origin: Vec3,
    pub is_heavy: bool,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct GuardBroken {
    pub entity: Entity,
}

pub fn target_id(entity: Entity) -> TargetId {
    TargetId(entity.to_bits())
}

pub fn target_entity(target: TargetId) -> Option<Entity> {
    Entity::try_from_bits(target.0).ok()
}

fn collider_entity(collider: ColliderId) -> Option<Entity> {
    Entity::try_from_bits(collider.0).ok()
}

/// Sphere overlap through the rapier query pipeline, sensors excluded
pub struct RapierSpatialQuery<'a> {
    context: &'a RapierContext,
}

impl<'a> RapierSpatialQuery<'a> {
    pub fn new(context: &'a RapierContext) -> Self {
        Self { context }
    }
}

impl SpatialQuery for RapierSpatialQuery<'_> {
    fn overlap_sphere(&self, sphere: &HitSphere, layers: LayerMask, out: &mut HitBuffer) {
        let filter = QueryFilter::new()
            .exclude_sensors()
            .groups(CollisionGroups::new(Group::ALL, Group::from_bits_truncate(layers.0)));
        self.context.intersections_with_shape(
            sphere.center,
            Quat::IDENTITY,
            &Collider::ball(sphere.radius),
            filter,
            |entity| out.push(ColliderHit::solid(ColliderId(entity.to_bits()))),
        );
    }
}

/// Distance test over [`Hurtbox`] entities, used when no rapier context exists
#[derive(Debug, Default)]
pub struct HurtboxQuery {
    bodies: Vec<(Entity, Vec3, Hurtbox)>,
}

impl HurtboxQuery {
    pub fn new(bodies: Vec<(Entity, Vec3, Hurtbox)>) -> Self {
        Self { bodies }
    }

    pub fn collect(query: &Query<(Entity, &GlobalTransform, &Hurtbox)>) -> Self {
        Self::new(
            query
                .iter()
                .map(|(entity, transform, hurtbox)| (entity, transform.translation(), *hurtbox))
                .collect(),
        )
    }
}

impl SpatialQuery for HurtboxQuery {
    fn overlap_sphere(&self, sphere: &HitSphere, layers: LayerMask, out: &mut HitBuffer) {
        for (entity, position, hurtbox) in &self.bodies {
            if hurtbox.is_trigger || !layers.intersects(hurtbox.layers) {
                continue;
            }
            if sphere.overlaps(*position, hurtbox.radius)
                && !out.push(ColliderHit::solid(ColliderId(entity.to_bits())))
            {
                return;
            }
        }
    }
}

/// Resolves colliders up the `Parent` chain and collects damage for later application
struct EntityTargets<'a, 'w, 's> {
    parents: &'a Query<'w, 's, &'static Parent>,
    sinks: &'a Query<'w, 's, Entity, Or<(With<Health>, With<Fighter>)>>,
    pending: Vec<(Entity, i32)>,
}

impl DamageTargets for EntityTargets<'_, '_, '_> {
    fn resolve(&self, collider: ColliderId) -> Option<TargetId> {
        let mut entity = collider_entity(collider)?;
        loop {
            if self.sinks.contains(entity) {
                return Some(target_id(entity));
            }
            entity = self.parents.get(entity).ok()?.get();
        }
    }

    fn apply_damage(&mut self, target: TargetId, amount: i32) -> bool {
        match target_entity(target) {
            Some(entity) if self.sinks.contains(entity) => {
                self.pending.push((entity, amount));
                true
            }
            _ => false,
        }
    }
}

/// New fighters never hit their own body
pub fn bind_new_fighters(mut fighters: Query<(Entity, &mut Fighter), Added<Fighter>>) {
    for (entity, mut fighter) in &mut fighters {
        fighter.0.set_self_target(Some(target_id(entity)));
    }
}

pub fn route_combat_input(
    time: Res<Time>,
    mut inputs: EventReader<CombatInputEvent>,
    mut fighters: Query<&mut Fighter>,
) {
    let now = time.elapsed_secs();
    for event in inputs.read() {
        let Ok(mut fighter) = fighters.get_mut(event.entity) else {
            debug!("Combat input for {:?} without a fighter", event.entity);
            continue;
        };
        let reaction = fighter.0.handle_input(event.input, now);
        trace!("{:?} {:?} -> {:?}", event.entity, event.input, reaction);
    }
}

#[allow(clippy::too_many_arguments)]
pub fn drive_fighters(
    time: Res<Time>,
    rapier: Query<&RapierContext>,
    hurtboxes: Query<(Entity, &GlobalTransform, &Hurtbox)>,
    parents: Query<&'static Parent>,
    sinks: Query<Entity, Or<(With<Health>, With<Fighter>)>>,
    mut fighters: Query<(Entity, &Transform, &mut Fighter)>,
    mut damage: EventWriter<DamageEvent>,
) {
    let dt = time.delta_secs();
    let now = time.elapsed_secs();

    let rapier_query = rapier.get_single().ok().map(RapierSpatialQuery::new);
    let fallback;
    let query: &dyn SpatialQuery = match &rapier_query {
        Some(query) => query,
        None => {
            fallback = HurtboxQuery::collect(&hurtboxes);
            &fallback
        }
    };

    for (entity, transform, mut fighter) in &mut fighters {
        let pose = Pose::from_transform(transform);
        let mut targets = EntityTargets {
            parents: &parents,
            sinks: &sinks,
            pending: Vec::new(),
        };
        fighter
            .0
            .tick(dt, now, &pose, Some(HitWorld::new(query, &mut targets)));

        for (target, amount) in targets.pending {
            damage.send(DamageEvent {
                attacker: entity,
                target,
                amount,
                origin: transform.translation,
            });
        }
    }
}

pub fn apply_damage(
    mut damage: EventReader<DamageEvent>,
    mut incoming: EventReader<IncomingHit>,
    mut sinks: Query<(&Transform, Option<&mut Fighter>, Option<&mut Health>)>,
    mut guard_broken: EventWriter<GuardBroken>,
) {
    let hits = damage
        .read()
        .map(|d| (d.target, d.amount, d.origin, false))
        .chain(incoming.read().map(|h| (h.target, h.amount, h.origin, h.is_heavy)));

    for (target, amount, origin, is_heavy) in hits {
        let Ok((transform, fighter, health)) = sinks.get_mut(target) else {
            continue;
        };

        if let Some(mut fighter) = fighter {
            let taken = fighter.0.take_hit(amount, origin, is_heavy, &Pose::from_transform(transform));
            if taken.outcome == BlockOutcome::GuardBroken {
                guard_broken.send(GuardBroken { entity: target });
            }
            info!(
                "{:?} took {} ({:?}), health {}",
                target,
                taken.dealt,
                taken.outcome,
                fighter.0.health().current
            );
        } else if let Some(mut health) = health {
            health.take_damage(amount);
            info!("{:?} took {}, health {}", target, amount, health.current);
        }
    }
}
