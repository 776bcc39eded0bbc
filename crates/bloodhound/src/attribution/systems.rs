//! Bevy systems: ECS world ↔ AttributionEngine

use bevy::prelude::*;

use super::{AttributionEngine, EntityAttack};
use crate::config::AttributionConfig;
use crate::world::{EntityKind, EntityTable, Heading, HeldItem, TrackedEntity, WorldEvent};

/// Все attribution системы (потребители EntityAttack ставят себя `.after()`)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributionSystems;

/// System: изменения AttributionConfig resource → engine
pub fn apply_config_changes(config: Res<AttributionConfig>, mut engine: ResMut<AttributionEngine>) {
    if !config.is_changed() {
        return;
    }

    if let Err(err) = config.validate() {
        crate::logger::log_warning(&format!("AttributionConfig rejected: {}", err));
        return;
    }

    engine.set_config(config.clone());
}

/// System: зеркалит entities с EntityKind в EntityTable
///
/// Таблица пересобирается целиком — despawned entities исчезают сами.
pub fn sync_entity_table(
    mut table: ResMut<EntityTable>,
    query: Query<(Entity, &Transform, &EntityKind, Option<&Heading>, Option<&HeldItem>)>,
) {
    table.clear();

    for (entity, transform, kind, heading, held) in query.iter() {
        table.upsert(TrackedEntity {
            entity,
            position: transform.translation,
            yaw: heading.map_or(0.0, |h| h.yaw),
            kind: *kind,
            held_item: held.map(|h| h.item),
        });
    }
}

/// System: WorldEvent → engine handlers → EntityAttack events
///
/// Один запуск = один tick (hurt дедупликация Hurt/DamagePacket).
pub fn process_world_events(
    mut world_events: EventReader<WorldEvent>,
    table: Res<EntityTable>,
    mut engine: ResMut<AttributionEngine>,
    mut attack_events: EventWriter<EntityAttack>,
) {
    engine.begin_tick();

    for event in world_events.read() {
        engine.handle(event, &*table);
    }

    for attack in engine.drain_attacks() {
        attack_events.write(attack);
    }
}
