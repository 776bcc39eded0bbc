//! Tests for AttributionEngine handlers.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use std::sync::{Arc, Mutex};

    use super::super::{AttackSource, AttributionEngine, EntityAttack};
    use crate::config::{AttributionConfig, OrientationPolicy};
    use crate::world::{EntityKind, EntityTable, ItemId, TrackedEntity, WorldEvent};

    const SWORD: ItemId = ItemId(276);
    const BOW: ItemId = ItemId(261);

    fn e(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    /// A (player, меч) в начале координат смотрит на B (mob) в 2м по −Z
    fn duel_world() -> EntityTable {
        [
            TrackedEntity::new(e(1), EntityKind::Player, Vec3::ZERO).with_held_item(SWORD),
            TrackedEntity::new(e(2), EntityKind::Mob, Vec3::new(0.0, 0.0, -2.0)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_swing_then_hurt_attributes_attack() {
        let world = duel_world();
        let mut engine = AttributionEngine::default();

        engine.begin_tick();
        assert_eq!(engine.on_swing_arm(e(1), &world, 1_000), 0);
        engine.begin_tick();
        assert_eq!(engine.on_hurt(e(2), &world, 1_005), 1);

        assert_eq!(
            engine.drain_attacks(),
            vec![EntityAttack {
                attacker: e(1),
                victim: e(2),
                weapon: Some(SWORD),
                source: AttackSource::Melee,
            }]
        );
        assert!(engine.hurt_journal().is_empty());
        assert!(engine.swing_journal().is_empty());
    }

    #[test]
    fn test_hurt_then_swing_also_correlates() {
        let world = duel_world();
        let mut engine = AttributionEngine::default();

        engine.begin_tick();
        engine.on_hurt(e(2), &world, 1_000);
        assert_eq!(engine.on_swing_arm(e(1), &world, 1_004), 1);
    }

    #[test]
    fn test_hurt_and_damage_packet_deduplicated_within_tick() {
        let world = duel_world();
        let mut engine = AttributionEngine::default();

        engine.begin_tick();
        engine.on_hurt(e(2), &world, 500);
        engine.on_damage_packet(e(2), &world, 501);
        assert_eq!(engine.hurt_journal().len(), 1);

        // Новый tick — тот же entity снова может быть ранен
        engine.begin_tick();
        engine.on_damage_packet(e(2), &world, 900);
        assert_eq!(engine.hurt_journal().len(), 2);
    }

    #[test]
    fn test_hurts_seconds_apart_recorded_without_begin_tick() {
        let world = duel_world();
        let mut engine = AttributionEngine::default();

        engine.on_swing_arm(e(1), &world, 1_000);
        assert_eq!(engine.on_hurt(e(2), &world, 1_005), 1);

        // Host никогда не вызывает begin_tick — второй удар всё равно засчитан
        engine.on_swing_arm(e(1), &world, 9_000);
        assert_eq!(engine.on_hurt(e(2), &world, 9_004), 1);

        assert_eq!(engine.sink().emitted_total(), 2);
    }

    #[test]
    fn test_entity_hurt_right_after_own_swing_is_attributed_to_itself() {
        let world = duel_world();
        let mut engine = AttributionEngine::default();

        engine.begin_tick();
        engine.on_swing_arm(e(1), &world, 1_000);
        engine.begin_tick();
        assert_eq!(engine.on_hurt(e(1), &world, 1_005), 1);

        assert_eq!(
            engine.drain_attacks(),
            vec![EntityAttack {
                attacker: e(1),
                victim: e(1),
                weapon: Some(SWORD),
                source: AttackSource::Melee,
            }]
        );
    }

    #[test]
    fn test_enforced_orientation_uses_recorded_heading() {
        let config = AttributionConfig {
            orientation_policy: OrientationPolicy::Enforce,
            ..Default::default()
        };
        let mut engine = AttributionEngine::new(config);

        // A развёрнут в +Z, B на −Z
        let turned_away: EntityTable = [
            TrackedEntity::new(e(1), EntityKind::Player, Vec3::ZERO).with_yaw(std::f32::consts::PI),
            TrackedEntity::new(e(2), EntityKind::Mob, Vec3::new(0.0, 0.0, -2.0)),
        ]
        .into_iter()
        .collect();

        engine.begin_tick();
        engine.on_swing_arm(e(1), &turned_away, 1_000);
        assert_eq!(engine.on_hurt(e(2), &turned_away, 1_002), 0);
        assert_eq!(engine.swing_journal().len(), 1);
    }

    #[test]
    fn test_damage_packet_for_unknown_entity_ignored() {
        let world = duel_world();
        let mut engine = AttributionEngine::default();

        engine.begin_tick();
        assert_eq!(engine.on_damage_packet(e(99), &world, 0), 0);
        assert!(engine.hurt_journal().is_empty());
    }

    #[test]
    fn test_subscribers_receive_each_attack() {
        let world = duel_world();
        let mut engine = AttributionEngine::default();
        let seen: Arc<Mutex<Vec<EntityAttack>>> = Arc::default();

        let sink = Arc::clone(&seen);
        engine.subscribe(move |attack| sink.lock().unwrap().push(*attack));

        let events = [
            WorldEvent::SwingArm { entity: e(1), timestamp_ms: 10 },
            WorldEvent::Hurt { entity: e(2), timestamp_ms: 12 },
        ];
        assert_eq!(engine.handle_tick(&events, &world), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].attacker, e(1));
        assert_eq!(engine.sink().emitted_total(), 1);
    }

    fn archery_world(projectile_at: Vec3) -> EntityTable {
        [
            TrackedEntity::new(e(1), EntityKind::Player, Vec3::ZERO).with_held_item(BOW),
            TrackedEntity::new(e(3), EntityKind::Mob, Vec3::new(10.0, 0.0, 0.0)),
            TrackedEntity::new(e(10), EntityKind::Projectile, projectile_at),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_projectile_detection_off_skips_everything() {
        let config = AttributionConfig {
            projectile_detection: false,
            ..Default::default()
        };
        let mut engine = AttributionEngine::new(config);

        let world = archery_world(Vec3::new(1.0, 0.0, 0.0));
        engine.begin_tick();
        engine.on_spawn(e(10), &world, 0);
        assert!(engine.projectiles().is_empty());

        let world = archery_world(Vec3::new(9.0, 0.0, 0.0));
        engine.begin_tick();
        assert_eq!(engine.on_hurt(e(3), &world, 100), 0);
        assert!(!engine.on_gone(e(10), EntityKind::Projectile, Vec3::new(9.0, 0.0, 0.0), 101));
    }

    #[test]
    fn test_spawn_of_non_projectile_is_ignored() {
        let mut engine = AttributionEngine::default();
        let world = archery_world(Vec3::X);

        engine.on_spawn(e(3), &world, 0);
        assert!(engine.projectiles().is_empty());
    }

    #[test]
    fn test_disabling_projectiles_at_runtime_drops_records() {
        let mut engine = AttributionEngine::default();
        let world = archery_world(Vec3::X);

        engine.on_spawn(e(10), &world, 0);
        assert_eq!(engine.projectiles().len(), 1);

        engine.set_config(AttributionConfig {
            projectile_detection: false,
            ..Default::default()
        });
        assert!(engine.projectiles().is_empty());
        assert!(!engine.config().projectile_detection);
    }

    #[test]
    fn test_gone_of_non_projectile_does_nothing() {
        let mut engine = AttributionEngine::default();
        let world = archery_world(Vec3::X);

        engine.on_spawn(e(10), &world, 0);
        engine.begin_tick();
        // Hurt далеко от projectile — ranged корреляция не срабатывает
        engine.on_hurt(e(3), &world, 50);

        assert!(!engine.on_gone(e(3), EntityKind::Mob, Vec3::new(10.0, 0.0, 0.0), 60));
        assert_eq!(engine.projectiles().len(), 1);
    }
}
