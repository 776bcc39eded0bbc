//! Ranged correlation: на hurt ищем ближайший projectile рядом с victim
//!
//! Не ждём исчезновения projectile — если ближайший (strictly внутри
//! `hit_radius`) projectile зарегистрирован в tracker, запись забирается сразу.
//! Проверяется только ближайший кандидат.

use bevy::prelude::*;

use super::projectile::ProjectileTracker;
use super::sink::AttributionSink;
use super::{AttackSource, EntityAttack};
use crate::world::{EntityKind, TrackedEntity, WorldView};

/// Живые projectiles внутри радиуса, отсортированные по дистанции
pub fn nearby_projectiles(world: &dyn WorldView, victim_position: Vec3, hit_radius: f32) -> Vec<(TrackedEntity, f32)> {
    let mut nearby: Vec<_> = world
        .entities()
        .filter(|e| e.kind == EntityKind::Projectile)
        .map(|e| (e, e.position.distance(victim_position)))
        .filter(|(_, distance)| *distance < hit_radius)
        .collect();

    // sort_by стабильный — при равной дистанции порядок мира сохраняется
    nearby.sort_by(|(_, a), (_, b)| a.total_cmp(b));
    nearby
}

/// Возвращает true если факт эмитирован
pub fn correlate_ranged(
    victim: Entity,
    victim_position: Vec3,
    world: &dyn WorldView,
    tracker: &mut ProjectileTracker,
    hit_radius: f32,
    sink: &mut AttributionSink,
) -> bool {
    let Some((closest, distance)) = nearby_projectiles(world, victim_position, hit_radius)
        .into_iter()
        .next()
    else {
        return false;
    };

    let Some(record) = tracker.take(closest.entity) else {
        crate::logger::log(&format!(
            "Projectile {:?} near {:?} has no known shooter",
            closest.entity, victim
        ));
        return false;
    };

    crate::logger::log(&format!(
        "🎯 Projectile {:?} hit {:?} ({:.2}m)",
        closest.entity, victim, distance
    ));

    sink.emit(EntityAttack {
        attacker: record.shooter,
        victim,
        weapon: record.weapon,
        source: AttackSource::Ranged,
    });

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{EntityTable, ItemId};

    fn e(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn test_nearby_projectiles_sorted_and_bounded() {
        let world: EntityTable = [
            TrackedEntity::new(e(10), EntityKind::Projectile, Vec3::new(3.0, 0.0, 0.0)),
            TrackedEntity::new(e(11), EntityKind::Projectile, Vec3::new(1.0, 0.0, 0.0)),
            TrackedEntity::new(e(12), EntityKind::Projectile, Vec3::new(3.5, 0.0, 0.0)),
            TrackedEntity::new(e(13), EntityKind::Mob, Vec3::new(0.5, 0.0, 0.0)),
        ]
        .into_iter()
        .collect();

        let nearby: Vec<Entity> = nearby_projectiles(&world, Vec3::ZERO, 3.5)
            .into_iter()
            .map(|(tracked, _)| tracked.entity)
            .collect();

        // 3.5 ровно — вне радиуса (strict), mob не projectile
        assert_eq!(nearby, vec![e(11), e(10)]);
    }

    #[test]
    fn test_closest_without_record_blocks_farther_one() {
        let world: EntityTable = [
            TrackedEntity::new(e(1), EntityKind::Player, Vec3::new(10.0, 0.0, 0.0)).with_held_item(ItemId(7)),
            TrackedEntity::new(e(10), EntityKind::Projectile, Vec3::new(1.0, 0.0, 0.0)),
            TrackedEntity::new(e(11), EntityKind::Projectile, Vec3::new(2.0, 0.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let mut tracker = ProjectileTracker::new(600);
        let mut sink = AttributionSink::new();

        // Регистрируем только дальний
        tracker.on_spawn(e(11), &world, 0);

        assert!(!correlate_ranged(e(2), Vec3::ZERO, &world, &mut tracker, 3.5, &mut sink));
        assert!(sink.pending().is_empty());
        assert!(tracker.get(e(11)).is_some());
    }
}
