//! ProjectileTracker — кто выпустил каждый живой projectile
//!
//! Projectiles (стрелы, трезубцы) не дают melee swing, поэтому shooter
//! угадывается при spawn (ближайший player/mob) и подтверждается пока
//! projectile продолжает двигаться. Пауза в move событиях дольше
//! `stale_ms` — запись теряется, иначе пролетающий мимо projectile
//! приписался бы случайному соседу.

use bevy::prelude::*;
use std::collections::HashMap;

use super::sink::AttributionSink;
use super::{AttackSource, EntityAttack};
use crate::world::{ItemId, WorldView};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileRecord {
    pub shooter: Entity,
    pub weapon: Option<ItemId>,
    pub last_seen_ms: u64,
}

/// Последний hurt, "активный" `window_ms` после записи.
///
/// Вместо таймера — expiry timestamp, проверяется при чтении.
/// Новый hurt перезаписывает предыдущий (last-writer-wins).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecentHurt {
    latest: Option<HurtMark>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HurtMark {
    victim: Entity,
    position: Vec3,
    expires_at_ms: u64,
}

impl RecentHurt {
    pub fn mark(&mut self, victim: Entity, position: Vec3, now_ms: u64, window_ms: u64) {
        self.latest = Some(HurtMark {
            victim,
            position,
            expires_at_ms: now_ms.saturating_add(window_ms),
        });
    }

    /// Victim и его позиция, если hurt ещё в окне
    pub fn active(&self, now_ms: u64) -> Option<(Entity, Vec3)> {
        self.latest
            .filter(|mark| now_ms < mark.expires_at_ms)
            .map(|mark| (mark.victim, mark.position))
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }
}

#[derive(Debug, Clone)]
pub struct ProjectileTracker {
    records: HashMap<Entity, ProjectileRecord>,
    stale_ms: u64,
}

impl ProjectileTracker {
    pub fn new(stale_ms: u64) -> Self {
        Self {
            records: HashMap::new(),
            stale_ms,
        }
    }

    pub fn set_stale_ms(&mut self, stale_ms: u64) {
        self.stale_ms = stale_ms;
    }

    /// Projectile появился — ищем ближайшего стрелка.
    /// Нет ни одного player/mob → ничего не записываем.
    pub fn on_spawn(&mut self, projectile: Entity, world: &dyn WorldView, now_ms: u64) -> Option<ProjectileRecord> {
        let Some(spawned) = world.entity(projectile) else {
            crate::logger::log(&format!("Projectile {:?} spawned but unknown to world", projectile));
            return None;
        };

        let shooter = world.nearest_shooter(spawned.position)?;

        let record = ProjectileRecord {
            shooter: shooter.entity,
            weapon: shooter.held_item,
            last_seen_ms: now_ms,
        };
        self.records.insert(projectile, record);

        crate::logger::log(&format!(
            "🏹 Projectile {:?} registered (shooter: {:?}, weapon: {:?})",
            projectile, record.shooter, record.weapon
        ));

        Some(record)
    }

    /// Projectile сдвинулся — refresh или expire по staleness
    pub fn on_move(&mut self, projectile: Entity, now_ms: u64) {
        let Some(record) = self.records.get_mut(&projectile) else {
            return;
        };

        if now_ms.saturating_sub(record.last_seen_ms) > self.stale_ms {
            self.records.remove(&projectile);
            crate::logger::log(&format!("⌛ Projectile {:?} went stale, record dropped", projectile));
            return;
        }

        // Out-of-order move не откатывает last_seen назад
        record.last_seen_ms = record.last_seen_ms.max(now_ms);
    }

    /// Projectile исчез. Если сразу перед этим кого-то ранили рядом —
    /// это его выстрел. Возвращает true если факт эмитирован.
    pub fn on_disappear(
        &mut self,
        projectile: Entity,
        position: Vec3,
        recent_hurt: &RecentHurt,
        hit_radius: f32,
        now_ms: u64,
        sink: &mut AttributionSink,
    ) -> bool {
        let Some((victim, victim_position)) = recent_hurt.active(now_ms) else {
            // Просто исчез (упал, despawn) — запись больше не нужна
            self.records.remove(&projectile);
            return false;
        };

        if position.distance(victim_position) > hit_radius {
            self.records.remove(&projectile);
            return false;
        }

        let Some(record) = self.records.remove(&projectile) else {
            return false;
        };

        sink.emit(EntityAttack {
            attacker: record.shooter,
            victim,
            weapon: record.weapon,
            source: AttackSource::Ranged,
        });

        true
    }

    /// Забирает запись (ranged корреляция)
    pub fn take(&mut self, projectile: Entity) -> Option<ProjectileRecord> {
        self.records.remove(&projectile)
    }

    pub fn get(&self, projectile: Entity) -> Option<&ProjectileRecord> {
        self.records.get(&projectile)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
