//! AttributionEngine — один instance на живую сессию host'а
//!
//! Владеет journals, projectile tracker, recent-hurt флагом и sink.
//! Host вызывает handler на каждое декодированное событие; всё выполняется
//! синхронно до конца, engine не имеет своего event loop.
//!
//! Tick протокол: `begin_tick` открывает tick, внутри которого hurt одной entity
//! (из `Hurt` или raw `DamagePacket`) обрабатывается один раз. Дубликатом
//! считается только hurt в пределах `max_delta_time_ms` от уже записанного,
//! так что host без `begin_tick` не теряет последующие hurts.

use bevy::prelude::*;
use std::collections::HashMap;

use super::journal::EventJournal;
use super::melee::correlate_melee;
use super::projectile::{ProjectileTracker, RecentHurt};
use super::ranged::correlate_ranged;
use super::sink::AttributionSink;
use super::EntityAttack;
use crate::config::AttributionConfig;
use crate::world::{EntityKind, WorldEvent, WorldView};

#[derive(Resource, Debug)]
pub struct AttributionEngine {
    config: AttributionConfig,
    hurts: EventJournal,
    swings: EventJournal,
    projectiles: ProjectileTracker,
    recent_hurt: RecentHurt,
    /// Entity → timestamp hurt'а, записанного в текущем tick
    hurt_this_tick: HashMap<Entity, u64>,
    tick: u64,
    sink: AttributionSink,
}

impl Default for AttributionEngine {
    fn default() -> Self {
        Self::new(AttributionConfig::default())
    }
}

impl AttributionEngine {
    pub fn new(config: AttributionConfig) -> Self {
        Self {
            hurts: EventJournal::new(config.cleanup_threshold, config.max_event_age_ms),
            swings: EventJournal::new(config.cleanup_threshold, config.max_event_age_ms),
            projectiles: ProjectileTracker::new(config.projectile_stale_ms),
            recent_hurt: RecentHurt::default(),
            hurt_this_tick: HashMap::new(),
            tick: 0,
            sink: AttributionSink::new(),
            config,
        }
    }

    pub fn config(&self) -> &AttributionConfig {
        &self.config
    }

    /// Применяет новую конфигурацию. Накопленное состояние сохраняется,
    /// кроме projectile записей если projectile_detection выключен.
    pub fn set_config(&mut self, config: AttributionConfig) {
        self.hurts.set_limits(config.cleanup_threshold, config.max_event_age_ms);
        self.swings.set_limits(config.cleanup_threshold, config.max_event_age_ms);
        self.projectiles.set_stale_ms(config.projectile_stale_ms);

        if !config.projectile_detection {
            self.projectiles.clear();
            self.recent_hurt.clear();
        }

        self.config = config;
    }

    pub fn subscribe(&mut self, subscriber: impl Fn(&EntityAttack) + Send + Sync + 'static) {
        self.sink.subscribe(subscriber);
    }

    pub fn drain_attacks(&mut self) -> Vec<EntityAttack> {
        self.sink.drain()
    }

    pub fn sink(&self) -> &AttributionSink {
        &self.sink
    }

    pub fn hurt_journal(&self) -> &EventJournal {
        &self.hurts
    }

    pub fn swing_journal(&self) -> &EventJournal {
        &self.swings
    }

    pub fn projectiles(&self) -> &ProjectileTracker {
        &self.projectiles
    }

    /// Открывает новый tick (сбрасывает hurt дедупликацию)
    pub fn begin_tick(&mut self) {
        self.tick += 1;
        self.hurt_this_tick.clear();
    }

    /// Обрабатывает пачку событий одного tick
    pub fn handle_tick<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a WorldEvent>,
        world: &dyn WorldView,
    ) -> usize {
        self.begin_tick();
        events.into_iter().map(|event| self.handle(event, world)).sum()
    }

    /// Роутинг одного события. Возвращает число эмитированных фактов.
    pub fn handle(&mut self, event: &WorldEvent, world: &dyn WorldView) -> usize {
        match *event {
            WorldEvent::Hurt { entity, timestamp_ms } => self.on_hurt(entity, world, timestamp_ms),
            WorldEvent::DamagePacket { entity, timestamp_ms } => {
                self.on_damage_packet(entity, world, timestamp_ms)
            }
            WorldEvent::SwingArm { entity, timestamp_ms } => {
                self.on_swing_arm(entity, world, timestamp_ms)
            }
            WorldEvent::Spawned { entity, timestamp_ms } => {
                self.on_spawn(entity, world, timestamp_ms);
                0
            }
            WorldEvent::Moved { entity, timestamp_ms } => {
                self.on_move(entity, world, timestamp_ms);
                0
            }
            WorldEvent::Gone {
                entity,
                kind,
                position,
                timestamp_ms,
            } => usize::from(self.on_gone(entity, kind, position, timestamp_ms)),
        }
    }

    /// Entity получила урон
    ///
    /// 1. Записываем hurt observation → melee корреляция
    /// 2. Ищем ближайший projectile (если projectile_detection)
    /// 3. Ставим recent-hurt флаг для resolution по исчезновению projectile
    pub fn on_hurt(&mut self, victim: Entity, world: &dyn WorldView, now_ms: u64) -> usize {
        let Some(tracked) = world.entity(victim) else {
            crate::logger::log(&format!("Hurt for unknown entity {:?} ignored", victim));
            return 0;
        };

        if self.is_duplicate_hurt(victim, now_ms) {
            crate::logger::log(&format!(
                "Duplicate hurt for {:?} in tick {} ignored",
                victim, self.tick
            ));
            return 0;
        }
        self.hurt_this_tick.insert(victim, now_ms);

        self.hurts.record(victim, tracked.position, tracked.yaw, now_ms);

        let mut emitted = correlate_melee(
            &mut self.hurts,
            &mut self.swings,
            world,
            &self.config,
            now_ms,
            &mut self.sink,
        );

        if self.config.projectile_detection {
            let hit = correlate_ranged(
                victim,
                tracked.position,
                world,
                &mut self.projectiles,
                self.config.projectile_hit_radius,
                &mut self.sink,
            );
            emitted += usize::from(hit);

            self.recent_hurt.mark(
                victim,
                tracked.position,
                now_ms,
                self.config.recent_hurt_window_ms,
            );
        }

        emitted
    }

    /// Raw damage пакет (fallback источник hurt)
    pub fn on_damage_packet(&mut self, entity: Entity, world: &dyn WorldView, now_ms: u64) -> usize {
        self.on_hurt(entity, world, now_ms)
    }

    /// Второй сигнал того же hurt (Hurt + DamagePacket) — та же entity,
    /// тот же tick, timestamps рядом
    fn is_duplicate_hurt(&self, victim: Entity, now_ms: u64) -> bool {
        self.hurt_this_tick
            .get(&victim)
            .is_some_and(|seen_ms| seen_ms.abs_diff(now_ms) <= self.config.max_delta_time_ms)
    }

    pub fn on_swing_arm(&mut self, attacker: Entity, world: &dyn WorldView, now_ms: u64) -> usize {
        let Some(tracked) = world.entity(attacker) else {
            crate::logger::log(&format!("Swing for unknown entity {:?} ignored", attacker));
            return 0;
        };

        self.swings.record(attacker, tracked.position, tracked.yaw, now_ms);

        correlate_melee(
            &mut self.hurts,
            &mut self.swings,
            world,
            &self.config,
            now_ms,
            &mut self.sink,
        )
    }

    pub fn on_spawn(&mut self, entity: Entity, world: &dyn WorldView, now_ms: u64) {
        if !self.config.projectile_detection || !is_projectile(world, entity) {
            return;
        }
        self.projectiles.on_spawn(entity, world, now_ms);
    }

    pub fn on_move(&mut self, entity: Entity, world: &dyn WorldView, now_ms: u64) {
        if !self.config.projectile_detection || !is_projectile(world, entity) {
            return;
        }
        self.projectiles.on_move(entity, now_ms);
    }

    /// Entity исчезла. `kind`/`position` — последние известные.
    pub fn on_gone(&mut self, entity: Entity, kind: EntityKind, position: Vec3, now_ms: u64) -> bool {
        if !self.config.projectile_detection || kind != EntityKind::Projectile {
            return false;
        }

        self.projectiles.on_disappear(
            entity,
            position,
            &self.recent_hurt,
            self.config.projectile_hit_radius,
            now_ms,
            &mut self.sink,
        )
    }
}

fn is_projectile(world: &dyn WorldView, entity: Entity) -> bool {
    world
        .entity(entity)
        .is_some_and(|tracked| tracked.kind == EntityKind::Projectile)
}
