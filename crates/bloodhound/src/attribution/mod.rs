//! Attack attribution (кто кого ударил и чем)
//!
//! Host ответственность:
//! - Декодирование протокола, entity table, позиции/heading/held item
//! - Отправка WorldEvent (hurt, swing, spawn, move, gone)
//!
//! Engine ответственность:
//! - Melee: пары hurt × swing по времени/дистанции/orientation
//! - Ranged: shooter угадывается при spawn projectile, resolution на hurt
//!   (ближайший projectile) или на исчезновение projectile сразу после hurt
//! - Events: EntityAttack (один факт на пару, никогда не отзывается)

use bevy::prelude::*;

pub mod engine;
pub mod journal;
pub mod melee;
pub mod projectile;
pub mod ranged;
pub mod sink;
pub mod systems;

#[cfg(test)]
mod engine_tests;

pub use engine::AttributionEngine;
pub use journal::{EventJournal, Observation, ObservationHandle};
pub use melee::{attack_yaw, correlate_melee, evaluate_pair, yaw_deviation_percent, PairVerdict};
pub use projectile::{ProjectileRecord, ProjectileTracker, RecentHurt};
pub use ranged::{correlate_ranged, nearby_projectiles};
pub use sink::AttributionSink;
pub use systems::{apply_config_changes, process_world_events, sync_entity_table, AttributionSystems};

use crate::config::AttributionConfig;
use crate::world::{EntityTable, ItemId, WorldEvent};

/// Как атака была выведена (информационно)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackSource {
    Melee,
    Ranged,
}

/// Event: attacker атаковал victim (weapon = предмет в руке, если был)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EntityAttack {
    pub attacker: Entity,
    pub victim: Entity,
    pub weapon: Option<ItemId>,
    pub source: AttackSource,
}

/// Attribution Plugin
///
/// Регистрирует системы в Update (каждый frame, события не ждут fixed tick).
///
/// Порядок выполнения:
/// 1. apply_config_changes — AttributionConfig resource → engine
/// 2. sync_entity_table — ECS компоненты → EntityTable
/// 3. process_world_events — WorldEvent → engine → EntityAttack
#[derive(Default)]
pub struct AttributionPlugin {
    pub config: AttributionConfig,
}

impl AttributionPlugin {
    pub fn new(config: AttributionConfig) -> Self {
        Self { config }
    }
}

impl Plugin for AttributionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<WorldEvent>()
            .add_event::<EntityAttack>()
            .insert_resource(self.config.clone())
            .insert_resource(AttributionEngine::new(self.config.clone()))
            .init_resource::<EntityTable>();

        app.add_systems(
            Update,
            (apply_config_changes, sync_entity_table, process_world_events)
                .chain()
                .in_set(AttributionSystems),
        );
    }
}
