//! WorldEvent — входящие события от host'а (декодированный мир)
//!
//! Host отправляет через Bevy Events, `process_world_events` роутит их в engine.
//! `timestamp_ms` — monotonic capture time (один clock на все события).

use bevy::prelude::*;

use super::EntityKind;

#[derive(Event, Debug, Clone)]
pub enum WorldEvent {
    /// Entity получила урон (high-level событие host'а)
    Hurt { entity: Entity, timestamp_ms: u64 },

    /// Raw damage пакет — fallback когда high-level Hurt ненадёжен.
    /// Дедуплицируется с Hurt по entity в пределах одного tick.
    DamagePacket { entity: Entity, timestamp_ms: u64 },

    /// Entity сделала swing рукой (melee анимация)
    SwingArm { entity: Entity, timestamp_ms: u64 },

    /// Entity появилась в мире
    Spawned { entity: Entity, timestamp_ms: u64 },

    /// Entity сдвинулась
    Moved { entity: Entity, timestamp_ms: u64 },

    /// Entity исчезла. Позиция и kind — последние известные
    /// (в `EntityTable` её уже может не быть).
    Gone {
        entity: Entity,
        kind: EntityKind,
        position: Vec3,
        timestamp_ms: u64,
    },
}
