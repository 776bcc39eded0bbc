//! World model adapter — то, что host знает о сущностях
//!
//! Engine не владеет миром: host (game client) декодирует entities и передаёт
//! текущее состояние. Для Bevy host'а это ECS компоненты ниже + `Transform`,
//! `sync_entity_table` зеркалит их в `EntityTable` каждый frame.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod events;

pub use events::WorldEvent;

/// Идентичность предмета в руке (weapon identity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub struct ItemId(pub u32);

/// Классификация entity (host-supplied)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum EntityKind {
    Player,
    Mob,
    Projectile,
    #[default]
    Other,
}

impl EntityKind {
    /// Может ли быть стрелком (player или mob)
    pub fn can_shoot(&self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Mob)
    }
}

/// Heading (yaw, радианы). 0 = смотрит в −Z, растёт против часовой.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct Heading {
    pub yaw: f32,
}

/// Предмет в руке (отсутствие компонента = пустая рука)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct HeldItem {
    pub item: ItemId,
}

/// Snapshot entity на момент события
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedEntity {
    pub entity: Entity,
    pub position: Vec3,
    pub yaw: f32,
    pub kind: EntityKind,
    pub held_item: Option<ItemId>,
}

impl TrackedEntity {
    pub fn new(entity: Entity, kind: EntityKind, position: Vec3) -> Self {
        Self {
            entity,
            position,
            yaw: 0.0,
            kind,
            held_item: None,
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn with_held_item(mut self, item: ItemId) -> Self {
        self.held_item = Some(item);
        self
    }
}

/// Read-only доступ engine к миру host'а
pub trait WorldView {
    fn entity(&self, entity: Entity) -> Option<TrackedEntity>;

    /// Все живые entities (порядок стабилен в пределах одного вызова)
    fn entities(&self) -> Box<dyn Iterator<Item = TrackedEntity> + '_>;

    /// Ближайший player/mob к точке (при равенстве — первый найденный)
    fn nearest_shooter(&self, point: Vec3) -> Option<TrackedEntity> {
        self.entities()
            .filter(|e| e.kind.can_shoot())
            .min_by(|a, b| {
                a.position
                    .distance(point)
                    .total_cmp(&b.position.distance(point))
            })
    }
}

/// Таблица живых entities (BTreeMap — детерминированный порядок обхода)
#[derive(Resource, Debug, Clone, Default)]
pub struct EntityTable {
    entities: BTreeMap<Entity, TrackedEntity>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, tracked: TrackedEntity) {
        self.entities.insert(tracked.entity, tracked);
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<TrackedEntity> for EntityTable {
    fn from_iter<I: IntoIterator<Item = TrackedEntity>>(iter: I) -> Self {
        let mut table = Self::new();
        for tracked in iter {
            table.upsert(tracked);
        }
        table
    }
}

impl WorldView for EntityTable {
    fn entity(&self, entity: Entity) -> Option<TrackedEntity> {
        self.entities.get(&entity).copied()
    }

    fn entities(&self) -> Box<dyn Iterator<Item = TrackedEntity> + '_> {
        Box::new(self.entities.values().copied())
    }
}
