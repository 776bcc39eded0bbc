//! Headless replay Bloodhound
//!
//! Проигрывает короткий сценарий (melee + выстрел) через AttributionPlugin
//! и печатает выведенные атаки. Первый аргумент — опциональный путь к RON конфигу.

use std::path::Path;

use bevy::prelude::*;
use bloodhound::*;

/// Собранные за прогон атаки
#[derive(Resource, Default)]
struct AttackLog(Vec<EntityAttack>);

fn collect_attacks(mut reader: EventReader<EntityAttack>, mut log: ResMut<AttackLog>) {
    log.0.extend(reader.read().copied());
}

fn load_config() -> AttributionConfig {
    let Some(path) = std::env::args().nth(1) else {
        return AttributionConfig::default();
    };

    match AttributionConfig::load(Path::new(&path)) {
        Ok(config) => config,
        Err(err) => {
            log_error(&format!("Failed to load {}: {}, using defaults", path, err));
            AttributionConfig::default()
        }
    }
}

fn main() {
    let config = load_config();
    println!("Starting Bloodhound replay ({:?})", config.orientation_policy);

    let mut app = create_headless_app(config);
    app.init_resource::<AttackLog>()
        .add_systems(Update, collect_attacks.after(AttributionSystems));

    let knight = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::ZERO),
            EntityKind::Player,
            Heading { yaw: 0.0 },
            HeldItem { item: ItemId(276) },
        ))
        .id();
    let zombie = app
        .world_mut()
        .spawn((
            Transform::from_xyz(0.0, 0.0, -2.0),
            EntityKind::Mob,
            Heading::default(),
        ))
        .id();
    let skeleton = app
        .world_mut()
        .spawn((
            Transform::from_xyz(-12.0, 0.0, -2.0),
            EntityKind::Mob,
            Heading::default(),
            HeldItem { item: ItemId(261) },
        ))
        .id();

    // t=1000: knight бьёт zombie
    app.world_mut().send_event(WorldEvent::SwingArm { entity: knight, timestamp_ms: 1_000 });
    app.world_mut().send_event(WorldEvent::Hurt { entity: zombie, timestamp_ms: 1_004 });
    app.update();

    // t=2000: skeleton стреляет в knight
    let arrow = app
        .world_mut()
        .spawn((Transform::from_xyz(-11.0, 1.5, -2.0), EntityKind::Projectile))
        .id();
    app.world_mut().send_event(WorldEvent::Spawned { entity: arrow, timestamp_ms: 2_000 });
    app.update();

    app.world_mut().entity_mut(arrow).insert(Transform::from_xyz(-1.0, 1.0, -0.5));
    app.world_mut().send_event(WorldEvent::Moved { entity: arrow, timestamp_ms: 2_300 });
    app.update();

    app.world_mut().despawn(arrow);
    app.world_mut().send_event(WorldEvent::Hurt { entity: knight, timestamp_ms: 2_350 });
    app.world_mut().send_event(WorldEvent::Gone {
        entity: arrow,
        kind: EntityKind::Projectile,
        position: Vec3::new(-0.5, 1.0, -0.2),
        timestamp_ms: 2_360,
    });
    app.update();

    let attacks = &app.world().resource::<AttackLog>().0;
    for attack in attacks {
        let name = |entity: Entity| match entity {
            e if e == knight => "knight",
            e if e == zombie => "zombie",
            e if e == skeleton => "skeleton",
            _ => "unknown",
        };
        println!(
            "{} → {} ({:?}, weapon {:?})",
            name(attack.attacker),
            name(attack.victim),
            attack.source,
            attack.weapon.map(|item| item.0)
        );
    }

    println!("Replay complete: {} attacks", attacks.len());
}
