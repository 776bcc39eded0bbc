//! Bloodhound — attack attribution engine
//!
//! По потоку "entity ранена" / "entity махнула рукой" / "projectile замечен"
//! выводит кто кого атаковал и чем. Один EntityAttack на разрешённую пару.
//!
//! Интеграция:
//! - Bevy host: `AttributionPlugin` + `WorldEvent` → `EntityAttack`
//! - Любой другой host: `AttributionEngine` напрямую + `EntityTable`/`WorldView`

use bevy::prelude::*;

pub mod attribution;
pub mod config;
pub mod logger;
pub mod world;

pub use attribution::{
    AttackSource, AttributionEngine, AttributionPlugin, AttributionSink, AttributionSystems,
    EntityAttack,
};
pub use config::{AttributionConfig, ConfigError, OrientationPolicy};
pub use logger::{log, log_error, log_info, log_warning};
pub use world::{
    EntityKind, EntityTable, Heading, HeldItem, ItemId, TrackedEntity, WorldEvent, WorldView,
};

/// Создаёт minimal Bevy App для headless attribution (тесты, replay)
pub fn create_headless_app(config: AttributionConfig) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(AttributionPlugin::new(config));

    app
}
