//! AttributionConfig — настройки engine, которые видит host
//!
//! Два главных toggle (`yaw_correlation`, `projectile_detection`) плюс пороги
//! корреляции. Загружается из RON (все поля опциональны, `#[serde(default)]`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Что делать с результатом orientation теста в melee корреляции
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum OrientationPolicy {
    /// Тест считается, но пара эмитится в любом случае
    #[default]
    Advisory,

    /// Пара с провалившимся тестом пропускается (swing не засчитывается)
    Enforce,
}

/// Конфигурация attribution engine
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[reflect(Resource)]
#[serde(default)]
pub struct AttributionConfig {
    /// Orientation тест в melee корреляции
    pub yaw_correlation: bool,
    /// Вся projectile подсистема (spawn/move/gone + ranged корреляция)
    pub projectile_detection: bool,
    pub orientation_policy: OrientationPolicy,

    /// Max дистанция hurt ↔ swing (world units)
    pub max_melee_distance: f32,
    /// Max |hurt.time - swing.time| (ms)
    pub max_delta_time_ms: u64,
    /// Max отклонение heading от bearing (percent полного оборота, strict)
    pub max_delta_yaw_percent: f32,

    /// Observations старше этого удаляются при cleanup (ms)
    pub max_event_age_ms: u64,
    /// Age cleanup запускается только когда journal длиннее этого
    pub cleanup_threshold: usize,

    /// Max пауза между move событиями projectile (ms)
    pub projectile_stale_ms: u64,
    /// Окно "недавнего hurt" для resolution по исчезновению projectile (ms)
    pub recent_hurt_window_ms: u64,
    /// Радиус поиска projectile вокруг victim (world units)
    pub projectile_hit_radius: f32,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            yaw_correlation: true,
            projectile_detection: true,
            orientation_policy: OrientationPolicy::Advisory,
            max_melee_distance: 6.0,
            max_delta_time_ms: 10,
            max_delta_yaw_percent: 10.0,
            max_event_age_ms: 20_000,
            cleanup_threshold: 10,
            projectile_stale_ms: 600,
            recent_hurt_window_ms: 100,
            projectile_hit_radius: 3.5,
        }
    }
}

/// Ошибки загрузки конфигурации
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl AttributionConfig {
    /// Парсит RON и валидирует пороги
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_distance("max_melee_distance", self.max_melee_distance)?;
        check_distance("projectile_hit_radius", self.projectile_hit_radius)?;
        check_distance("max_delta_yaw_percent", self.max_delta_yaw_percent)?;

        if self.cleanup_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "cleanup_threshold",
                reason: "must be at least 1",
            });
        }

        Ok(())
    }
}

fn check_distance(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be finite",
        });
    }
    if value < 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must not be negative",
        });
    }
    Ok(())
}
