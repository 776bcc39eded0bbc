//! Melee correlation: hurt journal × swing journal → EntityAttack
//!
//! Для каждой unconsumed hurt observation сканируем unconsumed swings в порядке
//! вставки. Gates по порядку (short-circuit):
//! 1. Time: |hurt.time - swing.time| <= max_delta_time_ms
//! 2. Distance: |hurt.position - swing.position| <= max_melee_distance
//! 3. Orientation (если yaw_correlation): heading attacker'а vs bearing на victim
//!
//! Consumed entries удаляются только в конце pass — один hurt может совпасть
//! с несколькими swings в пределах одного pass.

use bevy::prelude::*;
use std::f32::consts::{PI, TAU};

use super::journal::{EventJournal, Observation};
use super::sink::AttributionSink;
use super::{AttackSource, EntityAttack};
use crate::config::{AttributionConfig, OrientationPolicy};
use crate::world::WorldView;

/// Результат проверки одной пары hurt/swing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairVerdict {
    TimeGap { delta_ms: u64 },
    OutOfReach { distance: f32 },
    /// Orientation провален и политика Enforce
    Misaligned { deviation_percent: f32 },
    /// Пара засчитана. `facing` = None если orientation тест выключен.
    Match { facing: Option<bool> },
}

impl PairVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, PairVerdict::Match { .. })
    }
}

/// Bearing от attacker к victim в yaw-конвенции host'а, [0, 2π)
///
/// yaw 0 = −Z, растёт против часовой. Совпадающие позиции дают atan2(0, −0) = π,
/// т.е. 3π/2 — конечное значение, не NaN.
pub fn attack_yaw(attacker: Vec3, victim: Vec3) -> f32 {
    let z_diff = victim.z - attacker.z;
    let x_diff = victim.x - attacker.x;

    let yaw = z_diff.atan2(-x_diff) + PI / 2.0;

    if yaw < 0.0 {
        yaw + TAU
    } else {
        yaw
    }
}

/// Отклонение heading от bearing в процентах полного оборота, [0, 50]
pub fn yaw_deviation_percent(heading: f32, bearing: f32) -> f32 {
    let wrapped = (bearing - heading + PI).rem_euclid(TAU) - PI;
    (wrapped / TAU * 100.0).abs()
}

/// Прогоняет пару через gates
pub fn evaluate_pair(hurt: &Observation, swing: &Observation, config: &AttributionConfig) -> PairVerdict {
    let delta_ms = hurt.time_ms.abs_diff(swing.time_ms);
    if delta_ms > config.max_delta_time_ms {
        return PairVerdict::TimeGap { delta_ms };
    }

    let distance = hurt.position.distance(swing.position);
    if distance > config.max_melee_distance {
        return PairVerdict::OutOfReach { distance };
    }

    if !config.yaw_correlation {
        return PairVerdict::Match { facing: None };
    }

    let bearing = attack_yaw(swing.position, hurt.position);
    let deviation_percent = yaw_deviation_percent(swing.yaw, bearing);
    let facing = deviation_percent < config.max_delta_yaw_percent;

    match (facing, config.orientation_policy) {
        (false, OrientationPolicy::Enforce) => PairVerdict::Misaligned { deviation_percent },
        _ => PairVerdict::Match {
            facing: Some(facing),
        },
    }
}

/// Один correlation pass. Возвращает число эмитированных фактов.
pub fn correlate_melee(
    hurts: &mut EventJournal,
    swings: &mut EventJournal,
    world: &dyn WorldView,
    config: &AttributionConfig,
    now_ms: u64,
    sink: &mut AttributionSink,
) -> usize {
    let aged = hurts.evict_aged_if_full(now_ms) + swings.evict_aged_if_full(now_ms);
    if aged > 0 {
        crate::logger::log(&format!("🧹 Evicted {} aged observations", aged));
    }

    if hurts.is_empty() || swings.is_empty() {
        return 0;
    }

    let mut matched = 0;

    for hurt_index in 0..hurts.len() {
        if hurts.at(hurt_index).consumed {
            continue;
        }

        for swing_index in 0..swings.len() {
            if swings.at(swing_index).consumed {
                continue;
            }

            let hurt = hurts.at(hurt_index);
            let swing = swings.at(swing_index);

            let verdict = evaluate_pair(hurt, swing, config);
            let PairVerdict::Match { facing } = verdict else {
                continue;
            };

            let (attacker, victim) = (swing.subject, hurt.subject);
            let weapon = world.entity(attacker).and_then(|e| e.held_item);

            if facing == Some(false) {
                crate::logger::log(&format!(
                    "↪️ Swing {:?} not facing victim {:?}, attributing anyway",
                    attacker, victim
                ));
            }

            sink.emit(EntityAttack {
                attacker,
                victim,
                weapon,
                source: AttackSource::Melee,
            });

            hurts.consume_at(hurt_index);
            swings.consume_at(swing_index);
            matched += 1;
        }
    }

    hurts.evict_consumed();
    swings.evict_consumed();

    matched
}
