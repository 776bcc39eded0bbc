//! EventJournal — очередь pending observations (hurt или swing)
//!
//! Append-only Vec, скан от начала к концу. Размеры маленькие (единицы-десятки),
//! поэтому eviction ленивый:
//! - age cleanup только когда journal длиннее `cleanup_threshold`
//! - consumed cleanup один раз в конце correlation pass (индексы стабильны во время pass)

use bevy::prelude::*;

/// Стабильный handle observation (не инвалидируется eviction'ом соседей)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationHandle(u64);

/// Одно наблюдение: кто, где, когда
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub handle: ObservationHandle,
    pub subject: Entity,
    pub position: Vec3,
    /// Heading subject'а на момент capture
    pub yaw: f32,
    pub time_ms: u64,
    /// true ровно один раз — после успешной корреляции
    pub consumed: bool,
}

#[derive(Debug, Clone)]
pub struct EventJournal {
    entries: Vec<Observation>,
    next_handle: u64,
    cleanup_threshold: usize,
    max_age_ms: u64,
}

impl EventJournal {
    pub fn new(cleanup_threshold: usize, max_age_ms: u64) -> Self {
        Self {
            entries: Vec::new(),
            next_handle: 0,
            cleanup_threshold,
            max_age_ms,
        }
    }

    pub fn set_limits(&mut self, cleanup_threshold: usize, max_age_ms: u64) {
        self.cleanup_threshold = cleanup_threshold;
        self.max_age_ms = max_age_ms;
    }

    /// Добавляет unconsumed observation.
    ///
    /// Повторная запись того же `(subject, time_ms)` пока entry живой
    /// возвращает существующий handle.
    pub fn record(
        &mut self,
        subject: Entity,
        position: Vec3,
        yaw: f32,
        time_ms: u64,
    ) -> ObservationHandle {
        if let Some(existing) = self
            .entries
            .iter()
            .find(|o| !o.consumed && o.subject == subject && o.time_ms == time_ms)
        {
            return existing.handle;
        }

        let handle = ObservationHandle(self.next_handle);
        self.next_handle += 1;

        self.entries.push(Observation {
            handle,
            subject,
            position,
            yaw,
            time_ms,
            consumed: false,
        });

        handle
    }

    /// Удаляет всё старше `now_ms - max_age_ms`
    pub fn evict_aged(&mut self, now_ms: u64, max_age_ms: u64) -> usize {
        let min_time = now_ms.saturating_sub(max_age_ms);
        let before = self.entries.len();
        self.entries.retain(|o| o.time_ms >= min_time);
        before - self.entries.len()
    }

    /// Age cleanup, но только если journal переполнен
    pub fn evict_aged_if_full(&mut self, now_ms: u64) -> usize {
        if self.entries.len() <= self.cleanup_threshold {
            return 0;
        }
        self.evict_aged(now_ms, self.max_age_ms)
    }

    pub fn evict_consumed(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|o| !o.consumed);
        before - self.entries.len()
    }

    /// Помечает observation consumed. false если handle уже вытеснен.
    pub fn mark_consumed(&mut self, handle: ObservationHandle) -> bool {
        match self.entries.iter_mut().find(|o| o.handle == handle) {
            Some(observation) => {
                observation.consumed = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, handle: ObservationHandle) -> Option<&Observation> {
        self.entries.iter().find(|o| o.handle == handle)
    }

    /// Доступ по позиции (для correlation pass)
    pub(crate) fn at(&self, index: usize) -> &Observation {
        &self.entries[index]
    }

    pub(crate) fn consume_at(&mut self, index: usize) {
        self.entries[index].consumed = true;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
