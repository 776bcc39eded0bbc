//! AttributionSink — единственная точка эмиссии EntityAttack
//!
//! Fan-out: подписчики получают `&EntityAttack` синхронно, плюс outbound очередь,
//! которую host (или `process_world_events`) забирает через `drain`.
//! Подписчики не имеют доступа к engine, поэтому re-entrancy невозможна.

use super::EntityAttack;

type Subscriber = Box<dyn Fn(&EntityAttack) + Send + Sync>;

#[derive(Default)]
pub struct AttributionSink {
    subscribers: Vec<Subscriber>,
    outbox: Vec<EntityAttack>,
    emitted_total: u64,
}

impl AttributionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Fn(&EntityAttack) + Send + Sync + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn emit(&mut self, attack: EntityAttack) {
        crate::logger::log_info(&format!(
            "🩸 Attack attributed: {:?} → {:?} (weapon: {:?}, source: {:?})",
            attack.attacker, attack.victim, attack.weapon, attack.source
        ));

        for subscriber in &self.subscribers {
            subscriber(&attack);
        }

        self.emitted_total += 1;
        self.outbox.push(attack);
    }

    /// Забирает все накопленные факты (в порядке эмиссии)
    pub fn drain(&mut self) -> Vec<EntityAttack> {
        std::mem::take(&mut self.outbox)
    }

    pub fn pending(&self) -> &[EntityAttack] {
        &self.outbox
    }

    /// Сколько фактов эмитировано за всё время жизни sink
    pub fn emitted_total(&self) -> u64 {
        self.emitted_total
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for AttributionSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributionSink")
            .field("subscribers", &self.subscribers.len())
            .field("outbox", &self.outbox)
            .field("emitted_total", &self.emitted_total)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::AttackSource;
    use bevy::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn attack(attacker: u32, victim: u32) -> EntityAttack {
        EntityAttack {
            attacker: Entity::from_raw(attacker),
            victim: Entity::from_raw(victim),
            weapon: None,
            source: AttackSource::Melee,
        }
    }

    #[test]
    fn test_fan_out_to_every_subscriber() {
        let mut sink = AttributionSink::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            sink.subscribe(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        sink.emit(attack(1, 2));

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(sink.subscriber_count(), 3);
    }

    #[test]
    fn test_drain_empties_outbox_in_order() {
        let mut sink = AttributionSink::new();
        sink.emit(attack(1, 2));
        sink.emit(attack(3, 4));

        let drained = sink.drain();
        assert_eq!(drained, vec![attack(1, 2), attack(3, 4)]);
        assert!(sink.pending().is_empty());
        assert_eq!(sink.emitted_total(), 2);
    }
}
