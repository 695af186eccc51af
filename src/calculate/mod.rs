//! Statistics calculation engine.
//!
//! Computes derived metrics from already-fetched duel records:
//! - Overall, turn-order, per-deck and per-opponent win rates
//! - Per-event statistics
//! - Per-period (day / week / month) statistics
//!
//! Everything here is pure: no I/O, no clock reads, no shared state.
//! Output does not depend on input order.

mod breakdown;
mod period;

pub use breakdown::*;
pub use period::*;

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};

use crate::models::{
    DeckId, DuelRecord, Event, EventId, EventStatistics, Statistics, TurnOrder, WinLossStat,
};

/// Calculate win rate as a percentage (0.0 to 100.0).
/// Zero when there are no games.
pub fn calculate_win_rate(wins: u32, losses: u32) -> f64 {
    let total = wins + losses;
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64 * 100.0
    }
}

/// Running win/loss counter.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    wins: u32,
    losses: u32,
}

impl Tally {
    fn record(&mut self, win: bool) {
        if win {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    fn total(&self) -> u32 {
        self.wins + self.losses
    }

    fn win_rate(&self) -> f64 {
        calculate_win_rate(self.wins, self.losses)
    }

    fn into_stat(self) -> WinLossStat {
        WinLossStat {
            wins: self.wins,
            losses: self.losses,
            win_rate: self.win_rate(),
        }
    }
}

/// Compute the aggregate report for a set of duel records.
///
/// Never fails. Duplicate ids are counted once per occurrence.
pub fn compute_statistics<I, R>(records: I) -> Statistics
where
    I: IntoIterator<Item = R>,
    R: Borrow<DuelRecord>,
{
    let mut overall = Tally::default();
    let mut first = Tally::default();
    let mut second = Tally::default();
    let mut decks: BTreeMap<String, Tally> = BTreeMap::new();
    let mut opponents: BTreeMap<String, Tally> = BTreeMap::new();

    for record in records {
        let record = record.borrow();
        let win = record.is_win();

        overall.record(win);
        match record.turn_order {
            TurnOrder::First => first.record(win),
            TurnOrder::Second => second.record(win),
        }

        decks
            .entry(record.own_deck_id.as_str().to_string())
            .or_default()
            .record(win);
        opponents
            .entry(record.opponent_deck_name.clone())
            .or_default()
            .record(win);
    }

    Statistics {
        total_duels: overall.total(),
        wins: overall.wins,
        losses: overall.losses,
        win_rate: overall.win_rate(),
        first_player_duels: first.total(),
        second_player_duels: second.total(),
        first_player_win_rate: first.win_rate(),
        second_player_win_rate: second.win_rate(),
        deck_stats: decks.into_iter().map(|(k, t)| (k, t.into_stat())).collect(),
        opponent_stats: opponents
            .into_iter()
            .map(|(k, t)| (k, t.into_stat()))
            .collect(),
    }
}

/// Compute statistics and tag them with an event.
///
/// The records' own event ids are not checked against `event_id`.
pub fn compute_event_statistics<I, R>(
    records: I,
    event_id: EventId,
    event_name: impl Into<String>,
) -> EventStatistics
where
    I: IntoIterator<Item = R>,
    R: Borrow<DuelRecord>,
{
    EventStatistics {
        event_id,
        event_name: event_name.into(),
        stats: compute_statistics(records),
    }
}

/// One `EventStatistics` per event, in the order the events are given.
///
/// Events without duels get zeroed statistics. Records whose event is not
/// in `events` are ignored.
pub fn compute_statistics_by_event(records: &[DuelRecord], events: &[Event]) -> Vec<EventStatistics> {
    let mut by_event: HashMap<&EventId, Vec<&DuelRecord>> = HashMap::new();
    for record in records {
        by_event.entry(&record.event_id).or_default().push(record);
    }

    events
        .iter()
        .map(|event| {
            let duels = by_event.remove(&event.id).unwrap_or_default();
            compute_event_statistics(duels, event.id.clone(), event.name.clone())
        })
        .collect()
}

/// Keep the records matching a predicate.
pub fn filter_records<'a, P>(records: &'a [DuelRecord], predicate: P) -> Vec<&'a DuelRecord>
where
    P: Fn(&DuelRecord) -> bool,
{
    records.iter().filter(|r| predicate(r)).collect()
}

/// Records played with a given own deck.
pub fn filter_by_deck<'a>(records: &'a [DuelRecord], deck_id: &DeckId) -> Vec<&'a DuelRecord> {
    filter_records(records, |r| &r.own_deck_id == deck_id)
}

/// Records filed under a given event.
pub fn filter_by_event<'a>(records: &'a [DuelRecord], event_id: &EventId) -> Vec<&'a DuelRecord> {
    filter_records(records, |r| &r.event_id == event_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DuelResult;
    use pretty_assertions::assert_eq;

    pub(crate) fn duel(
        result: DuelResult,
        turn_order: TurnOrder,
        deck: &str,
        opponent: &str,
    ) -> DuelRecord {
        DuelRecord::new(
            "owner".into(),
            "event-1".into(),
            deck.into(),
            opponent.to_string(),
            turn_order,
            result,
        )
    }

    fn scenario() -> Vec<DuelRecord> {
        vec![
            duel(DuelResult::Win, TurnOrder::First, "A", "Dragons"),
            duel(DuelResult::Lose, TurnOrder::Second, "A", "Dragons"),
            duel(DuelResult::Win, TurnOrder::Second, "B", "Spellcasters"),
        ]
    }

    #[test]
    fn test_calculate_win_rate() {
        assert_eq!(calculate_win_rate(0, 0), 0.0);
        assert_eq!(calculate_win_rate(3, 3), 50.0);
        assert_eq!(calculate_win_rate(1, 0), 100.0);
        assert!((calculate_win_rate(5, 1) - 83.333).abs() < 0.01);
    }

    #[test]
    fn test_compute_statistics_scenario() {
        let stats = compute_statistics(&scenario());

        assert_eq!(stats.total_duels, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.win_rate, 2.0 / 3.0 * 100.0);
        assert!((stats.win_rate - 66.67).abs() < 0.01);
        assert_eq!(stats.first_player_win_rate, 100.0);
        assert_eq!(stats.second_player_win_rate, 50.0);

        let mut expected_decks = BTreeMap::new();
        expected_decks.insert(
            "A".to_string(),
            WinLossStat {
                wins: 1,
                losses: 1,
                win_rate: 50.0,
            },
        );
        expected_decks.insert(
            "B".to_string(),
            WinLossStat {
                wins: 1,
                losses: 0,
                win_rate: 100.0,
            },
        );
        assert_eq!(stats.deck_stats, expected_decks);

        assert_eq!(stats.opponent_stats["Dragons"].wins, 1);
        assert_eq!(stats.opponent_stats["Dragons"].losses, 1);
        assert_eq!(stats.opponent_stats["Dragons"].win_rate, 50.0);
        assert_eq!(stats.opponent_stats["Spellcasters"].win_rate, 100.0);
        assert_eq!(stats.opponent_stats.len(), 2);
    }

    #[test]
    fn test_compute_statistics_empty() {
        let stats = compute_statistics(&Vec::<DuelRecord>::new());
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.win_rate, 0.0);
        assert!(stats.deck_stats.is_empty());
        assert!(stats.opponent_stats.is_empty());
    }

    #[test]
    fn test_turn_order_rates_independent() {
        let records = vec![
            duel(DuelResult::Win, TurnOrder::First, "A", "X"),
            duel(DuelResult::Lose, TurnOrder::First, "A", "X"),
        ];
        let stats = compute_statistics(&records);

        assert_eq!(stats.first_player_win_rate, 50.0);
        assert_eq!(stats.second_player_win_rate, 0.0);
        assert_eq!(stats.second_player_duels, 0);
    }

    #[test]
    fn test_counts_add_up() {
        let records = scenario();
        let stats = compute_statistics(&records);

        assert_eq!(stats.wins + stats.losses, stats.total_duels);
        assert_eq!(stats.total_duels as usize, records.len());
        assert_eq!(
            stats.first_player_duels + stats.second_player_duels,
            stats.total_duels
        );
        for (deck, stat) in &stats.deck_stats {
            let count = records
                .iter()
                .filter(|r| r.own_deck_id.as_str() == deck)
                .count();
            assert_eq!(stat.games() as usize, count);
        }
    }

    #[test]
    fn test_order_independent_and_idempotent() {
        let records = scenario();
        let mut reversed = records.clone();
        reversed.reverse();

        let a = compute_statistics(&records);
        let b = compute_statistics(&records);
        let c = compute_statistics(&reversed);

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&c).unwrap()
        );
    }

    #[test]
    fn test_duplicate_ids_counted_each_time() {
        let record = duel(DuelResult::Win, TurnOrder::First, "A", "X");
        let records = vec![record.clone(), record];
        let stats = compute_statistics(&records);
        assert_eq!(stats.total_duels, 2);
        assert_eq!(stats.deck_stats["A"].wins, 2);
    }

    #[test]
    fn test_opponent_names_not_canonicalized() {
        let records = vec![
            duel(DuelResult::Win, TurnOrder::First, "A", "Dragons"),
            duel(DuelResult::Win, TurnOrder::First, "A", "dragons"),
            duel(DuelResult::Win, TurnOrder::First, "A", "Dragons "),
        ];
        let stats = compute_statistics(&records);
        assert_eq!(stats.opponent_stats.len(), 3);
    }

    #[test]
    fn test_filter_by_deck_commutes_with_breakdown() {
        let records = scenario();
        let all = compute_statistics(&records);

        for deck in ["A", "B"] {
            let filtered = filter_by_deck(&records, &DeckId::from(deck));
            let stats = compute_statistics(filtered);
            assert_eq!(stats.wins, all.deck_stats[deck].wins);
            assert_eq!(stats.losses, all.deck_stats[deck].losses);
            assert_eq!(stats.win_rate, all.deck_stats[deck].win_rate);
        }
    }

    #[test]
    fn test_filter_by_event() {
        let mut records = scenario();
        records[2].event_id = "event-2".into();

        let first = filter_by_event(&records, &"event-1".into());
        let second = filter_by_event(&records, &"event-2".into());
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert!(filter_by_event(&records, &"missing".into()).is_empty());
    }

    #[test]
    fn test_compute_event_statistics_tags_verbatim() {
        let records = scenario();
        let tagged = compute_event_statistics(&records, "unrelated".into(), "Spring Cup");

        assert_eq!(tagged.event_id.as_str(), "unrelated");
        assert_eq!(tagged.event_name, "Spring Cup");
        assert_eq!(tagged.stats, compute_statistics(&records));
    }

    #[test]
    fn test_compute_statistics_by_event() {
        let mut records = scenario();
        records[2].event_id = "event-2".into();

        let mut e1 = Event::new("owner".into(), "One".to_string(), String::new());
        e1.id = "event-1".into();
        let mut e2 = Event::new("owner".into(), "Two".to_string(), String::new());
        e2.id = "event-2".into();
        let mut e3 = Event::new("owner".into(), "Empty".to_string(), String::new());
        e3.id = "event-3".into();

        let per_event = compute_statistics_by_event(&records, &[e2, e1, e3]);

        assert_eq!(per_event.len(), 3);
        assert_eq!(per_event[0].event_name, "Two");
        assert_eq!(per_event[0].stats.total_duels, 1);
        assert_eq!(per_event[1].event_name, "One");
        assert_eq!(per_event[1].stats.total_duels, 2);
        assert_eq!(per_event[2].stats, Statistics::default());
    }
}
