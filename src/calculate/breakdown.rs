//! Presentation-ready breakdown tables.

use std::collections::{BTreeSet, HashMap};

use crate::models::{Deck, DeckBreakdown, DuelRecord, OpponentBreakdown, Statistics};

/// Per-deck rows with display names resolved against the owner's decks.
///
/// Deleted decks keep their row, named by the raw id. Sorted by games
/// played (descending), then deck id.
pub fn deck_breakdown(stats: &Statistics, decks: &[Deck]) -> Vec<DeckBreakdown> {
    let names: HashMap<&str, &str> = decks
        .iter()
        .map(|d| (d.id.as_str(), d.name.as_str()))
        .collect();

    let mut rows: Vec<DeckBreakdown> = stats
        .deck_stats
        .iter()
        .map(|(deck_id, stat)| {
            let name = names.get(deck_id.as_str()).copied();
            DeckBreakdown {
                deck_id: deck_id.clone(),
                deck_name: name.unwrap_or(deck_id.as_str()).to_string(),
                deck_exists: name.is_some(),
                wins: stat.wins,
                losses: stat.losses,
                win_rate: stat.win_rate,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        (b.wins + b.losses)
            .cmp(&(a.wins + a.losses))
            .then_with(|| a.deck_id.cmp(&b.deck_id))
    });
    rows
}

/// Per-opponent rows, most-played first.
pub fn opponent_breakdown(stats: &Statistics) -> Vec<OpponentBreakdown> {
    let mut rows: Vec<OpponentBreakdown> = stats
        .opponent_stats
        .iter()
        .map(|(name, stat)| OpponentBreakdown {
            opponent_deck_name: name.clone(),
            wins: stat.wins,
            losses: stat.losses,
            win_rate: stat.win_rate,
        })
        .collect();

    rows.sort_by(|a, b| {
        (b.wins + b.losses)
            .cmp(&(a.wins + a.losses))
            .then_with(|| a.opponent_deck_name.cmp(&b.opponent_deck_name))
    });
    rows
}

/// Distinct opponent deck names seen so far, sorted.
///
/// With a query, keeps names containing it (case-insensitive).
pub fn opponent_deck_names<'a, I>(records: I, query: Option<&str>) -> Vec<String>
where
    I: IntoIterator<Item = &'a DuelRecord>,
{
    let needle = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let names: BTreeSet<&str> = records
        .into_iter()
        .map(|r| r.opponent_deck_name.as_str())
        .filter(|n| !n.trim().is_empty())
        .filter(|n| match &needle {
            Some(q) => n.to_lowercase().contains(q.as_str()),
            None => true,
        })
        .collect();

    names.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::compute_statistics;
    use crate::calculate::tests::duel;
    use crate::models::{DuelResult, NewDeck, TurnOrder};

    fn deck(id: &str, name: &str) -> Deck {
        let mut d = Deck::new(
            "owner".into(),
            NewDeck {
                name: name.to_string(),
                ..Default::default()
            },
        );
        d.id = id.into();
        d
    }

    #[test]
    fn test_deck_breakdown_resolves_names() {
        let records = vec![
            duel(DuelResult::Win, TurnOrder::First, "A", "X"),
            duel(DuelResult::Lose, TurnOrder::First, "A", "X"),
            duel(DuelResult::Win, TurnOrder::First, "gone", "X"),
        ];
        let stats = compute_statistics(&records);
        let rows = deck_breakdown(&stats, &[deck("A", "Blue-Eyes")]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].deck_id, "A");
        assert_eq!(rows[0].deck_name, "Blue-Eyes");
        assert!(rows[0].deck_exists);
        assert_eq!(rows[0].win_rate, 50.0);

        assert_eq!(rows[1].deck_name, "gone");
        assert!(!rows[1].deck_exists);
    }

    #[test]
    fn test_opponent_breakdown_sorted_by_games() {
        let records = vec![
            duel(DuelResult::Win, TurnOrder::First, "A", "Rare"),
            duel(DuelResult::Win, TurnOrder::First, "A", "Common"),
            duel(DuelResult::Lose, TurnOrder::Second, "A", "Common"),
        ];
        let rows = opponent_breakdown(&compute_statistics(&records));

        assert_eq!(rows[0].opponent_deck_name, "Common");
        assert_eq!(rows[0].wins + rows[0].losses, 2);
        assert_eq!(rows[1].opponent_deck_name, "Rare");
    }

    #[test]
    fn test_opponent_deck_names_search() {
        let records = vec![
            duel(DuelResult::Win, TurnOrder::First, "A", "Sky Striker"),
            duel(DuelResult::Win, TurnOrder::First, "A", "Dragon Link"),
            duel(DuelResult::Win, TurnOrder::First, "A", "Sky Striker"),
            duel(DuelResult::Win, TurnOrder::First, "A", "Snake-Eye"),
        ];

        let all = opponent_deck_names(&records, None);
        assert_eq!(all, vec!["Dragon Link", "Sky Striker", "Snake-Eye"]);

        let filtered = opponent_deck_names(&records, Some("SK"));
        assert_eq!(filtered, vec!["Sky Striker"]);

        let blank = opponent_deck_names(&records, Some("  "));
        assert_eq!(blank.len(), 3);
    }
}
