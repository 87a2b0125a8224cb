use rand::Rng;

use crate::{
    core::roster::{Participant, Phase, RosterStore},
    error::Error,
};

/// The winner of a round, plus the full list in insertion order with the
/// winning entry marked. Both are needed for the announcement.
#[derive(PartialEq, Debug, Clone)]
pub struct DrawResult {
    pub winner: Participant,
    pub standings: Vec<Standing>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Standing {
    pub name: String,
    pub is_winner: bool,
}

/// Draw a winner uniformly at random from a FULL roster.
pub fn draw(roster: &RosterStore) -> Result<DrawResult, Error> {
    draw_with(roster, &mut rand::thread_rng())
}

/// Draw with a caller-supplied RNG. Selection, the FULL -> DRAWN flip,
/// and the last-winner record happen in one critical section, so of two
/// racing draws exactly one wins and the other sees `AlreadyDrawn`.
///
/// Uniformity, not unpredictability, is the requirement here: every
/// entry wins with probability `1 / capacity`.
pub fn draw_with<R: Rng>(roster: &RosterStore, rng: &mut R) -> Result<DrawResult, Error> {
    let mut round = roster.lock();

    match round.phase {
        Phase::Drawn => Err(Error::AlreadyDrawn),
        Phase::Open => Err(Error::NotFull {
            got: round.entries.len(),
            want: round.capacity,
        }),
        Phase::Full => {
            let pick = rng.gen_range(0..round.entries.len());
            let winner = round.entries[pick].clone();

            round.phase = Phase::Drawn;
            round.last_winner = Some(winner.identity.clone());

            let standings = round
                .entries
                .iter()
                .enumerate()
                .map(|(idx, p)| Standing {
                    name: p.name.clone(),
                    is_winner: idx == pick,
                })
                .collect();

            Ok(DrawResult { winner, standings })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc, thread};

    use rand::{rngs::StdRng, SeedableRng};

    use super::{draw, draw_with};
    use crate::{
        core::roster::{Phase, RosterStore},
        error::Error,
    };

    fn filled_roster(capacity: usize) -> RosterStore {
        let roster = RosterStore::new(capacity);
        for i in 0..capacity {
            roster.add(&format!("name {}", word(i)), &i.to_string()).unwrap();
        }
        roster
    }

    // Distinct alphabetic suffixes: "ba", "bb", ...
    fn word(i: usize) -> String {
        let a = (b'b' + (i / 26) as u8) as char;
        let b = (b'a' + (i % 26) as u8) as char;
        format!("{}{}", a, b)
    }

    #[test]
    fn test_draw_requires_full() {
        let roster = RosterStore::new(20);
        roster.add("alice", "1").unwrap();

        assert!(matches!(
            draw(&roster),
            Err(Error::NotFull { got: 1, want: 20 })
        ));
        // The rejection must not disturb the round.
        assert_eq!(roster.phase(), Phase::Open);
    }

    #[test]
    fn test_draw_marks_round() {
        let roster = filled_roster(20);

        let result = draw(&roster).unwrap();
        assert_eq!(roster.phase(), Phase::Drawn);
        assert_eq!(roster.last_winner(), Some(result.winner.identity.clone()));

        // Standings keep insertion order with exactly one winner mark.
        assert_eq!(result.standings.len(), 20);
        assert_eq!(result.standings.iter().filter(|s| s.is_winner).count(), 1);
        let list = roster.list().unwrap();
        for (standing, entry) in result.standings.iter().zip(&list) {
            assert_eq!(standing.name, entry.name);
        }

        assert!(matches!(draw(&roster), Err(Error::AlreadyDrawn)));
    }

    #[test]
    fn test_concurrent_draws_yield_one_winner() {
        let roster = Arc::new(filled_roster(20));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let roster = roster.clone();
                thread::spawn(move || draw(&roster))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::AlreadyDrawn))));
    }

    #[test]
    fn test_draw_fairness() {
        const ROUNDS: usize = 20_000;
        const CAPACITY: usize = 20;

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut wins: HashMap<String, usize> = HashMap::new();

        for _ in 0..ROUNDS {
            let roster = filled_roster(CAPACITY);
            let result = draw_with(&roster, &mut rng).unwrap();
            *wins.entry(result.winner.name).or_default() += 1;
        }

        // Expected 1000 wins each; allow a generous sampling tolerance.
        assert_eq!(wins.len(), CAPACITY);
        for (name, count) in wins {
            assert!(
                (700..=1300).contains(&count),
                "{} won {} times, outside tolerance",
                name,
                count
            );
        }
    }
}
