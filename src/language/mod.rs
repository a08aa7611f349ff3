pub mod core;
pub mod league;

// Re-export the main types for convenience
pub use core::{Verb, VerbPool};
pub use league::{League, LeagueTable, Opponent};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leagues_match_pool_content() {
        // Every league must be playable against every shipped language:
        // at least one allowed verb conjugating at least one allowed tense.
        let table = LeagueTable::load();

        for file in ["spanish", "french", "german"] {
            let pool = VerbPool::load(file);
            for league in &table.leagues {
                let playable = pool.verbs.iter().any(|v| {
                    league.allows_category(&v.category)
                        && v.tenses().any(|t| league.tenses.iter().any(|lt| lt == t))
                });
                assert!(
                    playable,
                    "league {} has no playable verbs in {}",
                    league.id, pool.name
                );
            }
        }
    }
}
