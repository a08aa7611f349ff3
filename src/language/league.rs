use serde::Deserialize;
use serde_json::from_str;

use super::core::data_file_str;

/// One enemy encounter. Immutable; health is tracked on the battle state.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Opponent {
    pub id: String,
    pub name: String,
    pub max_health: u32,
    pub difficulty_tier: u8,
}

/// A difficulty bracket bounding which verbs, tenses, and opponents are
/// selectable.
#[derive(Deserialize, Clone, Debug)]
pub struct League {
    pub id: String,
    pub name: String,
    pub min_level: u32,
    pub max_level: u32,
    pub verb_categories: Vec<String>,
    pub tenses: Vec<String>,
    pub opponents: Vec<Opponent>,
}

impl League {
    pub fn allows_category(&self, category: &str) -> bool {
        self.verb_categories.iter().any(|c| c == category)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct LeagueTable {
    pub leagues: Vec<League>,
}

impl LeagueTable {
    pub fn load() -> Self {
        from_str(data_file_str("leagues.json")).expect("Unable to deserialize league json")
    }

    pub fn by_id(&self, id: &str) -> Option<&League> {
        self.leagues.iter().find(|l| l.id == id)
    }

    /// League whose level bracket contains the player's level, falling back
    /// to the last league for levels past the table.
    pub fn for_level(&self, level: u32) -> &League {
        self.leagues
            .iter()
            .find(|l| level >= l.min_level && level <= l.max_level)
            .unwrap_or_else(|| self.leagues.last().expect("league table is empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_table_loads() {
        let table = LeagueTable::load();
        assert!(table.leagues.len() >= 3);

        for league in &table.leagues {
            assert!(!league.opponents.is_empty());
            assert!(!league.tenses.is_empty());
            assert!(!league.verb_categories.is_empty());
            for opponent in &league.opponents {
                assert!(opponent.max_health > 0);
            }
        }
    }

    #[test]
    fn test_by_id() {
        let table = LeagueTable::load();
        assert!(table.by_id("bronze").is_some());
        assert!(table.by_id("platinum").is_none());
    }

    #[test]
    fn test_for_level_brackets() {
        let table = LeagueTable::load();

        assert_eq!(table.for_level(1).id, "bronze");
        assert_eq!(table.for_level(4).id, "bronze");
        assert_eq!(table.for_level(5).id, "silver");
        assert_eq!(table.for_level(10).id, "gold");
        // Past the table, the last league applies
        assert_eq!(table.for_level(500).id, "gold");
    }

    #[test]
    fn test_allows_category() {
        let table = LeagueTable::load();
        let bronze = table.by_id("bronze").unwrap();

        assert!(bronze.allows_category("regular"));
        assert!(!bronze.allows_category("irregular"));
    }
}
