use crate::language::{League, Verb, VerbPool};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// How many times verb sampling may restart before giving up.
pub const RETRY_BUDGET: usize = 10;

/// Size of the multiple-choice option set, correct answer included.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestionError {
    #[error("no verb/tense/subject combination available for this league")]
    NoQuestionAvailable,
}

/// One round's worth of challenge data. Created per round, discarded once
/// answered.
#[derive(Debug, Clone)]
pub struct Question {
    pub infinitive: String,
    pub translation: String,
    pub subject: String,
    pub tense: String,
    pub correct_answer: String,
    /// Exactly four unique options containing `correct_answer` once.
    pub options: Vec<String>,
}

/// Samples verbs, tenses, and subjects inside a league's bracket and builds
/// the shuffled option set. Pure given an injected `Rng`.
pub struct QuestionGenerator {
    pool: VerbPool,
    league: League,
}

impl QuestionGenerator {
    pub fn new(pool: VerbPool, league: League) -> Self {
        Self { pool, league }
    }

    pub fn league(&self) -> &League {
        &self.league
    }

    pub fn generate(&self, rng: &mut impl Rng) -> Result<Question, QuestionError> {
        let eligible: Vec<&Verb> = self
            .pool
            .verbs
            .iter()
            .filter(|v| self.league.allows_category(&v.category))
            .collect();

        if eligible.is_empty() {
            return Err(QuestionError::NoQuestionAvailable);
        }

        for _ in 0..RETRY_BUDGET {
            let verb = eligible.choose(rng).expect("eligible set is non-empty");

            let tenses: Vec<&str> = self
                .league
                .tenses
                .iter()
                .map(String::as_str)
                .filter(|t| verb.conjugations.contains_key(*t))
                .collect();
            let Some(&tense) = tenses.choose(rng) else {
                continue;
            };

            let Some(subject) = self.pool.subjects_for(verb).choose(rng) else {
                continue;
            };

            // The table can be sparse (defective verbs); retry on a miss.
            let Some(correct) = verb.form(tense, subject) else {
                continue;
            };

            let correct = correct.to_string();
            let options = self.build_options(verb, tense, subject, &correct, rng);

            return Ok(Question {
                infinitive: verb.infinitive.clone(),
                translation: verb.translation.clone(),
                subject: subject.clone(),
                tense: tense.to_string(),
                correct_answer: correct,
                options,
            });
        }

        Err(QuestionError::NoQuestionAvailable)
    }

    /// Assemble three unique distractors plus the correct answer, shuffled.
    ///
    /// Preference order: other subject forms of the same verb/tense, then
    /// forms of other verbs in the same tense, then deterministic suffix
    /// mutations of the correct answer.
    fn build_options(
        &self,
        verb: &Verb,
        tense: &str,
        subject: &str,
        correct: &str,
        rng: &mut impl Rng,
    ) -> Vec<String> {
        let wanted = OPTION_COUNT - 1;
        let mut distractors: Vec<String> = Vec::with_capacity(wanted);

        // Other subjects of the same verb and tense
        if let Some(by_subject) = verb.conjugations.get(tense) {
            let mut same_verb: Vec<String> = by_subject
                .iter()
                .filter(|(s, form)| s.as_str() != subject && form.as_str() != correct)
                .map(|(_, form)| form.clone())
                .unique()
                .collect();
            same_verb.shuffle(rng);
            distractors.extend(same_verb.into_iter().take(wanted));
        }

        // Backfill from other verbs conjugating the same tense
        if distractors.len() < wanted {
            let mut others: Vec<&Verb> = self
                .pool
                .verbs
                .iter()
                .filter(|v| v.infinitive != verb.infinitive)
                .collect();
            others.shuffle(rng);

            for other in others {
                if distractors.len() >= wanted {
                    break;
                }
                let Some(by_subject) = other.conjugations.get(tense) else {
                    continue;
                };
                let form = by_subject
                    .get(subject)
                    .or_else(|| by_subject.values().next());
                if let Some(form) = form {
                    if form != correct && !distractors.iter().any(|d| d == form) {
                        distractors.push(form.clone());
                    }
                }
            }
        }

        // Last resort: mutate the correct answer's ending
        let mut mutation = 0;
        while distractors.len() < wanted {
            let candidate = mutate_suffix(correct, mutation);
            mutation += 1;
            if candidate != correct && !distractors.iter().any(|d| d == &candidate) {
                distractors.push(candidate);
            }
        }

        let mut options = distractors;
        options.push(correct.to_string());
        options.shuffle(rng);
        options
    }
}

/// Deterministic suffix substitution used to pad the distractor set when the
/// pool cannot supply enough real forms.
fn mutate_suffix(correct: &str, mutation: usize) -> String {
    const SUFFIXES: [&str; 8] = ["o", "as", "a", "es", "e", "en", "an", "emos"];

    let stem: String = {
        let mut chars: Vec<char> = correct.chars().collect();
        chars.pop();
        chars.into_iter().collect()
    };

    if mutation < SUFFIXES.len() {
        format!("{stem}{}", SUFFIXES[mutation])
    } else {
        // Pathological pools only; keep extending until unique
        format!("{correct}{}", "s".repeat(mutation - SUFFIXES.len() + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LeagueTable;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator(league_id: &str) -> QuestionGenerator {
        let pool = VerbPool::load("spanish");
        let league = LeagueTable::load().by_id(league_id).unwrap().clone();
        QuestionGenerator::new(pool, league)
    }

    fn assert_well_formed(q: &Question) {
        assert_eq!(q.options.len(), OPTION_COUNT);
        assert_eq!(
            q.options.iter().filter(|o| **o == q.correct_answer).count(),
            1,
            "correct answer must appear exactly once in {:?}",
            q.options
        );
        assert_eq!(
            q.options.iter().unique().count(),
            OPTION_COUNT,
            "options must be unique: {:?}",
            q.options
        );
    }

    #[test]
    fn test_generate_returns_well_formed_questions() {
        let gen = generator("gold");
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let q = gen.generate(&mut rng).unwrap();
            assert_well_formed(&q);
        }
    }

    #[test]
    fn test_generate_respects_league_bracket() {
        let gen = generator("bronze");
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let q = gen.generate(&mut rng).unwrap();
            assert_eq!(q.tense, "present");
            // Bronze only allows regular verbs
            assert!(["hablar", "comer", "vivir"].contains(&q.infinitive.as_str()));
        }
    }

    #[test]
    fn test_generate_is_deterministic_for_a_seed() {
        let gen = generator("silver");
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);

        let qa = gen.generate(&mut a).unwrap();
        let qb = gen.generate(&mut b).unwrap();
        assert_eq!(qa.correct_answer, qb.correct_answer);
        assert_eq!(qa.options, qb.options);
    }

    #[test]
    fn test_no_eligible_verbs_fails() {
        let pool = VerbPool::load("spanish");
        let mut league = LeagueTable::load().by_id("bronze").unwrap().clone();
        league.verb_categories = vec!["modal".to_string()];

        let gen = QuestionGenerator::new(pool, league);
        let mut rng = StdRng::seed_from_u64(1);
        assert_matches!(gen.generate(&mut rng), Err(QuestionError::NoQuestionAvailable));
    }

    #[test]
    fn test_no_conjugated_tense_fails_within_budget() {
        let pool = VerbPool::load("spanish");
        let mut league = LeagueTable::load().by_id("bronze").unwrap().clone();
        league.tenses = vec!["future".to_string()];

        let gen = QuestionGenerator::new(pool, league);
        let mut rng = StdRng::seed_from_u64(1);
        assert_matches!(gen.generate(&mut rng), Err(QuestionError::NoQuestionAvailable));
    }

    #[test]
    fn test_impersonal_verb_uses_fixed_subject() {
        let pool = VerbPool::load("spanish");
        let mut league = LeagueTable::load().by_id("gold").unwrap().clone();
        league.verb_categories = vec!["impersonal".to_string()];

        let gen = QuestionGenerator::new(pool, league);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..20 {
            let q = gen.generate(&mut rng).unwrap();
            assert_eq!(q.infinitive, "llover");
            assert_eq!(q.subject, "él/ella");
            assert_well_formed(&q);
        }
    }

    #[test]
    fn test_sparse_table_pads_with_mutations() {
        // A pool with a single one-cell verb can only satisfy the option
        // count through suffix mutations.
        let pool: VerbPool = serde_json::from_str(
            r#"{
                "name": "tiny", "code": "xx",
                "subjects": ["yo"],
                "verbs": [{
                    "infinitive": "solo",
                    "translation": "only",
                    "category": "regular",
                    "difficulty_tier": 1,
                    "conjugations": { "present": { "yo": "soloo" } }
                }]
            }"#,
        )
        .unwrap();
        let mut league = LeagueTable::load().by_id("bronze").unwrap().clone();
        league.tenses = vec!["present".to_string()];

        let gen = QuestionGenerator::new(pool, league);
        let mut rng = StdRng::seed_from_u64(3);
        let q = gen.generate(&mut rng).unwrap();
        assert_well_formed(&q);
    }

    #[test]
    fn test_mutate_suffix_is_deterministic() {
        assert_eq!(mutate_suffix("hablo", 0), mutate_suffix("hablo", 0));
        assert_ne!(mutate_suffix("hablo", 0), mutate_suffix("hablo", 1));
        // Multi-byte endings must not split a char boundary
        let mutated = mutate_suffix("habló", 0);
        assert!(mutated.starts_with("habl"));
    }
}
