use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;
use std::collections::HashMap;

static DATA_DIR: Dir = include_dir!("src/data");

/// A single verb with its conjugation table, keyed by tense then subject.
#[derive(Deserialize, Clone, Debug)]
pub struct Verb {
    pub infinitive: String,
    pub translation: String,
    pub category: String,
    pub difficulty_tier: u8,
    /// Reflexive/impersonal verbs carry their own subject list; everything
    /// else is sampled from the pool-wide subject set.
    #[serde(default)]
    pub fixed_subjects: Option<Vec<String>>,
    pub conjugations: HashMap<String, HashMap<String, String>>,
}

impl Verb {
    /// Tenses this verb actually conjugates.
    pub fn tenses(&self) -> impl Iterator<Item = &str> {
        self.conjugations.keys().map(String::as_str)
    }

    pub fn form(&self, tense: &str, subject: &str) -> Option<&str> {
        self.conjugations
            .get(tense)
            .and_then(|by_subject| by_subject.get(subject))
            .map(String::as_str)
    }
}

/// Immutable verb reference data for one language, loaded once at startup.
#[derive(Deserialize, Clone, Debug)]
pub struct VerbPool {
    pub name: String,
    pub code: String,
    pub subjects: Vec<String>,
    pub verbs: Vec<Verb>,
}

impl VerbPool {
    pub fn load(file_name: &str) -> Self {
        read_pool_from_file(&format!("{file_name}.json"))
    }

    /// Subjects eligible for a given verb. Fixed-subject verbs (impersonal,
    /// defective) override the language-wide set.
    pub fn subjects_for<'a>(&'a self, verb: &'a Verb) -> &'a [String] {
        match &verb.fixed_subjects {
            Some(fixed) => fixed,
            None => &self.subjects,
        }
    }
}

fn read_pool_from_file(file_name: &str) -> VerbPool {
    from_str(data_file_str(file_name)).expect("Unable to deserialize verb data json")
}

/// Raw contents of an embedded data file; shared with the league loader.
pub(crate) fn data_file_str(file_name: &str) -> &'static str {
    DATA_DIR
        .get_file(file_name)
        .expect("Data file not found")
        .contents_utf8()
        .expect("Unable to interpret file as a string")
}
