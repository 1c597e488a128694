//! English noun pluralization for resource names
//!
//! Resource plurals are derived from the kind, so the rules must be
//! deterministic: the same kind always yields the same plural, otherwise two
//! reconcilers would install different definitions for one kind.
//!
//! For CamelCase kinds only the last word is pluralized
//! (`NetworkPolicy` -> `NetworkPolicies`), and the case of that word is kept.

use phf::{phf_map, phf_set};

/// Produces the plural form of a noun
pub trait Pluralizer: Send + Sync {
    fn pluralize(&self, word: &str) -> String;
}

/// Irregular singular -> plural forms
static IRREGULAR: phf::Map<&'static str, &'static str> = phf_map! {
    "person" => "people",
    "man" => "men",
    "woman" => "women",
    "child" => "children",
    "ox" => "oxen",
    "mouse" => "mice",
    "louse" => "lice",
    "goose" => "geese",
    "foot" => "feet",
    "tooth" => "teeth",
    "leaf" => "leaves",
    "loaf" => "loaves",
    "half" => "halves",
    "knife" => "knives",
    "life" => "lives",
    "wife" => "wives",
    "wolf" => "wolves",
    "shelf" => "shelves",
    "thief" => "thieves",
    "calf" => "calves",
    "elf" => "elves",
    "quiz" => "quizzes",
    "axis" => "axes",
    "index" => "indices",
    "matrix" => "matrices",
    "vertex" => "vertices",
    "criterion" => "criteria",
    "phenomenon" => "phenomena",
    "datum" => "data",
    "medium" => "media",
    "cactus" => "cacti",
    "fungus" => "fungi",
    "nucleus" => "nuclei",
    "radius" => "radii",
    "hero" => "heroes",
    "potato" => "potatoes",
    "tomato" => "tomatoes",
    "echo" => "echoes",
    "veto" => "vetoes",
};

/// Words whose plural is the word itself
static UNCOUNTABLE: phf::Set<&'static str> = phf_set! {
    "sheep",
    "fish",
    "deer",
    "moose",
    "series",
    "species",
    "news",
    "data",
    "metadata",
    "equipment",
    "information",
    "rice",
    "money",
    "police",
    "software",
    "hardware",
    "firmware",
    "feedback",
    "traffic",
    "people",
    "children",
    "men",
    "women",
};

/// Rule-based English pluralizer
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishPluralizer;

impl Pluralizer for EnglishPluralizer {
    fn pluralize(&self, word: &str) -> String {
        if word.is_empty() {
            return String::new();
        }

        let (head, tail) = split_last_word(word);
        let lower = tail.to_lowercase();
        let plural = pluralize_lowercase(&lower);

        format!("{}{}", head, match_case(tail, &plural))
    }
}

/// Split a CamelCase word into everything before its last word, and the last word
fn split_last_word(word: &str) -> (&str, &str) {
    if word.chars().all(|c| !c.is_lowercase()) {
        return ("", word);
    }

    let split = word
        .char_indices()
        .filter(|(i, c)| *i > 0 && c.is_uppercase())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);

    word.split_at(split)
}

fn pluralize_lowercase(word: &str) -> String {
    if UNCOUNTABLE.contains(word) {
        return word.to_string();
    }
    if let Some(plural) = IRREGULAR.get(word) {
        return (*plural).to_string();
    }

    if let Some(stem) = word.strip_suffix("sis") {
        // analysis -> analyses
        return format!("{}ses", stem);
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{}es", word);
    }
    if let Some(stem) = word.strip_suffix('y') {
        if stem.chars().last().is_some_and(|c| !is_vowel(c)) {
            return format!("{}ies", stem);
        }
    }

    format!("{}s", word)
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Apply the case pattern of `original` to a lowercase `plural`
fn match_case(original: &str, plural: &str) -> String {
    if original.chars().all(|c| !c.is_lowercase()) {
        return plural.to_uppercase();
    }

    let mut chars = original.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            let mut out = String::with_capacity(plural.len());
            let mut rest = plural.chars();
            if let Some(c) = rest.next() {
                out.extend(c.to_uppercase());
            }
            out.extend(rest);
            out
        }
        _ => plural.to_string(),
    }
}
