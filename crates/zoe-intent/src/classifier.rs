// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentence-template intent classifier.
//!
//! Templates are whitespace-separated tokens:
//!
//! - `word` matches one word, case-insensitively
//! - `(set|start)` matches one of the alternatives
//! - `[the]` or `[a|an]` optionally matches one word
//! - `{slot}` captures one or more words into a named slot
//!
//! Trailing punctuation on input words is ignored.

use std::collections::HashMap;

use zoe_core::{IntentPattern, MutableIntentTable};

/// Classification tier of a template match.
pub const PATTERN_TIER: u8 = 0;

/// Outcome of a successful classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: String,
    pub slots: HashMap<String, String>,
    pub confidence: f64,
    pub tier: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(Vec<String>),
    Optional(Vec<String>),
    Slot(String),
}

fn alternatives(body: &str) -> Vec<String> {
    body.split('|')
        .map(|alt| alt.trim().to_lowercase())
        .filter(|alt| !alt.is_empty())
        .collect()
}

fn tokenize(template: &str) -> Vec<Token> {
    template
        .split_whitespace()
        .map(|raw| {
            if let Some(name) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
                Token::Slot(name.to_string())
            } else if let Some(body) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                Token::Optional(alternatives(body))
            } else if let Some(body) = raw.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
                Token::Word(alternatives(body))
            } else {
                Token::Word(vec![raw.to_lowercase()])
            }
        })
        .collect()
}

/// Input words with trailing punctuation removed, original casing kept.
fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_end_matches(['.', ',', '!', '?', ';', ':']))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Backtracking match. Returns the slot captures and the number of literal
/// words matched, used to prefer the most specific template.
fn match_tokens(
    tokens: &[Token],
    input: &[&str],
    slots: &mut Vec<(String, String)>,
) -> Option<usize> {
    let Some((token, rest)) = tokens.split_first() else {
        return input.is_empty().then_some(0);
    };

    match token {
        Token::Word(alts) => {
            let (word, remaining) = input.split_first()?;
            if alts.iter().any(|alt| alt.eq_ignore_ascii_case(word)) {
                match_tokens(rest, remaining, slots).map(|n| n + 1)
            } else {
                None
            }
        }
        Token::Optional(alts) => {
            if let Some((word, remaining)) = input.split_first()
                && alts.iter().any(|alt| alt.eq_ignore_ascii_case(word))
                && let Some(n) = match_tokens(rest, remaining, slots)
            {
                return Some(n + 1);
            }
            match_tokens(rest, input, slots)
        }
        Token::Slot(name) => {
            for take in 1..=input.len() {
                let mark = slots.len();
                slots.push((name.clone(), input[..take].join(" ")));
                if let Some(n) = match_tokens(rest, &input[take..], slots) {
                    return Some(n);
                }
                slots.truncate(mark);
            }
            None
        }
    }
}

/// Classifier over a table of intent patterns.
///
/// The table may be absent until something registers intents, which is the
/// state a freshly constructed [`PatternClassifier::uninitialized`] is in.
#[derive(Debug, Clone, Default)]
pub struct PatternClassifier {
    intents: Option<HashMap<String, IntentPattern>>,
}

impl PatternClassifier {
    /// A classifier with an empty, live table.
    pub fn new() -> Self {
        Self {
            intents: Some(HashMap::new()),
        }
    }

    /// A classifier whose table has not been created yet.
    pub fn uninitialized() -> Self {
        Self { intents: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.intents.is_some()
    }

    pub fn table(&self) -> Option<&HashMap<String, IntentPattern>> {
        self.intents.as_ref()
    }

    /// Registered intent names, sorted.
    pub fn intent_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .intents
            .iter()
            .flat_map(|table| table.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names
    }

    /// Match `text` against every sentence template.
    ///
    /// The template with the most literal words wins; ties go to the intent
    /// name that sorts first.
    pub fn classify(&self, text: &str) -> Option<Classification> {
        let input = words(text);
        if input.is_empty() {
            return None;
        }

        let mut best: Option<(usize, &str, Vec<(String, String)>)> = None;
        for name in self.intent_names() {
            let Some(pattern) = self.intent(name) else {
                continue;
            };
            for template in pattern.sentences() {
                let mut slots = Vec::new();
                let Some(score) = match_tokens(&tokenize(template), &input, &mut slots) else {
                    continue;
                };
                if best.as_ref().is_none_or(|(top, _, _)| score > *top) {
                    best = Some((score, name, slots));
                }
            }
        }

        best.map(|(_, intent, slots)| Classification {
            intent: intent.to_string(),
            slots: slots.into_iter().collect(),
            confidence: 1.0,
            tier: PATTERN_TIER,
        })
    }
}

impl MutableIntentTable for PatternClassifier {
    fn ensure_table(&mut self) -> &mut HashMap<String, IntentPattern> {
        self.intents.get_or_insert_with(HashMap::new)
    }

    fn intent(&self, name: &str) -> Option<&IntentPattern> {
        self.intents.as_ref()?.get(name)
    }
}
