//! Segment classifier
//!
//! Decides whether a segment is a built-in command, natural language, or an
//! opaque host command. The decision is an ordered list of rules; the first
//! rule that matches wins. The heuristic is coarse on purpose: a lone
//! unrecognized word (even `memory`) goes to the host.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::tokenizer::Segment;

/// Words that mark a segment as a natural-language instruction
pub const NL_KEYWORDS: &[&str] = &[
    // create
    "create", "make", "new",
    // transfer
    "move", "copy", "transfer", "to", "into", "in",
    // nouns
    "folder", "directory", "file", "files", "contents",
    "memory", "ram", "cpu", "processor", "processes", "running",
    "disk", "space", "storage",
    // list / delete / read
    "list", "show", "display", "see",
    "delete", "remove", "rm",
    "read", "open", "view",
    // help
    "help", "what", "can",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    StructuredCommand,
    NaturalLanguage,
    HostFallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub tag: Tag,
    pub text: String,
}

/// What a rule gets to look at
pub struct RuleInput<'a> {
    pub segment: &'a Segment,
    pub builtins: &'a HashSet<String>,
}

/// One step of the classification order
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub tag: Tag,
    pub matches: fn(&RuleInput<'_>) -> bool,
}

fn is_builtin(input: &RuleInput<'_>) -> bool {
    input
        .segment
        .head()
        .map(|head| input.builtins.contains(&head))
        .unwrap_or(false)
}

fn is_single_word(input: &RuleInput<'_>) -> bool {
    input.segment.is_single_word()
}

fn has_nl_keyword(input: &RuleInput<'_>) -> bool {
    input
        .segment
        .tokens
        .iter()
        .any(|token| NL_KEYWORDS.contains(&token.to_lowercase().as_str()))
}

fn always(_: &RuleInput<'_>) -> bool {
    true
}

/// Built-in, single-word, keyword, fallback
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule { name: "builtin", tag: Tag::StructuredCommand, matches: is_builtin },
        Rule { name: "single-word", tag: Tag::HostFallback, matches: is_single_word },
        Rule { name: "nl-keyword", tag: Tag::NaturalLanguage, matches: has_nl_keyword },
        Rule { name: "fallback", tag: Tag::HostFallback, matches: always },
    ]
}

pub struct Classifier {
    rules: Vec<Rule>,
    builtins: HashSet<String>,
}

impl Classifier {
    /// Create a classifier over the given built-in command names
    pub fn new<I, S>(builtin_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_rules(builtin_names, default_rules())
    }

    pub fn with_rules<I, S>(builtin_names: I, rules: Vec<Rule>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let builtins = builtin_names
            .into_iter()
            .map(|name| name.as_ref().to_lowercase())
            .collect();
        Self { rules, builtins }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify one segment. Pure: same text and table give the same answer.
    pub fn classify(&self, segment: &Segment) -> ClassificationResult {
        let input = RuleInput {
            segment,
            builtins: &self.builtins,
        };

        let tag = self
            .rules
            .iter()
            .find(|rule| (rule.matches)(&input))
            .map(|rule| {
                tracing::trace!(rule = rule.name, text = %segment.text, "classifier rule matched");
                rule.tag
            })
            .unwrap_or(Tag::HostFallback);

        ClassificationResult {
            tag,
            text: segment.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(["ls", "cd", "mkdir", "help", "cpu", "mem"])
    }

    fn tag_of(text: &str) -> Tag {
        classifier().classify(&Segment::new(text)).tag
    }

    #[test]
    fn test_builtin_head_wins() {
        assert_eq!(tag_of("ls -la"), Tag::StructuredCommand);
        assert_eq!(tag_of("MKDIR reports"), Tag::StructuredCommand);
        // keyword-bearing text still goes to the built-in
        assert_eq!(tag_of("help me create a file"), Tag::StructuredCommand);
    }

    #[test]
    fn test_single_unknown_word_is_host() {
        assert_eq!(tag_of("whoami"), Tag::HostFallback);
        // a lone keyword is not interpreted
        assert_eq!(tag_of("memory"), Tag::HostFallback);
    }

    #[test]
    fn test_keywords_mark_natural_language() {
        assert_eq!(tag_of("create folder reports"), Tag::NaturalLanguage);
        assert_eq!(tag_of("Show Memory"), Tag::NaturalLanguage);
        assert_eq!(tag_of("move a.txt to archive"), Tag::NaturalLanguage);
    }

    #[test]
    fn test_multi_word_without_keywords_is_host() {
        assert_eq!(tag_of("git status --short"), Tag::HostFallback);
        // substrings of keywords do not count
        assert_eq!(tag_of("ping -c 1 localhost"), Tag::HostFallback);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier();
        let segment = Segment::new("copy notes.md into backup");
        let first = c.classify(&segment);
        for _ in 0..5 {
            assert_eq!(c.classify(&segment), first);
        }
        assert_eq!(first.text, "copy notes.md into backup");
    }

    #[test]
    fn test_rules_are_reorderable() {
        let mut rules = default_rules();
        // drop the single-word rule: lone keywords become natural language
        rules.retain(|r| r.name != "single-word");
        let c = Classifier::with_rules(["ls"], rules);
        assert_eq!(c.classify(&Segment::new("memory")).tag, Tag::NaturalLanguage);
        assert_eq!(c.classify(&Segment::new("whoami")).tag, Tag::HostFallback);
    }
}
