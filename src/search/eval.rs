use std::collections::{BTreeSet, HashMap};

use anyhow::Context;
use regex::Regex;

use super::{
    category::AggregateKind,
    compiler::{Clause, Predicate, TagId, TextMatch, WildcardPattern},
};
use crate::posts::{AnnotatedPost, Tag, TagAlias};

/// Board lookups and precompiled wildcard patterns for evaluating one predicate.
pub struct EvalContext<'a> {
    tag_names: HashMap<TagId, &'a str>,
    alias_names: HashMap<TagId, Vec<&'a str>>,
    patterns: HashMap<&'a WildcardPattern, Regex>,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        tags: &'a [Tag],
        aliases: &'a [TagAlias],
        predicate: &'a Predicate,
    ) -> anyhow::Result<Self> {
        let tag_names = tags.iter().map(|tag| (tag.id, tag.name.as_str())).collect();

        let mut alias_names: HashMap<TagId, Vec<&str>> = HashMap::new();
        for alias in aliases {
            alias_names
                .entry(alias.tag_id)
                .or_default()
                .push(alias.name.as_str());
        }

        let mut patterns = HashMap::new();
        let mut failed = None;
        predicate.visit_clauses(&mut |clause| {
            let pattern = match clause {
                Clause::TagName(TextMatch::Pattern(pattern))
                | Clause::TagAlias(TextMatch::Pattern(pattern))
                | Clause::CommentBy(TextMatch::Pattern(pattern))
                | Clause::UploadedBy(TextMatch::Pattern(pattern))
                | Clause::Source(TextMatch::Pattern(pattern)) => pattern,
                _ => return,
            };
            if failed.is_some() || patterns.contains_key(pattern) {
                return;
            }
            match pattern.to_regex() {
                Ok(re) => {
                    patterns.insert(pattern, re);
                }
                Err(err) => failed = Some((pattern.text.clone(), err)),
            }
        });
        if let Some((text, err)) = failed {
            return Err(err).with_context(|| format!("failed to compile pattern for {text:?}"));
        }

        Ok(EvalContext {
            tag_names,
            alias_names,
            patterns,
        })
    }

    pub fn eval(&self, predicate: &Predicate, post: &AnnotatedPost) -> bool {
        match predicate {
            Predicate::All(preds) => preds.iter().all(|pred| self.eval(pred, post)),
            Predicate::Not(inner) => !self.eval(inner, post),
            Predicate::Clause(clause) => self.eval_clause(clause, post),
        }
    }

    fn text_matches(&self, text_match: &TextMatch, value: &str) -> bool {
        match text_match {
            TextMatch::Exact(expected) => expected == value,
            TextMatch::Pattern(pattern) => self
                .patterns
                .get(pattern)
                .is_some_and(|re| re.is_match(value)),
        }
    }

    fn eval_clause(&self, clause: &Clause, annotated: &AnnotatedPost) -> bool {
        let post = &annotated.post;
        match clause {
            Clause::TagName(text) => post.tags.iter().any(|id| {
                self.tag_names
                    .get(id)
                    .is_some_and(|name| self.text_matches(text, name))
            }),
            Clause::TagAlias(text) => post.tags.iter().any(|id| {
                self.alias_names
                    .get(id)
                    .is_some_and(|names| names.iter().any(|name| self.text_matches(text, name)))
            }),
            Clause::TagId(tag_id) => post.tags.contains(tag_id),
            Clause::TaggedWithAny(tag_ids) => post.tags.iter().any(|id| tag_ids.contains(id)),
            Clause::PostId(cmp) => cmp.matches(post.id),
            Clause::Aggregate(kind, cmp) => annotated
                .annotation(*kind)
                .is_some_and(|count| cmp.matches(count)),
            Clause::CommentBy(text) => post
                .comments
                .iter()
                .any(|comment| self.text_matches(text, &comment.author)),
            Clause::UploadedBy(text) => self.text_matches(text, &post.uploader),
            Clause::RatingLevel(cmp) => cmp.matches(post.rating_level.value() as i64),
            Clause::Height(cmp) => post
                .media
                .as_ref()
                .is_some_and(|media| media.is_image() && cmp.matches(media.height)),
            Clause::Width(cmp) => post
                .media
                .as_ref()
                .is_some_and(|media| media.is_image() && cmp.matches(media.width)),
            Clause::Source(text) => post
                .src_url
                .as_deref()
                .is_some_and(|src| self.text_matches(text, src)),
            Clause::MediaType(kind) => post.media.as_ref().is_some_and(|media| media.kind == *kind),
        }
    }
}

/// Aggregates the predicate reads, each must be annotated on every post.
pub fn referenced_aggregates(predicate: &Predicate) -> BTreeSet<AggregateKind> {
    let mut kinds = BTreeSet::new();
    predicate.visit_clauses(&mut |clause| {
        if let Clause::Aggregate(kind, _) = clause {
            kinds.insert(*kind);
        }
    });
    kinds
}
