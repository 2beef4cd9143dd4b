use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use super::{
    category::{AggregateKind, TokenArgRelation},
    errors::{ArgError, SearchError, SearchResult},
    lexer::{insert_markers, NamedToken},
};
use crate::media::{RatingLevel, SupportedMediaType};

pub type TagId = u64;

/// A relation-aware comparison against a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Comparison<T> {
    pub relation: TokenArgRelation,
    pub value: T,
}

impl<T: PartialOrd> Comparison<T> {
    pub fn new(relation: TokenArgRelation, value: T) -> Self {
        Self { relation, value }
    }

    pub fn equal(value: T) -> Self {
        Self::new(TokenArgRelation::Equal, value)
    }

    pub fn matches(&self, actual: T) -> bool {
        match self.relation {
            TokenArgRelation::Equal => actual == self.value,
            TokenArgRelation::LessThan => actual < self.value,
            TokenArgRelation::GreaterThan => actual > self.value,
        }
    }
}

/// A text pattern with multi-character wildcards at char offsets of `text`.
///
/// The pattern is kept backend agnostic: a store translates it with
/// [`WildcardPattern::to_like`] or [`WildcardPattern::to_regex`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WildcardPattern {
    pub text: String,
    pub positions: Vec<usize>,
}

impl WildcardPattern {
    /// SQL `LIKE` pattern, escaping `\`, `%` and `_` in the literal text.
    pub fn to_like(&self) -> String {
        let mut like = String::with_capacity(self.text.len() + self.positions.len());
        let mut positions = self.positions.iter().peekable();
        for (idx, c) in self.text.chars().enumerate() {
            while positions.next_if(|pos| **pos <= idx).is_some() {
                like.push('%');
            }
            if matches!(c, '\\' | '%' | '_') {
                like.push('\\');
            }
            like.push(c);
        }
        for _ in positions {
            like.push('%');
        }
        like
    }

    /// Anchored regex where every wildcard matches any run of characters.
    pub fn to_regex(&self) -> Result<Regex, regex::Error> {
        // NUL never survives the name validators, so it is safe as a placeholder
        let marked = insert_markers(&self.text, &self.positions, "\0");
        let body = marked
            .split('\0')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Regex::new(&format!("^(?s:{body})$"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatch {
    Exact(String),
    Pattern(WildcardPattern),
}

impl TextMatch {
    fn from_token(token: &NamedToken) -> Self {
        if token.has_wildcards() {
            TextMatch::Pattern(WildcardPattern {
                text: token.arg.clone(),
                positions: token.wildcard_positions.clone(),
            })
        } else {
            TextMatch::Exact(token.arg.clone())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    /// The post has a tag whose name matches.
    TagName(TextMatch),
    /// The post has a tag with an alias whose name matches.
    TagAlias(TextMatch),
    TagId(TagId),
    TaggedWithAny(BTreeSet<TagId>),
    PostId(Comparison<u64>),
    Aggregate(AggregateKind, Comparison<u64>),
    CommentBy(TextMatch),
    UploadedBy(TextMatch),
    RatingLevel(Comparison<i64>),
    /// Only image posts have a height.
    Height(Comparison<i64>),
    /// Only image posts have a width.
    Width(Comparison<i64>),
    Source(TextMatch),
    MediaType(SupportedMediaType),
}

/// Filter expression handed to a [`crate::posts::PostStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Conjunction, an empty list matches every post.
    All(Vec<Predicate>),
    Not(Box<Predicate>),
    Clause(Clause),
}

impl Predicate {
    pub fn negate(self) -> Predicate {
        match self {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::All(preds) if preds.is_empty())
    }

    /// Calls `f` for every clause in the tree.
    pub fn visit_clauses<'a>(&'a self, f: &mut impl FnMut(&'a Clause)) {
        match self {
            Predicate::All(preds) => {
                for pred in preds {
                    pred.visit_clauses(f);
                }
            }
            Predicate::Not(inner) => inner.visit_clauses(f),
            Predicate::Clause(clause) => f(clause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    /// Aggregates the store has to annotate before filtering.
    pub aggregates: BTreeSet<AggregateKind>,
    pub predicate: Predicate,
}

/// Aggregates referenced by the token categories.
pub fn required_aggregates(tokens: &[NamedToken]) -> BTreeSet<AggregateKind> {
    tokens
        .iter()
        .filter_map(|token| token.category.aggregate())
        .collect()
}

/// Compiles a single token into its (possibly negated) predicate.
pub fn compile_token(token: &NamedToken) -> SearchResult<Predicate> {
    let clause = (token.category.descriptor().compile)(token)?;
    let pred = Predicate::Clause(clause);
    Ok(if token.negate { pred.negate() } else { pred })
}

/// Builds the conjunctive post filter for `tokens`.
pub fn compile(
    tokens: &[NamedToken],
    exclude_tags: Option<&BTreeSet<TagId>>,
) -> SearchResult<CompiledQuery> {
    let mut conditions = Vec::with_capacity(tokens.len() + 1);

    if let Some(exclude_tags) = exclude_tags.filter(|tags| !tags.is_empty()) {
        conditions.push(Predicate::Clause(Clause::TaggedWithAny(exclude_tags.clone())).negate());
    }

    for token in tokens {
        conditions.push(compile_token(token)?);
    }

    Ok(CompiledQuery {
        aggregates: required_aggregates(tokens),
        predicate: Predicate::All(conditions),
    })
}

fn parse_arg<T: std::str::FromStr>(token: &NamedToken, err: ArgError) -> SearchResult<T> {
    token
        .arg
        .parse::<T>()
        .map_err(|_| SearchError::ArgumentValidation {
            category: token.category,
            arg: token.arg.clone(),
            source: err,
        })
}

fn require_equal(token: &NamedToken) -> SearchResult<()> {
    match token.relation_or_default() {
        TokenArgRelation::Equal => Ok(()),
        relation => Err(SearchError::UnsupportedSearchOperator {
            relation,
            token: token.name.clone(),
        }),
    }
}

fn unsigned(token: &NamedToken) -> SearchResult<Comparison<u64>> {
    let value = parse_arg(token, ArgError::NotPositiveInt)?;
    Ok(Comparison::new(token.relation_or_default(), value))
}

fn signed(token: &NamedToken) -> SearchResult<Comparison<i64>> {
    let value = parse_arg(token, ArgError::NotInt)?;
    Ok(Comparison::new(token.relation_or_default(), value))
}

pub(super) fn compile_tag(token: &NamedToken) -> SearchResult<Clause> {
    Ok(Clause::TagName(TextMatch::from_token(token)))
}

pub(super) fn compile_tag_alias(token: &NamedToken) -> SearchResult<Clause> {
    require_equal(token)?;
    Ok(Clause::TagAlias(TextMatch::from_token(token)))
}

pub(super) fn compile_tag_id(token: &NamedToken) -> SearchResult<Clause> {
    require_equal(token)?;
    Ok(Clause::TagId(parse_arg(token, ArgError::NotPositiveInt)?))
}

pub(super) fn compile_post_id(token: &NamedToken) -> SearchResult<Clause> {
    Ok(Clause::PostId(unsigned(token)?))
}

pub(super) fn compile_aggregate(token: &NamedToken) -> SearchResult<Clause> {
    let kind = match token.category.aggregate() {
        Some(kind) => kind,
        None => {
            return Err(SearchError::UnsupportedSearchOperator {
                relation: token.relation_or_default(),
                token: token.name.clone(),
            })
        }
    };
    Ok(Clause::Aggregate(kind, unsigned(token)?))
}

pub(super) fn compile_comment_by(token: &NamedToken) -> SearchResult<Clause> {
    require_equal(token)?;
    Ok(Clause::CommentBy(TextMatch::from_token(token)))
}

pub(super) fn compile_uploaded_by(token: &NamedToken) -> SearchResult<Clause> {
    require_equal(token)?;
    Ok(Clause::UploadedBy(TextMatch::from_token(token)))
}

pub(super) fn compile_rating_label(token: &NamedToken) -> SearchResult<Clause> {
    require_equal(token)?;
    let rating = RatingLevel::select(&token.arg).ok_or_else(|| SearchError::InvalidRatingLabel {
        label: token.arg.clone(),
    })?;
    Ok(Clause::RatingLevel(Comparison::equal(rating.value() as i64)))
}

pub(super) fn compile_rating_num(token: &NamedToken) -> SearchResult<Clause> {
    Ok(Clause::RatingLevel(signed(token)?))
}

pub(super) fn compile_height(token: &NamedToken) -> SearchResult<Clause> {
    Ok(Clause::Height(signed(token)?))
}

pub(super) fn compile_width(token: &NamedToken) -> SearchResult<Clause> {
    Ok(Clause::Width(signed(token)?))
}

pub(super) fn compile_source(token: &NamedToken) -> SearchResult<Clause> {
    require_equal(token)?;
    Ok(Clause::Source(TextMatch::from_token(token)))
}

pub(super) fn compile_mimetype(token: &NamedToken) -> SearchResult<Clause> {
    require_equal(token)?;
    let media_type =
        SupportedMediaType::find(&token.arg).ok_or_else(|| SearchError::InvalidMimetype {
            mimetype: token.arg.clone(),
            supported: SupportedMediaType::supported_mimetypes(),
        })?;
    Ok(Clause::MediaType(media_type))
}

