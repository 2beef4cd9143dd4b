//! Post search queries.
//!
//! A query is a space delimited list of tokens. A bare token searches for a
//! tag, any other token is a filter written as `name<op>arg`, for example
//! `uploaded_by=pablo` or `comment_count>3`. Tags and some filters accept up
//! to four `*` wildcards anywhere in the argument (`uploaded_by=pa*blo*`).
//! Any token may be prefixed with `-` to invert it.
//!
//! Parsing validates every argument up front; compiling resolves labels and
//! mimetypes and produces a backend agnostic [`Predicate`] for a
//! [`PostStore`].

use std::collections::BTreeSet;

use crate::posts::{Post, PostStore};

pub mod autocomplete;
mod category;
mod compiler;
mod errors;
pub mod eval;
mod form;
mod lexer;
mod validators;

pub use autocomplete::{AutocompleteItem, SuggestionLimits};
pub use category::{filter_infos, AggregateKind, FilterInfo, TokenArgRelation, TokenCategory};
pub use compiler::{
    compile, compile_token, Clause, Comparison, CompiledQuery, Predicate, TagId, TextMatch,
    WildcardPattern,
};
pub use errors::{ArgError, SearchError, SearchResult, UnknownTokenName};
pub use form::{parse_structured_query, FilterField, StructuredQuery};
pub use lexer::{parse_query, parse_token, trailing_partial, NamedToken, MAX_WILDCARDS};

/// A single post search, built from a query string or a form submission.
#[derive(Debug, Clone, Default)]
pub struct PostSearch {
    pub tokens: Vec<NamedToken>,
    /// Tags whose posts never show up in results or suggestions.
    pub exclude_tags: Option<BTreeSet<TagId>>,
    /// Trailing fragment of the query string, empty for form submissions.
    pub partial: String,
    pub limits: SuggestionLimits,
}

impl PostSearch {
    pub fn parse(query: &str) -> SearchResult<Self> {
        Ok(PostSearch {
            tokens: parse_query(query)?,
            partial: trailing_partial(query).to_string(),
            ..Default::default()
        })
    }

    pub fn from_structured(query: &StructuredQuery) -> SearchResult<Self> {
        Ok(PostSearch {
            tokens: parse_structured_query(query)?,
            ..Default::default()
        })
    }

    pub fn with_exclude_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        let tags = tags.into_iter().collect::<BTreeSet<_>>();
        self.exclude_tags = (!tags.is_empty()).then_some(tags);
        self
    }

    pub fn with_limits(mut self, limits: SuggestionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn compile(&self) -> SearchResult<CompiledQuery> {
        compile(&self.tokens, self.exclude_tags.as_ref())
    }

    /// Posts matching every token, ordered by id.
    pub fn get_posts(&self, store: &dyn PostStore) -> SearchResult<Vec<Post>> {
        let compiled = self.compile()?;
        let posts = store.annotate(&compiled.aggregates)?;
        Ok(store.filter_posts(posts, &compiled.predicate)?)
    }

    /// Suggestions for `partial`, or for the trailing fragment of the query.
    ///
    /// `exclude_tags` is applied on top of the session's excluded tags.
    pub fn autocomplete<'a>(
        &'a self,
        store: &dyn PostStore,
        partial: Option<&'a str>,
        exclude_tags: Option<&BTreeSet<TagId>>,
        show_filters: bool,
    ) -> SearchResult<impl Iterator<Item = AutocompleteItem> + 'a> {
        let partial = partial.unwrap_or(&self.partial);

        let mut excluded = self.exclude_tags.clone().unwrap_or_default();
        if let Some(tags) = exclude_tags {
            excluded.extend(tags.iter().copied());
        }

        autocomplete::suggest(
            store,
            &self.tokens,
            partial,
            &excluded,
            show_filters,
            self.limits,
        )
    }
}

#[cfg(test)]
mod tests;
