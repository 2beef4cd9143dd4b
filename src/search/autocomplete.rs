use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    category::TokenCategory,
    compiler::TagId,
    errors::SearchResult,
    lexer::NamedToken,
};
use crate::posts::{PostStore, Tag, TagAlias};

/// A single autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteItem {
    pub token_category: TokenCategory,
    /// Filter name for filter suggestions, tag name otherwise.
    pub name: String,
    pub tag_category: Option<String>,
    pub tag_id: Option<TagId>,
    /// Alias text for alias suggestions.
    pub alias: Option<String>,
    /// Post count of the suggested tag.
    pub extra: Option<u64>,
}

impl AutocompleteItem {
    pub fn filter(category: TokenCategory) -> Self {
        AutocompleteItem {
            token_category: category,
            name: category.name().to_string(),
            tag_category: None,
            tag_id: None,
            alias: None,
            extra: None,
        }
    }

    pub fn tag(tag: Tag) -> Self {
        AutocompleteItem {
            token_category: TokenCategory::Tag,
            name: tag.name,
            tag_category: tag.category,
            tag_id: Some(tag.id),
            alias: None,
            extra: Some(tag.post_count),
        }
    }

    pub fn alias(alias: TagAlias, tag: Tag) -> Self {
        AutocompleteItem {
            token_category: TokenCategory::TagAlias,
            name: tag.name,
            tag_category: tag.category,
            tag_id: Some(tag.id),
            alias: Some(alias.name),
            extra: Some(tag.post_count),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SuggestionLimits {
    pub max_tags: usize,
    pub max_aliases: usize,
}

impl Default for SuggestionLimits {
    fn default() -> Self {
        SuggestionLimits {
            max_tags: 20,
            max_aliases: 20,
        }
    }
}

fn mentioned_name(token: &NamedToken) -> Option<&str> {
    match token.category {
        TokenCategory::Tag => Some(&token.name),
        TokenCategory::TagAlias => Some(&token.arg),
        _ => None,
    }
}

/// Tag and alias names already present in the query.
///
/// A token the user is still typing keeps its own suggestion, unless the
/// partial duplicates more than one token.
pub fn mentioned_names(tokens: &[NamedToken], partial: &str) -> BTreeSet<String> {
    let duplicates = tokens.iter().filter(|token| token.name == partial).count();
    tokens
        .iter()
        .filter_map(mentioned_name)
        .filter(|name| duplicates > 1 || *name != partial)
        .map(str::to_string)
        .collect()
}

/// Categories whose canonical name contains `partial`.
pub fn filter_suggestions(partial: &str) -> impl Iterator<Item = AutocompleteItem> + '_ {
    TokenCategory::ALL
        .into_iter()
        .filter(move |category| category.name().contains(partial))
        .map(AutocompleteItem::filter)
}

/// Suggestions for `partial` in order: filter names, tags, tag aliases.
pub fn suggest<'a>(
    store: &dyn PostStore,
    tokens: &[NamedToken],
    partial: &'a str,
    exclude_tags: &BTreeSet<TagId>,
    show_filters: bool,
    limits: SuggestionLimits,
) -> SearchResult<impl Iterator<Item = AutocompleteItem> + 'a> {
    let partial = partial.strip_prefix('-').unwrap_or(partial);
    let exclude_names = mentioned_names(tokens, partial);

    let tags = store.tags_by_name_partial(partial, &exclude_names, exclude_tags)?;
    let aliases = store.aliases_by_name_partial(partial, &exclude_names, exclude_tags)?;

    let filters = show_filters
        .then(|| filter_suggestions(partial))
        .into_iter()
        .flatten();

    Ok(filters
        .chain(
            tags.into_iter()
                .take(limits.max_tags)
                .map(AutocompleteItem::tag),
        )
        .chain(
            aliases
                .into_iter()
                .take(limits.max_aliases)
                .map(|(alias, tag)| AutocompleteItem::alias(alias, tag)),
        ))
}
