use serde::{Deserialize, Serialize};

use super::{
    category::{TokenArgRelation, TokenCategory},
    errors::{ArgError, SearchError, SearchResult},
};

pub const WILDCARD: char = '*';
pub const MAX_WILDCARDS: usize = 4;

/// A parsed post search token.
///
/// Wildcards are parsed out of `arg` into `wildcard_positions` so that the
/// clean argument can be validated right away. The raw argument is
/// available through [`NamedToken::arg_with_wildcards`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedToken {
    pub category: TokenCategory,
    /// The name as typed, without the negation prefix. For tags this is the
    /// tag text itself, wildcards included.
    pub name: String,
    pub arg: String,
    /// `None` for anonymous tag tokens.
    pub relation: Option<TokenArgRelation>,
    /// Char offsets into `arg` at which a wildcard was removed.
    pub wildcard_positions: Vec<usize>,
    pub negate: bool,
}

impl NamedToken {
    /// Builds and validates a token.
    pub fn new(
        category: TokenCategory,
        name: &str,
        raw_arg: &str,
        relation: Option<TokenArgRelation>,
        negate: bool,
    ) -> SearchResult<Self> {
        let (arg, wildcard_positions) = strip_wildcards(raw_arg.trim())?;
        let token = NamedToken {
            category,
            name: name.to_string(),
            arg,
            relation,
            wildcard_positions,
            negate,
        };
        token.validate_arg()?;
        Ok(token)
    }

    pub fn has_wildcards(&self) -> bool {
        !self.wildcard_positions.is_empty()
    }

    /// Runs the category validator against the clean argument.
    pub fn validate_arg(&self) -> SearchResult<()> {
        let fail = |source: ArgError| SearchError::ArgumentValidation {
            category: self.category,
            arg: self.arg_with_wildcards(),
            source,
        };

        if self.has_wildcards() && !self.category.allows_wildcard() {
            return Err(fail(ArgError::WildcardNotAllowed));
        }

        if self.arg.is_empty() {
            // a bare `*` matches anything, a bare `-` has nothing to match
            if self.has_wildcards() {
                return Ok(());
            }
            return Err(fail(ArgError::Empty));
        }

        let validator = self.category.validator(self.has_wildcards());
        validator(&self.arg).map_err(fail)
    }

    /// Reconstructs the argument with `*` markers.
    pub fn arg_with_wildcards(&self) -> String {
        insert_markers(&self.arg, &self.wildcard_positions, &WILDCARD.to_string())
    }

    /// The relation to apply, anonymous tags compare for equality.
    pub fn relation_or_default(&self) -> TokenArgRelation {
        self.relation
            .unwrap_or_else(|| self.category.default_relation())
    }
}

/// Removes wildcards from `raw`, returning the clean string and the char
/// offsets at which they were removed.
pub fn strip_wildcards(raw: &str) -> SearchResult<(String, Vec<usize>)> {
    let mut arg = String::with_capacity(raw.len());
    let mut positions = Vec::new();
    let mut offset = 0;

    for c in raw.chars() {
        if c == WILDCARD {
            positions.push(offset);
        } else {
            arg.push(c);
            offset += 1;
        }
    }

    if positions.len() > MAX_WILDCARDS {
        return Err(SearchError::TooManyWildcards {
            arg: raw.to_string(),
            count: positions.len(),
            max: MAX_WILDCARDS,
        });
    }

    Ok((arg, positions))
}

/// Inserts `marker` into `text` at each char offset in `positions`.
pub fn insert_markers(text: &str, positions: &[usize], marker: &str) -> String {
    let mut out = String::with_capacity(text.len() + positions.len() * marker.len());
    let mut positions = positions.iter().peekable();

    for (idx, c) in text.chars().enumerate() {
        while positions.next_if(|pos| **pos <= idx).is_some() {
            out.push_str(marker);
        }
        out.push(c);
    }
    for _ in positions {
        out.push_str(marker);
    }
    out
}

/// Parses a single whitespace free query token.
pub fn parse_token(raw: &str) -> SearchResult<NamedToken> {
    let (negate, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let Some(split_at) = rest.find(TokenArgRelation::is_relation_char) else {
        // anonymous token i.e. tag
        return NamedToken::new(TokenCategory::Tag, rest, rest, None, negate);
    };

    let (name, tail) = rest.split_at(split_at);
    let mut tail_chars = tail.chars();
    let relation = tail_chars
        .next()
        .and_then(TokenArgRelation::from_char)
        .ok_or_else(|| SearchError::MalformedToken {
            token: raw.to_string(),
        })?;
    let arg = tail_chars.as_str();

    if name.is_empty() || arg.is_empty() {
        return Err(SearchError::MalformedToken {
            token: raw.to_string(),
        });
    }

    let category = TokenCategory::select(name).map_err(|_| SearchError::UnknownFilterName {
        name: name.to_string(),
    })?;

    if arg.contains(TokenArgRelation::is_relation_char) {
        return Err(SearchError::MultipleOperators {
            token: raw.to_string(),
        });
    }

    if !category.allows(relation) {
        return Err(SearchError::OperatorNotAllowed {
            category,
            relation: relation.to_string(),
        });
    }

    NamedToken::new(category, name, arg, Some(relation), negate)
}

/// Parses a space delimited post search query into named tokens.
///
/// The first invalid token aborts the whole query.
pub fn parse_query(query: &str) -> SearchResult<Vec<NamedToken>> {
    query.split_whitespace().map(parse_token).collect()
}

/// The trailing fragment of a query, used as the autocomplete partial.
pub fn trailing_partial(query: &str) -> &str {
    if query.ends_with(char::is_whitespace) {
        return "";
    }
    query.split_whitespace().last().unwrap_or("")
}
