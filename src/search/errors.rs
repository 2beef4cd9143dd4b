use super::category::{TokenArgRelation, TokenCategory};

/// A validator rule an argument failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    #[error("value cannot be empty")]
    Empty,

    #[error("value cannot exceed {0} characters")]
    TooLong(usize),

    #[error("value contains an invalid character {0:?}")]
    InvalidChar(char),

    #[error("wildcards are not allowed here")]
    WildcardNotAllowed,

    #[error("expected a non-negative integer")]
    NotPositiveInt,

    #[error("expected an integer")]
    NotInt,

    #[error("expected an http(s) url: {0}")]
    InvalidUrl(String),

    #[error("expected a mimetype like \"image/png\"")]
    InvalidMimetype,
}

/// Returned by [`TokenCategory::select`] when no category has the given name or alias.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("the name {0:?} does not match an existing token category")]
pub struct UnknownTokenName(pub String);

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("the name {name:?} is not a valid filter")]
    UnknownFilterName { name: String },

    #[error("the query token {token:?} is invalid")]
    MalformedToken { token: String },

    #[error("search query filters may only have one operator: {token:?}")]
    MultipleOperators { token: String },

    #[error("the argument {arg:?} has {count} wildcards, at most {max} are allowed")]
    TooManyWildcards { arg: String, count: usize, max: usize },

    #[error("the {category} filter does not accept the {relation:?} operator")]
    OperatorNotAllowed {
        category: TokenCategory,
        relation: String,
    },

    #[error("invalid {category} argument {arg:?}: {source}")]
    ArgumentValidation {
        category: TokenCategory,
        arg: String,
        #[source]
        source: ArgError,
    },

    #[error("the search operator \"{relation}\" is not supported for the token {token:?}")]
    UnsupportedSearchOperator {
        relation: TokenArgRelation,
        token: String,
    },

    #[error("the rating label {label:?} does not match an existing rating level")]
    InvalidRatingLabel { label: String },

    #[error("the mimetype {mimetype:?} does not match any of the supported mimetypes: {supported}")]
    InvalidMimetype { mimetype: String, supported: String },

    #[error("store error: {0:?}")]
    Store(#[from] anyhow::Error),
}

impl SearchError {
    /// Stable identifier used by callers to render field specific messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::UnknownFilterName { .. } => "unknown_filter_name",
            SearchError::MalformedToken { .. } => "malformed_token",
            SearchError::MultipleOperators { .. } => "multiple_operators",
            SearchError::TooManyWildcards { .. } => "too_many_wildcards",
            SearchError::OperatorNotAllowed { .. } => "operator_not_allowed",
            SearchError::ArgumentValidation { .. } => "argument_validation",
            SearchError::UnsupportedSearchOperator { .. } => "unsupported_search_operator",
            SearchError::InvalidRatingLabel { .. } => "invalid_rating_label",
            SearchError::InvalidMimetype { .. } => "invalid_mimetype",
            SearchError::Store(_) => "store",
        }
    }

    /// True for every failure caused by the query itself rather than the store.
    pub fn is_validation(&self) -> bool {
        !matches!(self, SearchError::Store(_))
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
