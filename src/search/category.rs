use std::{collections::HashMap, fmt::Display, str::FromStr};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{
    compiler::{self, Clause},
    errors::{ArgError, SearchResult, UnknownTokenName},
    lexer::NamedToken,
    validators,
};

/// How a token's argument relates to the value it is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenArgRelation {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
}

impl TokenArgRelation {
    pub const ALL: [TokenArgRelation; 3] = [
        TokenArgRelation::Equal,
        TokenArgRelation::LessThan,
        TokenArgRelation::GreaterThan,
    ];

    pub fn as_char(self) -> char {
        match self {
            TokenArgRelation::Equal => '=',
            TokenArgRelation::LessThan => '<',
            TokenArgRelation::GreaterThan => '>',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(TokenArgRelation::Equal),
            '<' => Some(TokenArgRelation::LessThan),
            '>' => Some(TokenArgRelation::GreaterThan),
            _ => None,
        }
    }

    pub fn is_relation_char(c: char) -> bool {
        Self::from_char(c).is_some()
    }
}

impl Display for TokenArgRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for TokenArgRelation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c).ok_or_else(|| s.to_string()),
            _ => Err(s.to_string()),
        }
    }
}

/// Per-post counts that have to be annotated before they can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    CommentCount,
    FavoriteCount,
    TagCount,
}

pub type ArgValidator = fn(&str) -> Result<(), ArgError>;
pub type ClauseCompiler = fn(&NamedToken) -> SearchResult<Clause>;

/// Static description of a token category.
pub struct CategoryDescriptor {
    pub name: &'static str,
    pub desc: &'static str,
    pub aliases: &'static [&'static str],
    pub arg_validator: ArgValidator,
    /// More permissive validator for arguments containing wildcards.
    /// Falls back to `arg_validator` when unset.
    pub wildcard_arg_validator: Option<ArgValidator>,
    pub allow_wildcard: bool,
    /// The first entry is the default relation.
    pub allowed_relations: &'static [TokenArgRelation],
    pub aggregate: Option<AggregateKind>,
    pub compile: ClauseCompiler,
}

const SIMPLE: &[TokenArgRelation] = &[TokenArgRelation::Equal];
const COMPARISON: &[TokenArgRelation] = &[
    TokenArgRelation::Equal,
    TokenArgRelation::LessThan,
    TokenArgRelation::GreaterThan,
];

/// Categories of tokens in post search queries.
///
/// Every category besides the anonymous `Tag` is written as `name<op>arg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenCategory {
    Tag,
    TagId,
    PostId,
    TagAlias,
    TagCount,
    CommentBy,
    CommentCount,
    FavCount,
    Height,
    Width,
    RatingLabel,
    RatingNum,
    Source,
    UploadedBy,
    Mimetype,
}

static TAG: CategoryDescriptor = CategoryDescriptor {
    name: "",
    desc: "The default (un-named) token. Used for searching tags.",
    aliases: &[],
    arg_validator: validators::tag_name,
    wildcard_arg_validator: None,
    allow_wildcard: true,
    allowed_relations: SIMPLE,
    aggregate: None,
    compile: compiler::compile_tag,
};

static TAG_ID: CategoryDescriptor = CategoryDescriptor {
    name: "tag_id",
    desc: "The ID of a tag.",
    aliases: &[],
    arg_validator: validators::positive_int,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: SIMPLE,
    aggregate: None,
    compile: compiler::compile_tag_id,
};

static POST_ID: CategoryDescriptor = CategoryDescriptor {
    name: "id",
    desc: "The ID of a post. Accepts comparison operators =, <, >",
    aliases: &[],
    arg_validator: validators::positive_int,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: COMPARISON,
    aggregate: None,
    compile: compiler::compile_post_id,
};

static TAG_ALIAS: CategoryDescriptor = CategoryDescriptor {
    name: "alias",
    desc: "The name of a tag alias. Allows wildcards.",
    aliases: &["tag_alias"],
    arg_validator: validators::tag_name,
    wildcard_arg_validator: None,
    allow_wildcard: true,
    allowed_relations: SIMPLE,
    aggregate: None,
    compile: compiler::compile_tag_alias,
};

static TAG_COUNT: CategoryDescriptor = CategoryDescriptor {
    name: "tag_count",
    desc: "The number of tags on a post. Accepts comparison operators =, <, >",
    aliases: &["tc"],
    arg_validator: validators::positive_int,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: COMPARISON,
    aggregate: Some(AggregateKind::TagCount),
    compile: compiler::compile_aggregate,
};

static COMMENT_BY: CategoryDescriptor = CategoryDescriptor {
    name: "comment_by",
    desc: "The username of a commenter. Allows wildcards.",
    aliases: &["comment", "cb"],
    arg_validator: validators::username,
    wildcard_arg_validator: None,
    allow_wildcard: true,
    allowed_relations: SIMPLE,
    aggregate: None,
    compile: compiler::compile_comment_by,
};

static COMMENT_COUNT: CategoryDescriptor = CategoryDescriptor {
    name: "comment_count",
    desc: "The number of comments on a post. Accepts comparison operators =, <, >",
    aliases: &["cc"],
    arg_validator: validators::positive_int,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: COMPARISON,
    aggregate: Some(AggregateKind::CommentCount),
    compile: compiler::compile_aggregate,
};

static FAV_COUNT: CategoryDescriptor = CategoryDescriptor {
    name: "favorite_count",
    desc: "The number of favorites received by a post. Accepts comparison operators =, <, >",
    aliases: &["fav_count", "fc"],
    arg_validator: validators::positive_int,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: COMPARISON,
    aggregate: Some(AggregateKind::FavoriteCount),
    compile: compiler::compile_aggregate,
};

static HEIGHT: CategoryDescriptor = CategoryDescriptor {
    name: "height",
    desc: "The height of an image post. Accepts comparison operators =, <, >",
    aliases: &["h"],
    arg_validator: validators::integer,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: COMPARISON,
    aggregate: None,
    compile: compiler::compile_height,
};

static WIDTH: CategoryDescriptor = CategoryDescriptor {
    name: "width",
    desc: "The width of an image post. Accepts comparison operators =, <, >",
    aliases: &["w"],
    arg_validator: validators::integer,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: COMPARISON,
    aggregate: None,
    compile: compiler::compile_width,
};

static RATING_LABEL: CategoryDescriptor = CategoryDescriptor {
    name: "rating_label",
    desc: "The rating of a post. Accepts any rating level label (safe, unrated, questionable, explicit)",
    aliases: &["rate", "r"],
    arg_validator: validators::rating_label,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: SIMPLE,
    aggregate: None,
    compile: compiler::compile_rating_label,
};

static RATING_NUM: CategoryDescriptor = CategoryDescriptor {
    name: "rating_num",
    desc: "The numeric rating level of a post. Accepts comparison operators =, <, >",
    aliases: &[],
    arg_validator: validators::integer,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: COMPARISON,
    aggregate: None,
    compile: compiler::compile_rating_num,
};

static SOURCE: CategoryDescriptor = CategoryDescriptor {
    name: "source",
    desc: "The source url of a post. Allows wildcards.",
    aliases: &["src"],
    arg_validator: validators::url,
    wildcard_arg_validator: Some(validators::wildcard_url),
    allow_wildcard: true,
    allowed_relations: SIMPLE,
    aggregate: None,
    compile: compiler::compile_source,
};

static UPLOADED_BY: CategoryDescriptor = CategoryDescriptor {
    name: "uploaded_by",
    desc: "The username of the uploader of a post. Allows wildcards.",
    aliases: &["up"],
    arg_validator: validators::username,
    wildcard_arg_validator: None,
    allow_wildcard: true,
    allowed_relations: SIMPLE,
    aggregate: None,
    compile: compiler::compile_uploaded_by,
};

static MIMETYPE: CategoryDescriptor = CategoryDescriptor {
    name: "mimetype",
    desc: "The MIME type of the post's file",
    aliases: &["mime"],
    arg_validator: validators::mimetype,
    wildcard_arg_validator: None,
    allow_wildcard: false,
    allowed_relations: SIMPLE,
    aggregate: None,
    compile: compiler::compile_mimetype,
};

static LOOKUP: Lazy<HashMap<&'static str, TokenCategory>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for category in TokenCategory::ALL {
        for name in category.names_and_aliases() {
            map.insert(name, category);
        }
    }
    map
});

impl TokenCategory {
    pub const ALL: [TokenCategory; 15] = [
        TokenCategory::Tag,
        TokenCategory::TagId,
        TokenCategory::PostId,
        TokenCategory::TagAlias,
        TokenCategory::TagCount,
        TokenCategory::CommentBy,
        TokenCategory::CommentCount,
        TokenCategory::FavCount,
        TokenCategory::Height,
        TokenCategory::Width,
        TokenCategory::RatingLabel,
        TokenCategory::RatingNum,
        TokenCategory::Source,
        TokenCategory::UploadedBy,
        TokenCategory::Mimetype,
    ];

    pub fn descriptor(self) -> &'static CategoryDescriptor {
        match self {
            TokenCategory::Tag => &TAG,
            TokenCategory::TagId => &TAG_ID,
            TokenCategory::PostId => &POST_ID,
            TokenCategory::TagAlias => &TAG_ALIAS,
            TokenCategory::TagCount => &TAG_COUNT,
            TokenCategory::CommentBy => &COMMENT_BY,
            TokenCategory::CommentCount => &COMMENT_COUNT,
            TokenCategory::FavCount => &FAV_COUNT,
            TokenCategory::Height => &HEIGHT,
            TokenCategory::Width => &WIDTH,
            TokenCategory::RatingLabel => &RATING_LABEL,
            TokenCategory::RatingNum => &RATING_NUM,
            TokenCategory::Source => &SOURCE,
            TokenCategory::UploadedBy => &UPLOADED_BY,
            TokenCategory::Mimetype => &MIMETYPE,
        }
    }

    /// Select a category by its name or one of its aliases.
    pub fn select(name: &str) -> Result<TokenCategory, UnknownTokenName> {
        LOOKUP
            .get(name)
            .copied()
            .ok_or_else(|| UnknownTokenName(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn desc(self) -> &'static str {
        self.descriptor().desc
    }

    pub fn aliases(self) -> &'static [&'static str] {
        self.descriptor().aliases
    }

    pub fn names_and_aliases(self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name()).chain(self.aliases().iter().copied())
    }

    pub fn allows_wildcard(self) -> bool {
        self.descriptor().allow_wildcard
    }

    pub fn allowed_relations(self) -> &'static [TokenArgRelation] {
        self.descriptor().allowed_relations
    }

    pub fn allows(self, relation: TokenArgRelation) -> bool {
        self.allowed_relations().contains(&relation)
    }

    pub fn default_relation(self) -> TokenArgRelation {
        self.allowed_relations()
            .first()
            .copied()
            .unwrap_or(TokenArgRelation::Equal)
    }

    pub fn aggregate(self) -> Option<AggregateKind> {
        self.descriptor().aggregate
    }

    pub fn validator(self, has_wildcards: bool) -> ArgValidator {
        let desc = self.descriptor();
        if has_wildcards {
            desc.wildcard_arg_validator.unwrap_or(desc.arg_validator)
        } else {
            desc.arg_validator
        }
    }
}

impl Display for TokenCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            "" => write!(f, "tag"),
            name => write!(f, "{name}"),
        }
    }
}

/// Serializable summary of a category, used by filter listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterInfo {
    pub category: TokenCategory,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub relations: &'static [TokenArgRelation],
    pub wildcards: bool,
    pub desc: &'static str,
}

impl From<TokenCategory> for FilterInfo {
    fn from(category: TokenCategory) -> Self {
        FilterInfo {
            category,
            name: category.name(),
            aliases: category.aliases(),
            relations: category.allowed_relations(),
            wildcards: category.allows_wildcard(),
            desc: category.desc(),
        }
    }
}

pub fn filter_infos() -> Vec<FilterInfo> {
    TokenCategory::ALL.into_iter().map(FilterInfo::from).collect()
}
