use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    category::{TokenArgRelation, TokenCategory},
    errors::{SearchError, SearchResult},
    lexer::NamedToken,
};

const TAGSET_FIELD: &str = "tagset";
const RELATION_SUFFIX: &str = "_relation";
const NEGATE_SUFFIX: &str = "_negate";

/// One named filter submitted through a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub value: String,
    /// Relation operator, the category default when unset.
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub negate: bool,
}

/// A post search submitted as discrete form fields instead of a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// Tag ids, each one must be present on a post.
    #[serde(default)]
    pub tagset: Vec<String>,
    /// Keyed by filter name or alias.
    #[serde(default)]
    pub filters: BTreeMap<String, FilterField>,
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("off"))
}

impl StructuredQuery {
    /// Collects raw form pairs.
    ///
    /// `tagset` may repeat. `<field>_relation` and `<field>_negate` attach to
    /// `<field>`; companions without a value field are dropped.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut tagset = Vec::new();
        let mut values = BTreeMap::new();
        let mut relations = BTreeMap::new();
        let mut negates = BTreeMap::new();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            if key == TAGSET_FIELD {
                tagset.push(value.to_string());
            } else if let Some(field) = key.strip_suffix(RELATION_SUFFIX) {
                relations.insert(field.to_string(), value.to_string());
            } else if let Some(field) = key.strip_suffix(NEGATE_SUFFIX) {
                negates.insert(field.to_string(), is_truthy(value));
            } else {
                values.insert(key.to_string(), value.to_string());
            }
        }

        let filters = values
            .into_iter()
            .map(|(key, value)| {
                let field = FilterField {
                    value,
                    relation: relations.remove(&key),
                    negate: negates.remove(&key).unwrap_or(false),
                };
                (key, field)
            })
            .collect();

        StructuredQuery { tagset, filters }
    }
}

fn field_relation(category: TokenCategory, field: &FilterField) -> SearchResult<TokenArgRelation> {
    let Some(raw) = field.relation.as_deref().map(str::trim) else {
        return Ok(category.default_relation());
    };

    let not_allowed = || SearchError::OperatorNotAllowed {
        category,
        relation: raw.to_string(),
    };
    let relation = raw.parse::<TokenArgRelation>().map_err(|_| not_allowed())?;
    if !category.allows(relation) {
        return Err(not_allowed());
    }
    Ok(relation)
}

/// Builds validated tokens from a structured query.
///
/// Tagset entries become `tag_id` tokens. Unknown field names and blank
/// values are skipped.
pub fn parse_structured_query(query: &StructuredQuery) -> SearchResult<Vec<NamedToken>> {
    let mut tokens = Vec::with_capacity(query.tagset.len() + query.filters.len());

    for tag_id in &query.tagset {
        tokens.push(NamedToken::new(
            TokenCategory::TagId,
            TokenCategory::TagId.name(),
            tag_id,
            Some(TokenArgRelation::Equal),
            false,
        )?);
    }

    for (key, field) in &query.filters {
        let category = match TokenCategory::select(key) {
            Ok(TokenCategory::Tag) | Err(_) => {
                log::debug!("ignoring unknown search field {key:?}");
                continue;
            }
            Ok(category) => category,
        };

        if field.value.trim().is_empty() {
            log::debug!("ignoring blank search field {key:?}");
            continue;
        }

        let relation = field_relation(category, field)?;
        tokens.push(NamedToken::new(
            category,
            key,
            &field.value,
            Some(relation),
            field.negate,
        )?);
    }

    Ok(tokens)
}
