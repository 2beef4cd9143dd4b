use std::collections::{BTreeSet, HashSet};

use super::*;
use crate::media::{RatingLevel, SupportedMediaType};

fn compile_one(query: &str) -> SearchResult<Predicate> {
    let tokens = parse_query(query)?;
    assert_eq!(tokens.len(), 1, "expected a single token in {query:?}");
    compile_token(&tokens[0])
}

// --- Tokenizer ---

#[test]
fn test_parse_tags_and_negation() {
    let tokens = parse_query("tag1 tag2 -tag3").unwrap();
    assert_eq!(tokens.len(), 3);
    assert!(tokens.iter().all(|t| t.category == TokenCategory::Tag));
    assert_eq!(
        tokens.iter().map(|t| t.negate).collect::<Vec<_>>(),
        vec![false, false, true]
    );
    assert_eq!(tokens[2].name, "tag3");
    assert_eq!(tokens[2].relation, None);
}

#[test]
fn test_parse_collapses_whitespace() {
    let tokens = parse_query("  red \t\n blue   ").unwrap();
    assert_eq!(
        tokens.iter().map(|t| t.arg.as_str()).collect::<Vec<_>>(),
        vec!["red", "blue"]
    );
    assert!(parse_query("").unwrap().is_empty());
    assert!(parse_query("   ").unwrap().is_empty());
}

#[test]
fn test_parse_is_deterministic() {
    let query = "cat* -dog id>3 comment_by=t*m rating_label=safe";
    assert_eq!(parse_query(query).unwrap(), parse_query(query).unwrap());
}

#[test]
fn test_parse_named_filter() {
    let token = parse_token("-comment_count>10").unwrap();
    assert_eq!(token.category, TokenCategory::CommentCount);
    assert_eq!(token.name, "comment_count");
    assert_eq!(token.arg, "10");
    assert_eq!(token.relation, Some(TokenArgRelation::GreaterThan));
    assert!(token.negate);
}

#[test]
fn test_parse_filter_alias() {
    let token = parse_token("fc<2").unwrap();
    assert_eq!(token.category, TokenCategory::FavCount);
    assert_eq!(token.name, "fc");
}

#[test]
fn test_multiple_operators() {
    assert!(matches!(
        parse_query("id=100=200"),
        Err(SearchError::MultipleOperators { .. })
    ));
    assert!(matches!(
        parse_query("id<1>2"),
        Err(SearchError::MultipleOperators { .. })
    ));
}

#[test]
fn test_malformed_tokens() {
    for query in ["=red", "id=", "-<3", "width>"] {
        assert!(
            matches!(parse_query(query), Err(SearchError::MalformedToken { .. })),
            "{query:?} should be malformed"
        );
    }
}

#[test]
fn test_unknown_filter_name() {
    match parse_query("colour=red") {
        Err(SearchError::UnknownFilterName { name }) => assert_eq!(name, "colour"),
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_operator_not_allowed() {
    let err = parse_query("uploaded_by>bob").unwrap_err();
    assert_eq!(err.kind(), "operator_not_allowed");
    assert!(err.is_validation());
    assert!(parse_query("tag_id<3").is_err());
    assert!(parse_query("height<300").is_ok());
}

#[test]
fn test_lone_dash_is_rejected() {
    match parse_query("red -") {
        Err(SearchError::ArgumentValidation { category, source, .. }) => {
            assert_eq!(category, TokenCategory::Tag);
            assert_eq!(source, ArgError::Empty);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_argument_validation() {
    assert!(matches!(
        parse_query("id=abc"),
        Err(SearchError::ArgumentValidation {
            source: ArgError::NotPositiveInt,
            ..
        })
    ));
    assert!(matches!(
        parse_query("height=tall"),
        Err(SearchError::ArgumentValidation {
            source: ArgError::NotInt,
            ..
        })
    ));
    assert!(matches!(
        parse_query("uploaded_by=bob!"),
        Err(SearchError::ArgumentValidation {
            source: ArgError::InvalidChar('!'),
            ..
        })
    ));
    assert!(matches!(
        parse_query("source=ftp://example.com"),
        Err(SearchError::ArgumentValidation {
            source: ArgError::InvalidUrl(_),
            ..
        })
    ));
    assert!(parse_query("source=https://example.com/post/1").is_ok());
    assert!(parse_query(&"a".repeat(101)).is_err());
}

#[test]
fn test_wildcard_not_allowed() {
    assert!(matches!(
        parse_query("id=1*"),
        Err(SearchError::ArgumentValidation {
            source: ArgError::WildcardNotAllowed,
            ..
        })
    ));
}

#[test]
fn test_wildcard_source_uses_permissive_validator() {
    let token = parse_token("source=*example.com*").unwrap();
    assert_eq!(token.arg, "example.com");
    assert_eq!(token.wildcard_positions, vec![0, 11]);
}

#[test]
fn test_too_many_wildcards() {
    assert!(parse_query("a*b*c*d*").is_ok());
    match parse_query("a*b*c*d*e*") {
        Err(SearchError::TooManyWildcards { count, max, .. }) => {
            assert_eq!(count, 5);
            assert_eq!(max, MAX_WILDCARDS);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_wildcard_round_trip() {
    for raw in ["*cat", "cat*", "c*a*t", "**cat", "ca**t*", "*", "ünï*cödé"] {
        let token = parse_token(raw).unwrap();
        assert!(!token.arg.contains(lexer::WILDCARD));
        assert_eq!(token.arg_with_wildcards(), raw);
    }

    let token = parse_token("uploaded_by=*pa*blo").unwrap();
    assert_eq!(token.arg, "pablo");
    assert_eq!(token.wildcard_positions, vec![0, 2]);
    assert_eq!(token.arg_with_wildcards(), "*pa*blo");
}

#[test]
fn test_trailing_partial() {
    assert_eq!(trailing_partial("amber am"), "am");
    assert_eq!(trailing_partial("amber "), "");
    assert_eq!(trailing_partial(""), "");
    assert_eq!(trailing_partial("-gree"), "-gree");
}

// --- Registry ---

#[test]
fn test_select_by_name_and_alias() {
    for category in TokenCategory::ALL {
        for name in category.names_and_aliases() {
            assert_eq!(TokenCategory::select(name), Ok(category));
        }
    }
    assert_eq!(
        TokenCategory::select("nope"),
        Err(UnknownTokenName("nope".to_string()))
    );
}

#[test]
fn test_names_and_aliases_are_unique() {
    let mut seen = HashSet::new();
    for category in TokenCategory::ALL {
        for name in category.names_and_aliases() {
            assert!(seen.insert(name), "{name:?} is used twice");
        }
    }
}

#[test]
fn test_default_relations() {
    for category in TokenCategory::ALL {
        let relations = category.allowed_relations();
        assert_eq!(relations.first(), Some(&TokenArgRelation::Equal));
        if category.aggregate().is_some() {
            assert_eq!(relations.len(), 3);
        }
    }
}

// --- Compiler ---

#[test]
fn test_negation_is_involutive() {
    for query in [
        "cat",
        "c*t",
        "id<3",
        "tag_count>2",
        "comment_by=tom*",
        "rating_label=safe",
        "mimetype=image/png",
        "alias=kitty",
    ] {
        let plain = compile_one(query).unwrap();
        let negated = compile_one(&format!("-{query}")).unwrap();
        assert_eq!(negated, Predicate::Not(Box::new(plain.clone())));
        assert_eq!(negated.negate(), plain);
    }
}

#[test]
fn test_compile_exact_and_pattern() {
    assert_eq!(
        compile_one("cat").unwrap(),
        Predicate::Clause(Clause::TagName(TextMatch::Exact("cat".to_string())))
    );
    assert_eq!(
        compile_one("ca*").unwrap(),
        Predicate::Clause(Clause::TagName(TextMatch::Pattern(WildcardPattern {
            text: "ca".to_string(),
            positions: vec![2],
        })))
    );
}

#[test]
fn test_compile_comparisons() {
    assert_eq!(
        compile_one("id<3").unwrap(),
        Predicate::Clause(Clause::PostId(Comparison::new(TokenArgRelation::LessThan, 3)))
    );
    assert_eq!(
        compile_one("w>-1").unwrap(),
        Predicate::Clause(Clause::Width(Comparison::new(
            TokenArgRelation::GreaterThan,
            -1
        )))
    );
    assert_eq!(
        compile_one("rating_num<50").unwrap(),
        Predicate::Clause(Clause::RatingLevel(Comparison::new(
            TokenArgRelation::LessThan,
            50
        )))
    );
}

#[test]
fn test_compile_rating_label() {
    assert_eq!(
        compile_one("rating_label=Explicit").unwrap(),
        Predicate::Clause(Clause::RatingLevel(Comparison::equal(
            RatingLevel::Explicit.value() as i64
        )))
    );

    let tokens = parse_query("rating_label=not_a_label").unwrap();
    assert!(matches!(
        compile(&tokens, None),
        Err(SearchError::InvalidRatingLabel { .. })
    ));
}

#[test]
fn test_compile_mimetype() {
    assert_eq!(
        compile_one("mime=video/webm").unwrap(),
        Predicate::Clause(Clause::MediaType(SupportedMediaType::Webm))
    );

    let tokens = parse_query("mimetype=image/svg+xml").unwrap();
    match compile(&tokens, None) {
        Err(SearchError::InvalidMimetype { mimetype, supported }) => {
            assert_eq!(mimetype, "image/svg+xml");
            assert!(supported.contains("image/png"));
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_unsupported_search_operator() {
    // relations are checked at parse time, build the token by hand
    let token = NamedToken::new(
        TokenCategory::Source,
        "source",
        "https://example.com",
        Some(TokenArgRelation::LessThan),
        false,
    )
    .unwrap();
    assert!(matches!(
        compile_token(&token),
        Err(SearchError::UnsupportedSearchOperator { .. })
    ));
}

#[test]
fn test_required_aggregates() {
    let tokens = parse_query("cat cc>1 -tc<3 fc=0 id>1").unwrap();
    let compiled = compile(&tokens, None).unwrap();
    assert_eq!(
        compiled.aggregates,
        BTreeSet::from([
            AggregateKind::CommentCount,
            AggregateKind::FavoriteCount,
            AggregateKind::TagCount,
        ])
    );

    let compiled = compile(&parse_query("cat").unwrap(), None).unwrap();
    assert!(compiled.aggregates.is_empty());
}

#[test]
fn test_exclude_tags_prepended() {
    let search = PostSearch::parse("cat").unwrap().with_exclude_tags([7, 3]);
    let compiled = search.compile().unwrap();
    let Predicate::All(conditions) = compiled.predicate else {
        panic!("expected a conjunction");
    };
    assert_eq!(conditions.len(), 2);
    assert_eq!(
        conditions[0],
        Predicate::Not(Box::new(Predicate::Clause(Clause::TaggedWithAny(
            BTreeSet::from([3, 7])
        ))))
    );
}

#[test]
fn test_empty_query_matches_everything() {
    let search = PostSearch::parse("").unwrap();
    assert!(search.compile().unwrap().predicate.is_match_all());
    assert!(!PostSearch::parse("cat").unwrap().compile().unwrap().predicate.is_match_all());
}

// --- Wildcard translation ---

#[test]
fn test_pattern_to_like() {
    let pattern = WildcardPattern {
        text: "50%_off\\".to_string(),
        positions: vec![0, 8],
    };
    assert_eq!(pattern.to_like(), "%50\\%\\_off\\\\%");
}

#[test]
fn test_pattern_to_regex() {
    let token = parse_token("comment_by=tom*").unwrap();
    let Predicate::Clause(Clause::CommentBy(TextMatch::Pattern(pattern))) =
        compile_token(&token).unwrap()
    else {
        panic!("expected a pattern");
    };
    let re = pattern.to_regex().unwrap();
    assert!(re.is_match("tom123"));
    assert!(re.is_match("tommy"));
    assert!(re.is_match("tom"));
    assert!(!re.is_match("angela"));
    assert!(!re.is_match("atom"));

    let dotted = WildcardPattern {
        text: "a.b".to_string(),
        positions: vec![1],
    };
    let re = dotted.to_regex().unwrap();
    assert!(re.is_match("axyz.b"));
    assert!(!re.is_match("axyzxb"));
}

// --- Structured form ---

#[test]
fn test_structured_query_from_pairs() {
    let query = StructuredQuery::from_pairs([
        ("tagset", "1"),
        ("tagset", "2"),
        ("comment_count", "3"),
        ("comment_count_relation", ">"),
        ("comment_count_negate", "on"),
        ("uploaded_by", "pablo"),
        ("uploaded_by_negate", "false"),
        ("csrf_token", "x"),
    ]);
    assert_eq!(query.tagset, vec!["1", "2"]);

    let field = &query.filters["comment_count"];
    assert_eq!(field.value, "3");
    assert_eq!(field.relation.as_deref(), Some(">"));
    assert!(field.negate);
    assert!(!query.filters["uploaded_by"].negate);

    let tokens = parse_structured_query(&query).unwrap();
    assert_eq!(tokens.len(), 4);
    assert!(tokens[..2].iter().all(|t| t.category == TokenCategory::TagId));
    assert_eq!(tokens[2].category, TokenCategory::CommentCount);
    assert_eq!(tokens[2].relation, Some(TokenArgRelation::GreaterThan));
    assert!(tokens[2].negate);
    assert_eq!(tokens[3].category, TokenCategory::UploadedBy);
    assert_eq!(tokens[3].relation, Some(TokenArgRelation::Equal));
}

#[test]
fn test_structured_query_rejects_bad_input() {
    let query = StructuredQuery::from_pairs([("tagset", "abc")]);
    assert!(matches!(
        parse_structured_query(&query),
        Err(SearchError::ArgumentValidation { .. })
    ));

    let query = StructuredQuery::from_pairs([("height", "10"), ("height_relation", "!=")]);
    assert!(matches!(
        parse_structured_query(&query),
        Err(SearchError::OperatorNotAllowed { .. })
    ));

    let query = StructuredQuery::from_pairs([("uploaded_by", "pablo"), ("uploaded_by_relation", "<")]);
    assert!(matches!(
        parse_structured_query(&query),
        Err(SearchError::OperatorNotAllowed { .. })
    ));
}

#[test]
fn test_structured_query_ignores_blank_and_unknown_fields() {
    let query = StructuredQuery::from_pairs([("width", ""), ("page", "2"), ("", "x")]);
    assert!(PostSearch::from_structured(&query).unwrap().tokens.is_empty());
}

#[test]
fn test_error_kinds_are_distinct() {
    let errors = [
        parse_query("nope=1").unwrap_err(),
        parse_query("=1").unwrap_err(),
        parse_query("id=1=2").unwrap_err(),
        parse_query("*a*b*c*d*").unwrap_err(),
        parse_query("up>x").unwrap_err(),
        parse_query("id=x").unwrap_err(),
        compile(&parse_query("r=nope").unwrap(), None).unwrap_err(),
        compile(&parse_query("mime=text/plain").unwrap(), None).unwrap_err(),
    ];
    let kinds = errors.iter().map(SearchError::kind).collect::<HashSet<_>>();
    assert_eq!(kinds.len(), errors.len());
}
