
use crate::{
    media::{RatingLevel, SupportedMediaType},
    posts::{BackendMemory, Board, Comment, Media, Post, Tag, TagAlias},
};

pub(crate) fn tag(id: u64, name: &str, category: Option<&str>) -> Tag {
    Tag {
        id,
        name: name.to_string(),
        category: category.map(str::to_string),
        post_count: 0,
        rating_level: RatingLevel::Safe,
    }
}

pub(crate) fn alias(id: u64, name: &str, tag_id: u64) -> TagAlias {
    TagAlias {
        id,
        name: name.to_string(),
        tag_id,
    }
}

pub(crate) fn post(id: u64, uploader: &str, tags: &[u64]) -> Post {
    Post {
        id,
        title: format!("Post {id}"),
        uploader: uploader.to_string(),
        tags: tags.to_vec(),
        rating_level: RatingLevel::Safe,
        src_url: None,
        media: None,
        comments: Vec::new(),
        favorites: Vec::new(),
    }
}

pub(crate) fn comment(author: &str) -> Comment {
    Comment {
        author: author.to_string(),
        body: "nice".to_string(),
    }
}

pub(crate) fn image(kind: SupportedMediaType, width: i64, height: i64) -> Option<Media> {
    Some(Media {
        kind,
        width,
        height,
    })
}

/// Five posts with ids 1..=5.
///
/// tags: 1 red, 2 blue, 3 green (colors), 4 cat (animals), 5 uncategorized
pub(crate) fn sample_board() -> Board {
    let tags = vec![
        tag(1, "red", Some("colors")),
        tag(2, "blue", Some("colors")),
        tag(3, "green", Some("colors")),
        tag(4, "cat", Some("animals")),
        tag(5, "uncategorized", None),
    ];
    let aliases = vec![alias(1, "crimson", 1), alias(2, "kitty", 4), alias(3, "navy", 2)];

    let mut p1 = post(1, "tom123", &[1, 4]);
    p1.comments = vec![comment("tommy"), comment("angela")];
    p1.favorites = vec!["angela".to_string()];
    p1.media = image(SupportedMediaType::Png, 1920, 1080);
    p1.src_url = Some("https://example.com/art/1".to_string());

    let mut p2 = post(2, "tommy", &[2, 4]);
    p2.comments = vec![comment("angela")];
    p2.rating_level = RatingLevel::Questionable;
    p2.media = image(SupportedMediaType::Jpeg, 800, 600);

    let mut p3 = post(3, "angela", &[3]);
    p3.rating_level = RatingLevel::Explicit;
    p3.media = image(SupportedMediaType::Mp4, 1280, 720);
    p3.favorites = vec!["tom123".to_string(), "tommy".to_string()];
    p3.src_url = Some("https://other.org/video".to_string());

    let mut p4 = post(4, "angela", &[1, 2, 3]);
    p4.comments = vec![comment("tom123"), comment("tom123"), comment("bob")];
    p4.rating_level = RatingLevel::Unrated;

    let p5 = post(5, "bob", &[]);

    Board {
        posts: vec![p5, p4, p3, p2, p1],
        tags,
        aliases,
    }
}

pub(crate) fn sample_store() -> BackendMemory {
    BackendMemory::from_board(sample_board()).unwrap()
}
