use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    path::Path,
    sync::{Arc, RwLock},
};

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};

use crate::{
    media::{MediaCategory, RatingLevel, SupportedMediaType},
    search::{eval, AggregateKind, Predicate, TagId},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub kind: SupportedMediaType,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
}

impl Media {
    pub fn is_image(&self) -> bool {
        self.kind.category() == MediaCategory::Image
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub uploader: String,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub rating_level: RatingLevel,
    #[serde(default)]
    pub src_url: Option<String>,
    #[serde(default)]
    pub media: Option<Media>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Usernames that favorited the post.
    #[serde(default)]
    pub favorites: Vec<String>,
}

impl Post {
    pub fn count(&self, kind: AggregateKind) -> u64 {
        let count = match kind {
            AggregateKind::CommentCount => self.comments.len(),
            AggregateKind::FavoriteCount => self.favorites.len(),
            AggregateKind::TagCount => self.tags.len(),
        };
        count as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Recomputed from the posts whenever a board is loaded.
    #[serde(default)]
    pub post_count: u64,
    #[serde(default)]
    pub rating_level: RatingLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAlias {
    pub id: u64,
    pub name: String,
    pub tag_id: TagId,
}

/// Everything a tagboard stores that the search engine needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub aliases: Vec<TagAlias>,
}

/// A post with the aggregate counts a query asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedPost {
    pub post: Post,
    pub annotations: BTreeMap<AggregateKind, u64>,
}

impl AnnotatedPost {
    pub fn annotate(post: Post, kinds: &BTreeSet<AggregateKind>) -> Self {
        let annotations = kinds.iter().map(|kind| (*kind, post.count(*kind))).collect();
        AnnotatedPost { post, annotations }
    }

    pub fn annotation(&self, kind: AggregateKind) -> Option<u64> {
        self.annotations.get(&kind).copied()
    }
}

pub trait PostStore: Send + Sync {
    /// Every post, annotated with the requested counts.
    fn annotate(&self, kinds: &BTreeSet<AggregateKind>) -> anyhow::Result<Vec<AnnotatedPost>>;

    /// Posts matching `predicate`, ordered by id.
    fn filter_posts(
        &self,
        posts: Vec<AnnotatedPost>,
        predicate: &Predicate,
    ) -> anyhow::Result<Vec<Post>>;

    /// Tags whose name contains `text` ignoring case, ordered by category
    /// then by descending post count.
    fn tags_by_name_partial(
        &self,
        text: &str,
        exclude_names: &BTreeSet<String>,
        exclude_ids: &BTreeSet<TagId>,
    ) -> anyhow::Result<Vec<Tag>>;

    /// Aliases whose name contains `text` ignoring case, with their target
    /// tag, ordered by alias name.
    fn aliases_by_name_partial(
        &self,
        text: &str,
        exclude_names: &BTreeSet<String>,
        exclude_tag_ids: &BTreeSet<TagId>,
    ) -> anyhow::Result<Vec<(TagAlias, Tag)>>;
}

#[derive(Clone)]
pub struct BackendMemory {
    board: Arc<RwLock<Board>>,
}

impl BackendMemory {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read board {}", path.display()))?;
        let board: Board = serde_json::from_str(&data)
            .with_context(|| format!("board {} is malformed", path.display()))?;

        let backend = Self::from_board(board)?;
        {
            let board = backend.read()?;
            log::info!(
                "loaded board {}: {} posts, {} tags, {} aliases",
                path.display(),
                board.posts.len(),
                board.tags.len(),
                board.aliases.len()
            );
        }
        Ok(backend)
    }

    /// Validates references and recomputes tag post counts.
    pub fn from_board(mut board: Board) -> anyhow::Result<Self> {
        let mut tag_ids = HashSet::new();
        for tag in &board.tags {
            if !tag_ids.insert(tag.id) {
                bail!("duplicate tag id {}", tag.id);
            }
        }

        for alias in &board.aliases {
            if !tag_ids.contains(&alias.tag_id) {
                bail!("alias {:?} points to unknown tag {}", alias.name, alias.tag_id);
            }
        }

        let mut post_counts: HashMap<TagId, u64> = HashMap::new();
        let mut post_ids = HashSet::new();
        for post in &board.posts {
            if !post_ids.insert(post.id) {
                bail!("duplicate post id {}", post.id);
            }
            for tag_id in &post.tags {
                if !tag_ids.contains(tag_id) {
                    bail!("post {} is tagged with unknown tag {tag_id}", post.id);
                }
                *post_counts.entry(*tag_id).or_default() += 1;
            }
        }

        for tag in board.tags.iter_mut() {
            tag.post_count = post_counts.get(&tag.id).copied().unwrap_or(0);
        }
        board.posts.sort_by_key(|post| post.id);

        Ok(BackendMemory {
            board: Arc::new(RwLock::new(board)),
        })
    }

    fn read(&self) -> anyhow::Result<std::sync::RwLockReadGuard<'_, Board>> {
        self.board
            .read()
            .map_err(|_| anyhow!("board lock is poisoned"))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl PostStore for BackendMemory {
    fn annotate(&self, kinds: &BTreeSet<AggregateKind>) -> anyhow::Result<Vec<AnnotatedPost>> {
        let board = self.read()?;
        Ok(board
            .posts
            .iter()
            .map(|post| AnnotatedPost::annotate(post.clone(), kinds))
            .collect())
    }

    fn filter_posts(
        &self,
        posts: Vec<AnnotatedPost>,
        predicate: &Predicate,
    ) -> anyhow::Result<Vec<Post>> {
        let board = self.read()?;
        let ctx = eval::EvalContext::new(&board.tags, &board.aliases, predicate)?;

        let required = eval::referenced_aggregates(predicate);
        let mut matched = Vec::new();
        for post in posts {
            if let Some(kind) = required
                .iter()
                .find(|kind| post.annotation(**kind).is_none())
            {
                bail!("post {} was not annotated with {kind:?}", post.post.id);
            }
            if ctx.eval(predicate, &post) {
                matched.push(post.post);
            }
        }
        matched.sort_by_key(|post| post.id);

        log::debug!("{} posts matched", matched.len());
        Ok(matched)
    }

    fn tags_by_name_partial(
        &self,
        text: &str,
        exclude_names: &BTreeSet<String>,
        exclude_ids: &BTreeSet<TagId>,
    ) -> anyhow::Result<Vec<Tag>> {
        let board = self.read()?;
        let mut tags = board
            .tags
            .iter()
            .filter(|tag| contains_ignore_case(&tag.name, text))
            .filter(|tag| !exclude_names.contains(&tag.name))
            .filter(|tag| !exclude_ids.contains(&tag.id))
            .cloned()
            .collect::<Vec<_>>();

        // uncategorized tags go last
        tags.sort_by(|a, b| {
            (a.category.is_none(), &a.category, Reverse(a.post_count), a.id).cmp(&(
                b.category.is_none(),
                &b.category,
                Reverse(b.post_count),
                b.id,
            ))
        });
        Ok(tags)
    }

    fn aliases_by_name_partial(
        &self,
        text: &str,
        exclude_names: &BTreeSet<String>,
        exclude_tag_ids: &BTreeSet<TagId>,
    ) -> anyhow::Result<Vec<(TagAlias, Tag)>> {
        let board = self.read()?;
        let tags = board
            .tags
            .iter()
            .map(|tag| (tag.id, tag))
            .collect::<HashMap<_, _>>();

        let mut aliases = Vec::new();
        for alias in &board.aliases {
            if !contains_ignore_case(&alias.name, text)
                || exclude_names.contains(&alias.name)
                || exclude_tag_ids.contains(&alias.tag_id)
            {
                continue;
            }
            let tag = tags
                .get(&alias.tag_id)
                .ok_or_else(|| anyhow!("alias {:?} points to unknown tag", alias.name))?;
            aliases.push((alias.clone(), (*tag).clone()));
        }

        aliases.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(aliases)
    }
}
