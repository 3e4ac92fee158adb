//! Display helpers for HTML content and the client-side blog index.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::BlogPost;

/// Number of posts shown before "load more" is used.
pub const INITIAL_WINDOW: usize = 7;

/// Number of posts each "load more" reveals.
pub const PAGE_SIZE: usize = 6;

/// Character budget of a blog excerpt.
pub const EXCERPT_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

// An unterminated tag runs to the end of the input.
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[^>]+(>|$)").expect("Invalid regex pattern"));

/// Removes every `<...>` tag from `html`.
pub fn strip_html(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Returns at most the first `max` characters of `text`.
///
/// Cuts on character boundaries, never inside a multi-byte sequence.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Plain-text preview of an HTML body.
///
/// Tags are stripped first; the ellipsis is only added when text was cut.
pub fn excerpt(html: &str, max: usize) -> String {
    let plain = strip_html(html);
    let plain = plain.trim();
    let cut = truncate_chars(plain, max);
    if cut.len() < plain.len() {
        format!("{}{}", cut.trim_end(), ELLIPSIS)
    } else {
        cut.to_string()
    }
}

/// Client-side pagination over the blog index.
///
/// Shows [`INITIAL_WINDOW`] posts, then [`PAGE_SIZE`] more per
/// [`load_more`](Self::load_more).
#[derive(Debug, Clone)]
pub struct BlogFeed {
    posts: Vec<BlogPost>,
    shown: usize,
}

impl BlogFeed {
    pub fn new(posts: Vec<BlogPost>) -> Self {
        let shown = INITIAL_WINDOW.min(posts.len());
        Self { posts, shown }
    }

    /// Posts currently revealed, in backend order.
    pub fn visible(&self) -> &[BlogPost] {
        &self.posts[..self.shown]
    }

    /// Reveals the next page and returns how many posts were added.
    pub fn load_more(&mut self) -> usize {
        let before = self.shown;
        self.shown = (self.shown + PAGE_SIZE).min(self.posts.len());
        self.shown - before
    }

    pub fn has_more(&self) -> bool {
        self.shown < self.posts.len()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Looks up a post by slug, revealed or not.
    pub fn find(&self, slug: &str) -> Option<&BlogPost> {
        self.posts.iter().find(|post| post.slug == slug)
    }
}

impl BlogPost {
    /// Plain-text preview of the post body.
    pub fn excerpt(&self) -> String {
        excerpt(&self.text, EXCERPT_CHARS)
    }
}
