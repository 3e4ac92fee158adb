//! Content pages and blog posts

use crate::BackofficeClient;
use crate::error::Error;
use crate::model::BlogPost;
use crate::model::ContentItem;

impl BackofficeClient {
    /// Fetches every content page.
    pub async fn fetch_contents(&self) -> Result<Vec<ContentItem>, Error> {
        self.get_json(&["content"]).await
    }

    /// Resolves one content page by slug.
    ///
    /// The backend has no per-slug endpoint, so the full list is fetched and
    /// searched. Returns `Ok(None)` when no page carries the slug.
    pub async fn content_by_slug(&self, slug: &str) -> Result<Option<ContentItem>, Error> {
        let contents = self.fetch_contents().await?;
        Ok(find_by_slug(contents, slug))
    }

    /// Fetches every blog post, in backend order.
    pub async fn fetch_blogs(&self) -> Result<Vec<BlogPost>, Error> {
        self.get_json(&["blogs"]).await
    }
}

fn find_by_slug(contents: Vec<ContentItem>, slug: &str) -> Option<ContentItem> {
    contents.into_iter().find(|item| item.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;

    fn item(id: i64, slug: &str) -> ContentItem {
        ContentItem {
            id: RecordId(id),
            title: slug.to_uppercase(),
            slug: slug.to_string(),
            text: String::new(),
            main_photo: None,
            other_photos: Vec::new(),
            created_at: None,
        }
    }

    #[test]
    fn test_find_by_slug() {
        let contents = vec![item(1, "about"), item(2, "shipping")];
        let found = find_by_slug(contents, "shipping").unwrap();
        assert_eq!(found.id, RecordId(2));
    }

    #[test]
    fn test_find_by_slug_is_exact() {
        let contents = vec![item(1, "about")];
        assert!(find_by_slug(contents, "About").is_none());
    }
}
