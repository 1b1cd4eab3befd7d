use crate::domain::blog::{BlogPost, Category, Tag};

/// Read-only view over a page of posts for the blog listing and sidebar.
#[derive(Debug, Clone, Copy)]
pub struct BlogFeed<'a> {
    posts: &'a [BlogPost],
}

impl<'a> BlogFeed<'a> {
    pub fn new(posts: &'a [BlogPost]) -> Self {
        Self { posts }
    }

    pub fn published(&self) -> Vec<&'a BlogPost> {
        self.posts.iter().filter(|p| p.is_published).collect()
    }

    pub fn by_category(&self, name: &str) -> Vec<&'a BlogPost> {
        self.posts
            .iter()
            .filter(|p| {
                p.category
                    .as_ref()
                    .is_some_and(|c| c.name.eq_ignore_ascii_case(name))
            })
            .collect()
    }

    pub fn by_tag(&self, name: &str) -> Vec<&'a BlogPost> {
        self.posts.iter().filter(|p| p.has_tag(name)).collect()
    }

    /// Case-insensitive match on title, excerpt and content. A blank query matches everything.
    pub fn search(&self, text: &str) -> Vec<&'a BlogPost> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.posts.iter().collect();
        }

        self.posts
            .iter()
            .filter(|p| {
                p.title.to_lowercase().contains(&needle)
                    || p.excerpt
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&needle))
                    || p.content.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn category_counts<'c>(&self, categories: &'c [Category]) -> Vec<(&'c Category, usize)> {
        categories
            .iter()
            .map(|category| {
                let count = self
                    .posts
                    .iter()
                    .filter(|p| in_category(p, category))
                    .count();
                (category, count)
            })
            .collect()
    }

    pub fn tag_counts<'t>(&self, tags: &'t [Tag]) -> Vec<(&'t Tag, usize)> {
        tags.iter()
            .map(|tag| {
                let count = self
                    .posts
                    .iter()
                    .filter(|p| p.tags.iter().any(|t| t.id == tag.id))
                    .count();
                (tag, count)
            })
            .collect()
    }
}

fn in_category(post: &BlogPost, category: &Category) -> bool {
    post.category_id.as_ref() == Some(&category.id)
        || post.category.as_ref().is_some_and(|c| c.id == category.id)
}
