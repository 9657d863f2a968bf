//! Post assembly: generated text → [`PublishDocument`].
//!
//! The first line of the generated text becomes the title, the rest the body.
//! Category and tag names from the input row are resolved to ids, creating
//! missing terms on the CMS.

use tracing::{debug, instrument};

use autopress_cms::TaxonomyResolver;
use autopress_shared::{
    GeneratedArticle, PublishDocument, PublishSettings, Result, TermId, TermKind,
};

/// Category assigned when an input row names none.
pub const FALLBACK_CATEGORY: &str = "Uncategorized";

/// Split generated text at its first newline.
///
/// The title is trimmed; the body is everything after the first newline,
/// untouched. Text without a newline is all title.
pub fn split_article(text: &str) -> GeneratedArticle {
    let (title, body) = text.split_once('\n').unwrap_or((text, ""));
    GeneratedArticle {
        title: title.trim().to_string(),
        body: body.to_string(),
    }
}

/// Split a comma-separated name list, dropping blank entries.
pub fn split_names(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Body with the credit line appended after a blank line.
///
/// `has_body` is false for title-only text, where the credit is the only
/// body line.
fn credited_body(body: &str, has_body: bool, credit_text: &str) -> String {
    if has_body {
        format!("{body}\n\n({credit_text})")
    } else {
        format!("\n({credit_text})")
    }
}

/// Builds publish-ready documents from generated text.
#[derive(Debug, Clone)]
pub struct PostAssembler {
    resolver: TaxonomyResolver,
    settings: PublishSettings,
}

impl PostAssembler {
    pub fn new(resolver: TaxonomyResolver, settings: PublishSettings) -> Self {
        Self { resolver, settings }
    }

    /// Assemble one post.
    ///
    /// Tags resolve in input order; an empty tag list yields no tags. An empty
    /// category list falls back to [`FALLBACK_CATEGORY`]. Resolution errors
    /// abort the assembly of this post only.
    #[instrument(skip_all, fields(author = %author))]
    pub async fn assemble(
        &self,
        generated: &str,
        author: TermId,
        categories: &str,
        tags: &str,
    ) -> Result<PublishDocument> {
        let article = split_article(generated);
        let has_body = generated.contains('\n');

        let tag_ids = self.resolve_all(TermKind::Tag, &split_names(tags)).await?;

        let category_names = split_names(categories);
        let category_ids = if category_names.is_empty() {
            self.resolve_all(TermKind::Category, &[FALLBACK_CATEGORY]).await?
        } else {
            self.resolve_all(TermKind::Category, &category_names).await?
        };

        let content = if self.settings.add_credits {
            credited_body(&article.body, has_body, &self.settings.credit_text)
        } else {
            article.body
        };

        debug!(
            title = %article.title,
            categories = category_ids.len(),
            tags = tag_ids.len(),
            "post assembled"
        );

        Ok(PublishDocument {
            title: article.title,
            content,
            author,
            categories: category_ids,
            tags: tag_ids,
            status: self.settings.post_status.clone(),
        })
    }

    async fn resolve_all(&self, kind: TermKind, names: &[&str]) -> Result<Vec<TermId>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            if let Some(id) = self.resolver.resolve(kind, name).await? {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}
