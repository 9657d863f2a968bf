//! Name → id resolution for authors, categories and tags.

use std::collections::HashMap;

use tracing::{info, instrument};

use autopress_shared::{AutopressError, RemoteTerm, Result, TermId, TermKind};

use crate::client::CmsClient;

/// Resolves human-readable taxonomy names to CMS ids.
///
/// Stateless: every call performs its own remote lookup. Authors are memoized
/// separately by [`AuthorCache`].
#[derive(Debug, Clone)]
pub struct TaxonomyResolver {
    client: CmsClient,
}

impl TaxonomyResolver {
    pub fn new(client: CmsClient) -> Self {
        Self { client }
    }

    /// Resolve `name` to a remote id.
    ///
    /// - Blank category/tag names resolve to `None` without a request.
    /// - Blank author names fail with [`AutopressError::BlankAuthor`].
    /// - Unknown authors fail with [`AutopressError::AuthorNotFound`]; users
    ///   are never created.
    /// - Unknown categories/tags are created.
    #[instrument(skip(self, kind), fields(kind = %kind))]
    pub async fn resolve(&self, kind: TermKind, name: &str) -> Result<Option<TermId>> {
        let name = name.trim();
        if name.is_empty() {
            return match kind {
                TermKind::Author => Err(AutopressError::BlankAuthor),
                TermKind::Category | TermKind::Tag => Ok(None),
            };
        }

        let terms = self.client.search_terms(kind, name).await?;

        if let Some(term) = exact_match(&terms, name) {
            info!(id = %term.id, "{} '{name}' found", kind.label());
            return Ok(Some(term.id));
        }

        match kind {
            TermKind::Author => Err(AutopressError::AuthorNotFound {
                name: name.to_string(),
            }),
            TermKind::Category | TermKind::Tag => {
                let id = self.client.create_term(kind, name).await?;
                info!(%id, "new {} '{name}' created", kind.label());
                Ok(Some(id))
            }
        }
    }

    /// Resolve an author; never returns "no value".
    pub async fn resolve_author(&self, name: &str) -> Result<TermId> {
        self.resolve(TermKind::Author, name)
            .await?
            .ok_or(AutopressError::BlankAuthor)
    }
}

/// First term whose name equals `name`, ignoring case.
fn exact_match<'a>(terms: &'a [RemoteTerm], name: &str) -> Option<&'a RemoteTerm> {
    let wanted = name.to_lowercase();
    terms
        .iter()
        .find(|term| term.name.trim().to_lowercase() == wanted)
}

// ---------------------------------------------------------------------------
// AuthorCache
// ---------------------------------------------------------------------------

/// Per-run memo of author name → user id.
///
/// Keys are trimmed but case-sensitive. Only mutated from the sequential
/// author phase, so it needs no lock.
#[derive(Debug, Default)]
pub struct AuthorCache {
    entries: HashMap<String, TermId>,
    remote_lookups: usize,
}

impl AuthorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached id for `name`, resolving remotely on first use.
    pub async fn resolve(&mut self, resolver: &TaxonomyResolver, name: &str) -> Result<TermId> {
        let key = name.trim();
        if let Some(id) = self.entries.get(key) {
            return Ok(*id);
        }

        self.remote_lookups += 1;
        let id = resolver.resolve_author(key).await?;
        self.entries.insert(key.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, name: &str) -> Option<TermId> {
        self.entries.get(name.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of remote resolutions performed so far.
    pub fn remote_lookups(&self) -> usize {
        self.remote_lookups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use autopress_shared::CmsSettings;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer) -> TaxonomyResolver {
        let client = CmsClient::new(&CmsSettings {
            base_url: server.uri(),
            username: "editor".into(),
            password: "secret".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        TaxonomyResolver::new(client)
    }

    #[tokio::test]
    async fn picks_exact_match_among_substring_results() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/categories"))
            .and(query_param("search", "Coffee"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 10, "name": "Coffee Gear"},
                {"id": 11, "name": "coffee"},
                {"id": 12, "name": "COFFEE"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let id = resolver_for(&server)
            .resolve(TermKind::Category, "  Coffee ")
            .await
            .unwrap();
        assert_eq!(id, Some(TermId(11)));
    }

    #[tokio::test]
    async fn creates_missing_tag() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 3, "name": "pour-over kettles"}
            ])))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/tags"))
            .and(body_json(serde_json::json!({"name": "pour-over"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 42, "name": "pour-over", "slug": "pour-over"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = resolver_for(&server)
            .resolve(TermKind::Tag, "pour-over")
            .await
            .unwrap();
        assert_eq!(id, Some(TermId(42)));
    }

    #[tokio::test]
    async fn blank_tag_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        assert_eq!(resolver.resolve(TermKind::Tag, "   ").await.unwrap(), None);
        assert_eq!(resolver.resolve(TermKind::Category, "").await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_author_is_fatal() {
        let server = MockServer::start().await;
        let err = resolver_for(&server)
            .resolve(TermKind::Author, " ")
            .await
            .unwrap_err();
        assert!(matches!(err, AutopressError::BlankAuthor));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn unknown_author_is_never_created() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 5, "name": "Jane Doe-Smith"}
            ])))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .resolve_author("Jane Doe")
            .await
            .unwrap_err();
        match err {
            AutopressError::AuthorNotFound { name } => assert_eq!(name, "Jane Doe"),
            other => panic!("expected AuthorNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_failure_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/categories"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .resolve(TermKind::Category, "News")
            .await
            .unwrap_err();
        assert!(matches!(err, AutopressError::Http { status: 503, .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn author_cache_looks_up_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("search", "Jane Doe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 7, "name": "Jane Doe"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        let mut cache = AuthorCache::new();

        let first = cache.resolve(&resolver, "Jane Doe").await.unwrap();
        let second = cache.resolve(&resolver, " Jane Doe ").await.unwrap();

        assert_eq!(first, TermId(7));
        assert_eq!(first, second);
        assert_eq!(cache.remote_lookups(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("Jane Doe"), Some(TermId(7)));
    }
}
