//! Fetch boundary consumed from the REST transport.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{FetchError, FetchToken, QueryState};

/// Group/scope identifiers a view is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchScope {
    /// Project identifier.
    pub project: Option<String>,
    /// Domain identifier within the project.
    pub domain: Option<String>,
}

impl FetchScope {
    /// Scope bound to a project and domain.
    pub fn new(project: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
            domain: Some(domain.into()),
        }
    }
}

/// Abstraction for issuing one query against the backend.
///
/// Implementations must honour the token cooperatively: once
/// [`FetchToken::is_cancelled`] turns true they should stop and return
/// [`FetchError::Cancelled`]. Callers do not rely on this for correctness;
/// superseded results are discarded either way.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use live_query::core::{FetchError, FetchScope, FetchToken, Page, QueryFetcher, QueryState};
///
/// struct ExecutionsApi { client: reqwest::Client }
///
/// #[async_trait]
/// impl QueryFetcher<Page<ExecutionSummary>> for ExecutionsApi {
///     async fn fetch(
///         &self,
///         query: QueryState,
///         scope: FetchScope,
///         token: FetchToken,
///     ) -> Result<Page<ExecutionSummary>, FetchError> {
///         tokio::select! {
///             _ = token.cancelled() => Err(FetchError::Cancelled),
///             page = self.list(query, scope) => page.map_err(|e| FetchError::failed(e.to_string())),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait QueryFetcher<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    /// Fetch a page or a single resource for `query` within `scope`.
    async fn fetch(
        &self,
        query: QueryState,
        scope: FetchScope,
        token: FetchToken,
    ) -> Result<T, FetchError>;
}

/// Adapter turning an async closure into a [`QueryFetcher`].
pub struct FnFetcher<F, T> {
    f: F,
    _result_marker: PhantomData<fn() -> T>,
}

impl<F, T> FnFetcher<F, T> {
    /// Wrap `f`.
    pub const fn new(f: F) -> Self {
        Self {
            f,
            _result_marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, T> QueryFetcher<T> for FnFetcher<F, T>
where
    F: Fn(QueryState, FetchScope, FetchToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    T: Send + 'static,
{
    async fn fetch(
        &self,
        query: QueryState,
        scope: FetchScope,
        token: FetchToken,
    ) -> Result<T, FetchError> {
        (self.f)(query, scope, token).await
    }
}
