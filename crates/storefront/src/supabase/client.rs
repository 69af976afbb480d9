//! Supabase REST client implementation.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use floa_core::{ProductId, UserId};

use super::SupabaseError;
use super::cache::{CacheKey, CacheValue};
use super::types::{ProductColourRow, ProductRow, ProfileRow};
use crate::catalog::CatalogSource;
use crate::config::SupabaseConfig;
use crate::session::{ProfileDirectory, ProfileError, ProfileRecord};

const MAX_CACHED_ENTRIES: u64 = 1000;
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the Supabase REST API.
///
/// Catalog reads are cached for the configured TTL; profile reads and
/// writes always go to the server. Cloning is cheap and shares the cache.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    rest_url: Url,
    anon_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("rest_url", &self.inner.rest_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a client for the project in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST endpoint URL cannot be derived.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_ENTRIES)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                rest_url: rest_url(&config.url)?,
                anon_key: config.anon_key.clone(),
                cache,
            }),
        })
    }

    /// URL of `table` with PostgREST query parameters.
    fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Result<Url, SupabaseError> {
        let mut url = self.inner.rest_url.join(table)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let key = self.inner.anon_key.expose_secret();
        self.inner
            .client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Accept", "application/json")
    }

    /// Run a GET and parse the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SupabaseError> {
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let body = check_status(response).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, 500),
                "Failed to parse Supabase response"
            );
            SupabaseError::Parse(e)
        })
    }

    /// Fetch every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<ProductRow>, SupabaseError> {
        if let Some(CacheValue::Products(rows)) = self.inner.cache.get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(rows.as_ref().clone());
        }

        let url = self.table_url("product", &[("select", "*")])?;
        let rows: Vec<ProductRow> = self.get_json(url).await?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::new(rows.clone())))
            .await;
        Ok(rows)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::NotFound`] if no row has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<ProductRow, SupabaseError> {
        let cache_key = CacheKey::Product(id);
        if let Some(CacheValue::Product(row)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*row);
        }

        let filter = format!("eq.{id}");
        let url = self.table_url("product", &[("select", "*"), ("product_id", &filter)])?;
        let rows: Vec<ProductRow> = self.get_json(url).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("product {id}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(row.clone())))
            .await;
        Ok(row)
    }

    /// Fetch the product/colour join with colour names embedded.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self))]
    pub async fn product_colours(&self) -> Result<Vec<ProductColourRow>, SupabaseError> {
        if let Some(CacheValue::ProductColours(rows)) =
            self.inner.cache.get(&CacheKey::ProductColours).await
        {
            debug!("Cache hit for product colours");
            return Ok(rows.as_ref().clone());
        }

        let url = self.table_url(
            "product_colour",
            &[("select", "product_id,colour:colour_id(name)")],
        )?;
        let rows: Vec<ProductColourRow> = self.get_json(url).await?;

        self.inner
            .cache
            .insert(
                CacheKey::ProductColours,
                CacheValue::ProductColours(Arc::new(rows.clone())),
            )
            .await;
        Ok(rows)
    }
}

#[async_trait]
impl CatalogSource for SupabaseClient {
    async fn products(&self) -> Result<Vec<ProductRow>, SupabaseError> {
        Self::products(self).await
    }

    async fn product(&self, id: ProductId) -> Result<ProductRow, SupabaseError> {
        Self::product(self, id).await
    }

    async fn product_colours(&self) -> Result<Vec<ProductColourRow>, SupabaseError> {
        Self::product_colours(self).await
    }
}

#[async_trait]
impl ProfileDirectory for SupabaseClient {
    #[instrument(skip(self))]
    async fn fetch_is_admin(&self, user_id: UserId) -> Result<Option<bool>, ProfileError> {
        let filter = format!("eq.{user_id}");
        let url = self.table_url("profiles", &[("select", "is_admin"), ("id", &filter)])?;
        let rows: Vec<ProfileRow> = self.get_json(url).await?;
        Ok(rows.first().and_then(|row| row.is_admin))
    }

    #[instrument(skip(self, profile), fields(user_id = %profile.id))]
    async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), ProfileError> {
        let url = self.table_url("profiles", &[])?;
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[profile])
            .send()
            .await
            .map_err(SupabaseError::from)?;
        check_status(response).await?;
        debug!("Profile upserted");
        Ok(())
    }
}

/// The PostgREST root under a project URL.
fn rest_url(project_url: &Url) -> Result<Url, url::ParseError> {
    let mut base = project_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("rest/v1/")
}

/// Return the body of a successful response.
async fn check_status(response: reqwest::Response) -> Result<String, SupabaseError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %truncate(&body, 500),
            "Supabase returned non-success status"
        );
        return Err(SupabaseError::Status {
            status: status.as_u16(),
            body: truncate(&body, ERROR_BODY_LIMIT),
        });
    }
    Ok(body)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
