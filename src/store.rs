//! Remote object store access
//!
//! `ObjectStore` is the seam between the deploy pipeline and the wire.
//! `HttpStore` speaks the store's JSON-over-HTTPS protocol; tests use the
//! in-memory `MemoryStore` instead of a network.

use crate::error::{LongshoreError, LongshoreResult};
use crate::models::{DeleteFailure, RemoteObject, UploadTask};
use crate::progress::{ProgressReader, ProgressSink};
use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

/// Page size requested from listings.
pub const LIST_PAGE_SIZE: u32 = 1000;

const ACL_HEADER: &str = "x-object-acl";
const COPY_SOURCE_HEADER: &str = "x-copy-source";
const PUBLIC_READ: &str = "public-read";

/// Storage operations the deploy pipeline needs.
pub trait ObjectStore {
    /// One page of objects under `prefix`. A `Some` cursor means more pages
    /// remain and must be fetched before the listing is complete.
    fn list_page(
        &self,
        prefix: &str,
        page_token: Option<&str>,
    ) -> LongshoreResult<(Vec<RemoteObject>, Option<String>)>;

    /// Upload one file with its metadata. Deployed objects are always
    /// publicly readable.
    fn put(
        &self,
        task: &UploadTask,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> LongshoreResult<()>;

    /// Delete a batch of keys, returning per-key failures instead of
    /// aborting on the first bad key.
    fn delete_batch(&self, keys: &[String]) -> LongshoreResult<Vec<DeleteFailure>>;

    /// Server-side copy preserving content and public visibility.
    fn copy(&self, source_key: &str, destination_key: &str) -> LongshoreResult<()>;
}

// ============================================================
// Wire types
// ============================================================

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    objects: Vec<ListedObject>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    key: String,
    etag: String,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    keys: &'a [String],
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    errors: Vec<DeleteError>,
}

#[derive(Debug, Deserialize)]
struct DeleteError {
    key: String,
    message: String,
}

// ============================================================
// HTTP implementation
// ============================================================

/// Store client over the JSON object-store protocol.
pub struct HttpStore {
    client: Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        token: Option<String>,
    ) -> LongshoreResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            endpoint,
            bucket: bucket.into(),
            token,
        })
    }

    fn listing_url(&self) -> String {
        format!("{}/v1/b/{}/o", self.endpoint, self.bucket)
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/v1/b/{}/o/{}", self.endpoint, self.bucket, key)
    }

    fn batch_delete_url(&self) -> String {
        format!("{}/v1/b/{}/batch-delete", self.endpoint, self.bucket)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl ObjectStore for HttpStore {
    fn list_page(
        &self,
        prefix: &str,
        page_token: Option<&str>,
    ) -> LongshoreResult<(Vec<RemoteObject>, Option<String>)> {
        let max_keys = LIST_PAGE_SIZE.to_string();
        let mut request = self
            .client
            .get(self.listing_url())
            .query(&[("prefix", prefix), ("max_keys", max_keys.as_str())]);
        if let Some(token) = page_token {
            request = request.query(&[("page_token", token)]);
        }
        let response = self.authorize(request).send()?;
        if !response.status().is_success() {
            return Err(LongshoreError::Store {
                message: format!(
                    "listing under '{prefix}' failed: {}",
                    failure_message(response)
                ),
            });
        }
        let body: ListResponse = response.json()?;
        let objects = body
            .objects
            .into_iter()
            .map(|o| RemoteObject::new(o.key, o.etag))
            .collect();
        Ok((objects, body.next_page_token))
    }

    fn put(
        &self,
        task: &UploadTask,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> LongshoreResult<()> {
        let file = File::open(&task.local_path)?;
        let length = file.metadata()?.len();
        let body = match progress {
            Some(sink) => Body::sized(ProgressReader::new(file, sink), length),
            None => Body::sized(file, length),
        };
        let request = self
            .client
            .put(self.object_url(&task.destination_key))
            .header(CONTENT_TYPE, &task.content_type)
            .header(CACHE_CONTROL, format!("max-age={}", task.cache_seconds))
            .header(ACL_HEADER, PUBLIC_READ)
            .body(body);
        let response = self
            .authorize(request)
            .send()
            .map_err(|e| LongshoreError::Upload {
                key: task.destination_key.clone(),
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(LongshoreError::Upload {
                key: task.destination_key.clone(),
                message: failure_message(response),
            });
        }
        Ok(())
    }

    fn delete_batch(&self, keys: &[String]) -> LongshoreResult<Vec<DeleteFailure>> {
        let request = self
            .client
            .post(self.batch_delete_url())
            .json(&DeleteRequest { keys });
        let response = self.authorize(request).send()?;
        if !response.status().is_success() {
            return Err(LongshoreError::Store {
                message: format!("batch delete failed: {}", failure_message(response)),
            });
        }
        let body: DeleteResponse = response.json()?;
        Ok(body
            .errors
            .into_iter()
            .map(|e| DeleteFailure {
                key: e.key,
                message: e.message,
            })
            .collect())
    }

    fn copy(&self, source_key: &str, destination_key: &str) -> LongshoreResult<()> {
        let request = self
            .client
            .put(self.object_url(destination_key))
            .header(COPY_SOURCE_HEADER, source_key)
            .header(ACL_HEADER, PUBLIC_READ);
        let response = self.authorize(request).send()?;
        if !response.status().is_success() {
            return Err(LongshoreError::Store {
                message: format!(
                    "copy '{source_key}' -> '{destination_key}' failed: {}",
                    failure_message(response)
                ),
            });
        }
        Ok(())
    }
}

/// Human-readable failure line from a non-success response.
fn failure_message(response: Response) -> String {
    let status = response.status();
    let detail = response.text().unwrap_or_default();
    let detail = detail.trim();
    if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    }
}

// ============================================================
// In-memory fake for tests
// ============================================================

/// In-memory store fake. Clonable so a test can keep a handle while the
/// engine owns another; configurable page size and failure injection.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<std::sync::Mutex<MemoryStoreInner>>,
}

#[cfg(test)]
#[derive(Default)]
struct MemoryStoreInner {
    objects: std::collections::BTreeMap<String, Vec<u8>>,
    /// 0 means "everything in one page".
    page_size: usize,
    fail_puts: std::collections::HashSet<String>,
    fail_deletes: std::collections::HashSet<String>,
    fail_listing: bool,
    put_tasks: Vec<UploadTask>,
    delete_batch_sizes: Vec<usize>,
    list_pages_served: usize,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        let store = Self::default();
        store.lock().page_size = page_size;
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap()
    }

    pub fn insert(&self, key: &str, content: &[u8]) {
        self.lock().objects.insert(key.to_string(), content.to_vec());
    }

    pub fn fail_put_of(&self, key: &str) {
        self.lock().fail_puts.insert(key.to_string());
    }

    pub fn fail_delete_of(&self, key: &str) {
        self.lock().fail_deletes.insert(key.to_string());
    }

    pub fn fail_listing(&self) {
        self.lock().fail_listing = true;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().objects.contains_key(key)
    }

    pub fn content_of(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn put_tasks(&self) -> Vec<UploadTask> {
        self.lock().put_tasks.clone()
    }

    pub fn put_count(&self) -> usize {
        self.lock().put_tasks.len()
    }

    pub fn delete_batch_sizes(&self) -> Vec<usize> {
        self.lock().delete_batch_sizes.clone()
    }

    pub fn list_pages_served(&self) -> usize {
        self.lock().list_pages_served
    }

    fn etag_of(content: &[u8]) -> String {
        use sha2::{Digest, Sha256};
        format!("{:x}", Sha256::digest(content))
    }
}

#[cfg(test)]
impl ObjectStore for MemoryStore {
    fn list_page(
        &self,
        prefix: &str,
        page_token: Option<&str>,
    ) -> LongshoreResult<(Vec<RemoteObject>, Option<String>)> {
        let mut inner = self.lock();
        if inner.fail_listing {
            return Err(LongshoreError::Store {
                message: format!("listing under '{prefix}' failed: HTTP 503 Service Unavailable"),
            });
        }
        inner.list_pages_served += 1;

        let matching: Vec<RemoteObject> = inner
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, content)| RemoteObject::new(key.clone(), Self::etag_of(content)))
            .collect();

        let offset: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let page_size = if inner.page_size == 0 {
            matching.len().max(1)
        } else {
            inner.page_size
        };
        let end = (offset + page_size).min(matching.len());
        let page = matching[offset..end].to_vec();
        let next = if end < matching.len() {
            Some(end.to_string())
        } else {
            None
        };
        Ok((page, next))
    }

    fn put(
        &self,
        task: &UploadTask,
        _progress: Option<Arc<dyn ProgressSink>>,
    ) -> LongshoreResult<()> {
        let mut inner = self.lock();
        if inner.fail_puts.contains(&task.destination_key) {
            return Err(LongshoreError::Upload {
                key: task.destination_key.clone(),
                message: "HTTP 500 Internal Server Error".to_string(),
            });
        }
        let content = std::fs::read(&task.local_path)?;
        inner.objects.insert(task.destination_key.clone(), content);
        inner.put_tasks.push(task.clone());
        Ok(())
    }

    fn delete_batch(&self, keys: &[String]) -> LongshoreResult<Vec<DeleteFailure>> {
        let mut inner = self.lock();
        inner.delete_batch_sizes.push(keys.len());
        let mut failures = Vec::new();
        for key in keys {
            if inner.fail_deletes.contains(key) {
                failures.push(DeleteFailure {
                    key: key.clone(),
                    message: "access denied".to_string(),
                });
            } else {
                inner.objects.remove(key);
            }
        }
        Ok(failures)
    }

    fn copy(&self, source_key: &str, destination_key: &str) -> LongshoreResult<()> {
        let mut inner = self.lock();
        let content = inner
            .objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| LongshoreError::Store {
                message: format!("copy source '{source_key}' does not exist"),
            })?;
        inner.objects.insert(destination_key.to_string(), content);
        Ok(())
    }
}
