//! Krait typed API façade.
//!
//! `Api<K>` binds a client to one resource kind and exposes the verb set.
//! Scope checks run in the request builder before anything touches the
//! network; subresources that not every kind serves (logs, scale) are gated
//! by capability traits, so calling them on the wrong kind is a compile
//! error rather than a runtime surprise.

#![forbid(unsafe_code)]

use std::marker::PhantomData;

use krait_client::{Client, LineStream, WatchStream};
use krait_core::{
    DeleteOptions, DeleteResult, GetOptions, ListOptions, LogOptions, ObjectList,
    PartialObjectMetadata, Patch, PatchOptions, PostOptions, RequestBuilder, Resource, Scale,
    WatchOptions,
};
use krait_core::{Loggable, Result, Scalable};
use serde::Serialize;
use tracing::debug;

/// Typed interface to one resource kind, optionally bound to a namespace.
pub struct Api<K: Resource> {
    client: Client,
    namespace: Option<String>,
    builder: RequestBuilder,
    _marker: PhantomData<fn() -> K>,
}

// Manual impl: cloning the handle never needs K itself to be Clone.
impl<K: Resource> Clone for Api<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            namespace: self.namespace.clone(),
            builder: self.builder,
            _marker: PhantomData,
        }
    }
}

impl<K: Resource> Api<K> {
    /// Address the kind across all namespaces (or cluster-wide).
    pub fn all(client: Client) -> Self {
        Self {
            client,
            namespace: None,
            builder: RequestBuilder::new(K::descriptor()),
            _marker: PhantomData,
        }
    }

    /// Address the kind within one namespace.
    pub fn namespaced(client: Client, namespace: impl Into<String>) -> Self {
        let mut api = Self::all(client);
        api.namespace = Some(namespace.into());
        api
    }

    /// Address the kind within the client's configured default namespace.
    pub fn default_namespaced(client: Client) -> Self {
        let namespace = client.default_namespace().to_string();
        Self::namespaced(client, namespace)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn without_namespace(mut self) -> Self {
        self.namespace = None;
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn ns(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub async fn get(&self, name: &str) -> Result<K> {
        self.get_with(name, &GetOptions::default()).await
    }

    pub async fn get_with(&self, name: &str, options: &GetOptions) -> Result<K> {
        let request = self.builder.get(name, self.ns(), options)?;
        debug!(kind = K::descriptor().kind, name, "get");
        self.client.request_json(request).await
    }

    pub async fn list(&self, options: &ListOptions) -> Result<ObjectList<K>> {
        let request = self.builder.list(self.ns(), options)?;
        debug!(kind = K::descriptor().kind, ns = ?self.ns(), "list");
        self.client.request_json(request).await
    }

    pub async fn create(&self, data: &K) -> Result<K> {
        self.create_with(data, &PostOptions::default()).await
    }

    pub async fn create_with(&self, data: &K, options: &PostOptions) -> Result<K> {
        let body = serde_json::to_vec(data)?;
        let request = self.builder.create(self.ns(), options, body)?;
        debug!(kind = K::descriptor().kind, "create");
        self.client.request_json(request).await
    }

    /// Delete one object. The server answers with the resource body or a
    /// `Status` depending on finalizer timing; both arms are surfaced.
    pub async fn delete(&self, name: &str, options: &DeleteOptions) -> Result<DeleteResult<K>> {
        let request = self.builder.delete(name, self.ns(), options)?;
        debug!(kind = K::descriptor().kind, name, "delete");
        let response = self.client.request(request).await?;
        DeleteResult::from_body(&response.body)
    }

    pub async fn delete_collection(
        &self,
        list_options: &ListOptions,
        delete_options: &DeleteOptions,
    ) -> Result<ObjectList<K>> {
        let request = self.builder.delete_collection(self.ns(), list_options, delete_options)?;
        debug!(kind = K::descriptor().kind, ns = ?self.ns(), "delete collection");
        self.client.request_json(request).await
    }

    pub async fn patch<P: Serialize>(
        &self,
        name: &str,
        options: &PatchOptions,
        patch: &Patch<P>,
    ) -> Result<K> {
        let request = self.builder.patch(name, self.ns(), options, patch)?;
        debug!(kind = K::descriptor().kind, name, content_type = patch.content_type(), "patch");
        self.client.request_json(request).await
    }

    pub async fn replace(&self, name: &str, options: &PostOptions, data: &K) -> Result<K> {
        let body = serde_json::to_vec(data)?;
        let request = self.builder.replace(name, self.ns(), options, body)?;
        debug!(kind = K::descriptor().kind, name, "replace");
        self.client.request_json(request).await
    }

    /// Open a watch. `resource_version` is the continuation point, normally
    /// the value carried by the last observed bookmark.
    pub async fn watch(
        &self,
        options: &WatchOptions,
        resource_version: Option<&str>,
    ) -> Result<WatchStream<K>> {
        let request = self.builder.watch(self.ns(), options, resource_version)?;
        debug!(kind = K::descriptor().kind, ns = ?self.ns(), rv = ?resource_version, "watch");
        self.client.watch(request).await
    }

    pub async fn get_metadata(
        &self,
        name: &str,
        options: &GetOptions,
    ) -> Result<PartialObjectMetadata> {
        let request = self.builder.get_metadata(name, self.ns(), options)?;
        self.client.request_json(request).await
    }

    pub async fn list_metadata(
        &self,
        options: &ListOptions,
    ) -> Result<ObjectList<PartialObjectMetadata>> {
        let request = self.builder.list_metadata(self.ns(), options)?;
        self.client.request_json(request).await
    }

    pub async fn watch_metadata(
        &self,
        options: &WatchOptions,
        resource_version: Option<&str>,
    ) -> Result<WatchStream<PartialObjectMetadata>> {
        let request = self.builder.watch_metadata(self.ns(), options, resource_version)?;
        self.client.watch(request).await
    }
}

impl<K: Resource + Loggable> Api<K> {
    /// One-shot log fetch.
    pub async fn logs(&self, name: &str, options: &LogOptions) -> Result<String> {
        let request = self.builder.logs(name, self.ns(), options)?;
        debug!(kind = K::descriptor().kind, name, "logs");
        self.client.request_text(request).await
    }

    /// Followed log stream; `follow=true` is forced on.
    pub async fn stream_logs(&self, name: &str, options: &LogOptions) -> Result<LineStream> {
        let request = self.builder.stream_logs(name, self.ns(), options)?;
        debug!(kind = K::descriptor().kind, name, "stream logs");
        self.client.stream_lines(request).await
    }
}

impl<K: Resource + Scalable> Api<K> {
    pub async fn scale(&self, name: &str) -> Result<Scale> {
        let request = self.builder.scale(name, self.ns())?;
        self.client.request_json(request).await
    }

    pub async fn patch_scale<P: Serialize>(
        &self,
        name: &str,
        options: &PatchOptions,
        patch: &Patch<P>,
    ) -> Result<Scale> {
        let request = self.builder.patch_scale(name, self.ns(), options, patch)?;
        debug!(kind = K::descriptor().kind, name, "patch scale");
        self.client.request_json(request).await
    }
}
