//! Transport-agnostic request construction.
//!
//! The builder validates namespace scope before anything touches the
//! network: single-object verbs require a namespace on namespaced kinds,
//! collection verbs treat a missing namespace as "across all namespaces",
//! and cluster-scoped kinds reject a namespace everywhere.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::params::{
    DeleteOptions, GetOptions, ListOptions, LogOptions, PatchOptions, PostOptions, QueryPairs,
    WatchOptions,
};
use crate::patch::Patch;
use crate::resource::{ResourceDescriptor, Scope};

pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_AUTHORIZATION: &str = "Authorization";

pub const MIME_JSON: &str = "application/json";
/// Accept/Content-Type value asking for the metadata-only object shape.
pub const MIME_PARTIAL_METADATA: &str =
    "application/json;as=PartialObjectMetadata;g=meta.k8s.io;v=v1";
pub const MIME_PARTIAL_METADATA_LIST: &str =
    "application/json;as=PartialObjectMetadataList;g=meta.k8s.io;v=v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A fully-described request, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: QueryPairs,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    fn new(method: Method, path: String) -> Self {
        Self { method, path, query: QueryPairs::new(), headers: Vec::new(), body: None }
    }

    fn with_query(mut self, query: QueryPairs) -> Self {
        self.query = query;
        self
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Builds requests for one resource kind.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder {
    descriptor: &'static ResourceDescriptor,
}

impl RequestBuilder {
    pub fn new(descriptor: &'static ResourceDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        self.descriptor
    }

    /// Policy for verbs addressing a single object.
    fn required_namespace<'a>(&self, namespace: Option<&'a str>) -> Result<Option<&'a str>> {
        match (self.descriptor.scope, namespace) {
            (Scope::Namespaced, None) => {
                Err(Error::NamespaceRequired { kind: self.descriptor.kind })
            }
            (Scope::Cluster, Some(_)) => {
                Err(Error::NamespaceNotAllowed { kind: self.descriptor.kind })
            }
            (_, ns) => Ok(ns),
        }
    }

    /// Policy for verbs addressing a collection; absent means all namespaces.
    fn optional_namespace<'a>(&self, namespace: Option<&'a str>) -> Result<Option<&'a str>> {
        match (self.descriptor.scope, namespace) {
            (Scope::Cluster, Some(_)) => {
                Err(Error::NamespaceNotAllowed { kind: self.descriptor.kind })
            }
            (_, ns) => Ok(ns),
        }
    }

    fn object_path(&self, namespace: Option<&str>, name: &str) -> Result<String> {
        self.descriptor.url_path(namespace, Some(name))
    }

    pub fn get(
        &self,
        name: &str,
        namespace: Option<&str>,
        options: &GetOptions,
    ) -> Result<Request> {
        let ns = self.required_namespace(namespace)?;
        let path = self.object_path(ns, name)?;
        Ok(Request::new(Method::Get, path).with_query(options.as_query_pairs()))
    }

    pub fn list(&self, namespace: Option<&str>, options: &ListOptions) -> Result<Request> {
        let ns = self.optional_namespace(namespace)?;
        let path = self.descriptor.url_path(ns, None)?;
        Ok(Request::new(Method::Get, path).with_query(options.as_query_pairs()))
    }

    pub fn create(
        &self,
        namespace: Option<&str>,
        options: &PostOptions,
        body: Vec<u8>,
    ) -> Result<Request> {
        let ns = self.required_namespace(namespace)?;
        let path = self.descriptor.url_path(ns, None)?;
        Ok(Request::new(Method::Post, path)
            .with_query(options.as_query_pairs())
            .with_header(HEADER_CONTENT_TYPE, MIME_JSON)
            .with_body(body))
    }

    pub fn delete(
        &self,
        name: &str,
        namespace: Option<&str>,
        options: &DeleteOptions,
    ) -> Result<Request> {
        let ns = self.required_namespace(namespace)?;
        let path = self.object_path(ns, name)?;
        let mut request = Request::new(Method::Delete, path);
        if let Some(body) = options.as_request_body() {
            request = request.with_header(HEADER_CONTENT_TYPE, MIME_JSON).with_body(body);
        }
        Ok(request)
    }

    pub fn delete_collection(
        &self,
        namespace: Option<&str>,
        list_options: &ListOptions,
        delete_options: &DeleteOptions,
    ) -> Result<Request> {
        let ns = self.optional_namespace(namespace)?;
        let path = self.descriptor.url_path(ns, None)?;
        let mut request =
            Request::new(Method::Delete, path).with_query(list_options.as_query_pairs());
        if let Some(body) = delete_options.as_request_body() {
            request = request.with_header(HEADER_CONTENT_TYPE, MIME_JSON).with_body(body);
        }
        Ok(request)
    }

    pub fn patch<P: Serialize>(
        &self,
        name: &str,
        namespace: Option<&str>,
        options: &PatchOptions,
        patch: &Patch<P>,
    ) -> Result<Request> {
        let ns = self.required_namespace(namespace)?;
        let path = self.object_path(ns, name)?;
        let (content_type, body) = patch.negotiate()?;
        Ok(Request::new(Method::Patch, path)
            .with_query(options.as_query_pairs())
            .with_header(HEADER_ACCEPT, MIME_JSON)
            .with_header(HEADER_CONTENT_TYPE, content_type)
            .with_body(body))
    }

    pub fn replace(
        &self,
        name: &str,
        namespace: Option<&str>,
        options: &PostOptions,
        body: Vec<u8>,
    ) -> Result<Request> {
        let ns = self.required_namespace(namespace)?;
        let path = self.object_path(ns, name)?;
        Ok(Request::new(Method::Put, path)
            .with_query(options.as_query_pairs())
            .with_header(HEADER_CONTENT_TYPE, MIME_JSON)
            .with_body(body))
    }

    pub fn watch(
        &self,
        namespace: Option<&str>,
        options: &WatchOptions,
        resource_version: Option<&str>,
    ) -> Result<Request> {
        let ns = self.optional_namespace(namespace)?;
        let path = self.descriptor.url_path(ns, None)?;
        let mut query = options.as_query_pairs();
        if let Some(rv) = resource_version {
            query.push(("resourceVersion".to_string(), rv.to_string()));
        }
        Ok(Request::new(Method::Get, path).with_query(query))
    }

    pub fn get_metadata(
        &self,
        name: &str,
        namespace: Option<&str>,
        options: &GetOptions,
    ) -> Result<Request> {
        let ns = self.required_namespace(namespace)?;
        let path = self.object_path(ns, name)?;
        Ok(Request::new(Method::Get, path)
            .with_query(options.as_query_pairs())
            .with_header(HEADER_ACCEPT, MIME_JSON)
            .with_header(HEADER_CONTENT_TYPE, MIME_PARTIAL_METADATA))
    }

    pub fn list_metadata(&self, namespace: Option<&str>, options: &ListOptions) -> Result<Request> {
        let ns = self.optional_namespace(namespace)?;
        let path = self.descriptor.url_path(ns, None)?;
        Ok(Request::new(Method::Get, path)
            .with_query(options.as_query_pairs())
            .with_header(HEADER_ACCEPT, MIME_JSON)
            .with_header(HEADER_CONTENT_TYPE, MIME_PARTIAL_METADATA_LIST))
    }

    pub fn watch_metadata(
        &self,
        namespace: Option<&str>,
        options: &WatchOptions,
        resource_version: Option<&str>,
    ) -> Result<Request> {
        let mut request = self.watch(namespace, options, resource_version)?;
        request = request
            .with_header(HEADER_ACCEPT, MIME_JSON)
            .with_header(HEADER_CONTENT_TYPE, MIME_PARTIAL_METADATA);
        Ok(request)
    }

    pub fn logs(
        &self,
        name: &str,
        namespace: Option<&str>,
        options: &LogOptions,
    ) -> Result<Request> {
        let ns = self.required_namespace(namespace)?;
        let mut path = self.object_path(ns, name)?;
        path.push_str("/log");
        Ok(Request::new(Method::Get, path).with_query(options.as_query_pairs()))
    }

    /// Streaming logs always follow.
    pub fn stream_logs(
        &self,
        name: &str,
        namespace: Option<&str>,
        options: &LogOptions,
    ) -> Result<Request> {
        let mut options = options.clone();
        options.follow = true;
        self.logs(name, namespace, &options)
    }

    pub fn scale(&self, name: &str, namespace: Option<&str>) -> Result<Request> {
        let ns = self.required_namespace(namespace)?;
        let mut path = self.object_path(ns, name)?;
        path.push_str("/scale");
        Ok(Request::new(Method::Get, path))
    }

    pub fn patch_scale<P: Serialize>(
        &self,
        name: &str,
        namespace: Option<&str>,
        options: &PatchOptions,
        patch: &Patch<P>,
    ) -> Result<Request> {
        let ns = self.required_namespace(namespace)?;
        let mut path = self.object_path(ns, name)?;
        path.push_str("/scale");
        let (content_type, body) = patch.negotiate()?;
        Ok(Request::new(Method::Patch, path)
            .with_query(options.as_query_pairs())
            .with_header(HEADER_ACCEPT, MIME_JSON)
            .with_header(HEADER_CONTENT_TYPE, content_type)
            .with_body(body))
    }
}
