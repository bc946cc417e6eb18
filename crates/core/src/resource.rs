//! Resource descriptors: static facts about a served kind and its URL rules.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::meta::ObjectMeta;

/// Whether a kind is namespace-bound or cluster-global.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Scope {
    Cluster,
    Namespaced,
}

/// Static facts about a served resource kind.
///
/// One descriptor per kind, constructed at program start and never mutated.
/// Plural names are mandatory: the engine does not guess them from the kind.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub scope: Scope,
}

impl ResourceDescriptor {
    /// Panics at compile time when `kind` or `plural` is empty.
    pub const fn new(
        group: &'static str,
        version: &'static str,
        kind: &'static str,
        plural: &'static str,
        scope: Scope,
    ) -> Self {
        assert!(!kind.is_empty(), "descriptor kind must not be empty");
        assert!(!plural.is_empty(), "descriptor plural must not be empty");
        Self { group, version, kind, plural, scope }
    }

    /// The legacy core group is served unprefixed under `/api`.
    fn is_core_group(&self) -> bool {
        self.group.is_empty() || self.group == "core"
    }

    /// `apiVersion` as it appears on the wire (`v1`, `apps/v1`).
    pub fn api_version(&self) -> String {
        if self.is_core_group() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    fn api_root(&self) -> String {
        if self.is_core_group() {
            format!("/api/{}", self.version)
        } else {
            format!("/apis/{}/{}", self.group, self.version)
        }
    }

    /// Build the collection or object path for this kind.
    ///
    /// `namespace: None` addresses the collection across all namespaces (or
    /// the cluster-wide collection for cluster-scoped kinds); supplying a
    /// namespace for a cluster-scoped kind is a `ScopeMismatch`. Pure: the
    /// same inputs always yield the same path.
    pub fn url_path(&self, namespace: Option<&str>, name: Option<&str>) -> Result<String> {
        let root = self.api_root();
        let mut path = match namespace {
            None => format!("{}/{}", root, self.plural),
            Some(_) if self.scope == Scope::Cluster => {
                return Err(Error::ScopeMismatch { kind: self.kind })
            }
            Some(ns) => format!("{}/namespaces/{}/{}", root, ns, self.plural),
        };
        if let Some(name) = name {
            path.push('/');
            path.push_str(name);
        }
        Ok(path)
    }
}

/// A typed API object: serde representation plus a static descriptor.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn descriptor() -> &'static ResourceDescriptor;

    /// Common object metadata, used by generic consumers (printers, caches).
    fn metadata(&self) -> &ObjectMeta;
}

/// Marker: the kind serves the `log` subresource.
pub trait Loggable: Resource {}

/// Marker: the kind serves the `scale` subresource.
pub trait Scalable: Resource {}

pub mod registry {
    //! Eagerly-constructed descriptors for the built-in kinds.
    //!
    //! Write-once: everything here is a `static` built at compile time.

    use super::{ResourceDescriptor, Scope};

    pub static POD: ResourceDescriptor =
        ResourceDescriptor::new("core", "v1", "Pod", "pods", Scope::Namespaced);
    pub static NAMESPACE: ResourceDescriptor =
        ResourceDescriptor::new("core", "v1", "Namespace", "namespaces", Scope::Cluster);
    pub static CONFIG_MAP: ResourceDescriptor =
        ResourceDescriptor::new("core", "v1", "ConfigMap", "configmaps", Scope::Namespaced);
    pub static DEPLOYMENT: ResourceDescriptor =
        ResourceDescriptor::new("apps", "v1", "Deployment", "deployments", Scope::Namespaced);

    pub fn builtins() -> &'static [&'static ResourceDescriptor] {
        static BUILTINS: [&ResourceDescriptor; 4] = [&POD, &NAMESPACE, &CONFIG_MAP, &DEPLOYMENT];
        &BUILTINS
    }

    /// Look a built-in descriptor up by kind or plural, case-insensitively.
    pub fn find(name: &str) -> Option<&'static ResourceDescriptor> {
        builtins().iter().copied().find(|d| {
            d.kind.eq_ignore_ascii_case(name) || d.plural.eq_ignore_ascii_case(name)
        })
    }
}
