//! Provider registration and administration.

use std::path::Path;
use std::sync::{Arc, Weak};

use kvlink_core::{Address, DatabaseId, DatabaseType, Error, ProviderId, Request, Response, Result};
use kvlink_transport::{Instance, RequestHandler, Transport};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::ProviderConfig;
use crate::database::DatabaseInfo;
use crate::executor::{Context, Executor};

/// A database service registered on a transport instance.
///
/// Remote clients reach it through the instance's address and the provider's
/// selector. Database registration and removal are only available through
/// this type, never over the wire.
///
/// # Example
///
/// ```ignore
/// let fabric = Fabric::new();
/// let server = Instance::bind(&fabric, "server")?;
/// let provider = Provider::register(&server, ProviderId(1))?;
/// let id = provider.add_database("users", "", DatabaseType::Map)?;
/// ```
pub struct Provider {
    id: ProviderId,
    address: Address,
    instance: Weak<Instance>,
    executor: Executor,
}

impl Provider {
    /// Register a provider with the default configuration.
    pub fn register(instance: &Arc<Instance>, id: ProviderId) -> Result<Arc<Self>> {
        Self::register_with_config(instance, id, ProviderConfig::default())
    }

    /// Register a provider under selector `id`.
    ///
    /// Errors:
    /// - `InvalidArgument`: the selector is taken or the instance is finalized
    pub fn register_with_config(
        instance: &Arc<Instance>,
        id: ProviderId,
        config: ProviderConfig,
    ) -> Result<Arc<Self>> {
        let ctx = Arc::new(Context {
            catalog: Catalog::new(),
            config,
            outbound: Arc::downgrade(instance),
        });
        let provider = Arc::new(Provider {
            id,
            address: instance.address().clone(),
            instance: Arc::downgrade(instance),
            executor: Executor::new(ctx),
        });
        instance
            .register_provider(id, Arc::clone(&provider) as Arc<dyn RequestHandler>)
            .map_err(|e| Error::InvalidArgument {
                reason: e.to_string(),
            })?;
        info!(
            target: "kvlink::provider",
            address = %provider.address,
            provider = %id,
            "Provider registered"
        );
        Ok(provider)
    }

    /// Selector this provider answers on.
    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// Address of the hosting instance.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Active configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.executor.context().config
    }

    /// Create a database. An empty `path` places persistent databases under
    /// the configured default root.
    ///
    /// Errors:
    /// - `DatabaseExists`: the name is taken
    /// - `DatabaseCreate`: the backend could not be opened
    pub fn add_database(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        db_type: DatabaseType,
    ) -> Result<DatabaseId> {
        let ctx = self.executor.context();
        let path = path.as_ref();
        let root = if path.as_os_str().is_empty() {
            ctx.config.default_root.clone()
        } else {
            path.to_path_buf()
        };
        Ok(ctx.catalog.create(name, db_type, &root)?.id())
    }

    /// Same as [`Provider::add_database`].
    pub fn attach_database(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        db_type: DatabaseType,
    ) -> Result<DatabaseId> {
        self.add_database(name, path, db_type)
    }

    /// Detach a database. Files of persistent databases stay on disk and are
    /// reloaded if a database of the same name and path is added again.
    pub fn remove_database(&self, id: DatabaseId) -> Result<()> {
        self.executor.context().catalog.remove(id).map(|_| ())
    }

    /// Detach every database.
    pub fn remove_all_databases(&self) {
        self.executor.context().catalog.clear();
    }

    /// Hosted database ids, in creation order.
    pub fn databases(&self) -> Vec<DatabaseId> {
        self.executor.context().catalog.ids()
    }

    /// Name, type and location of a hosted database.
    pub fn database_info(&self, id: DatabaseId) -> Result<DatabaseInfo> {
        Ok(self.executor.context().catalog.get(id)?.info())
    }

    /// Flush every database, returning the first failure.
    pub fn flush_all(&self) -> Result<()> {
        let mut first_err = None;
        for db in self.executor.context().catalog.all() {
            if let Err(e) = db.backend().flush() {
                warn!(target: "kvlink::provider", db = %db.id(), error = %e, "Flush failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Run a request locally, bypassing the transport.
    pub fn execute(&self, request: Request) -> Response {
        self.executor.execute(request)
    }

    /// Stop answering on the instance. Databases stay hosted until the
    /// provider is dropped.
    pub fn deregister(&self) -> Result<()> {
        let instance = self.instance.upgrade().ok_or_else(|| Error::InvalidArgument {
            reason: format!("instance {} is gone", self.address),
        })?;
        match instance.deregister_provider(self.id) {
            Some(_) => {
                info!(target: "kvlink::provider", address = %self.address, provider = %self.id, "Provider deregistered");
                Ok(())
            }
            None => Err(Error::InvalidArgument {
                reason: format!("provider {} is not registered at {}", self.id, self.address),
            }),
        }
    }
}

#[cfg(test)]
impl Provider {
    pub(crate) fn catalog(&self) -> &Catalog {
        &self.executor.context().catalog
    }
}

impl RequestHandler for Provider {
    fn handle(&self, origin: &Address, request: Request) -> Response {
        self.executor.execute_remote(origin, request)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("databases", &self.executor.context().catalog.len())
            .finish()
    }
}
