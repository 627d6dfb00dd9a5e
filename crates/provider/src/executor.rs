//! The Executor - single entry point for requests reaching a provider.
//!
//! The Executor routes each [`Request`] to its handler and returns the
//! handler's [`Response`]. It holds the provider's state but no per-call
//! state of its own.

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use kvlink_core::{Address, Output, Request, Response};
use kvlink_transport::Instance;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::ProviderConfig;
use crate::handlers;

/// State shared by every handler of one provider.
pub(crate) struct Context {
    pub(crate) catalog: Catalog,
    pub(crate) config: ProviderConfig,
    /// Endpoint used for provider-to-provider calls (migration).
    pub(crate) outbound: Weak<Instance>,
}

impl Context {
    /// Directory for a database given the caller's path; empty means the
    /// configured default root.
    pub(crate) fn resolve_root(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.config.default_root.clone()
        } else {
            PathBuf::from(path)
        }
    }
}

/// Request dispatcher.
///
/// # Thread Safety
///
/// Executor is `Send + Sync`; the transport calls it from whichever thread
/// delivered the request.
pub(crate) struct Executor {
    ctx: Arc<Context>,
}

impl Executor {
    pub(crate) fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    pub(crate) fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Execute a single request.
    pub(crate) fn execute(&self, request: Request) -> Response {
        let name = request.name();
        let response = self.dispatch(request);
        self.log_failure(name, &response);
        response
    }

    /// Execute a request delivered by the transport from `origin`.
    ///
    /// Provider-to-provider requests are only honored from instances that
    /// host providers themselves.
    pub(crate) fn execute_remote(&self, origin: &Address, request: Request) -> Response {
        if let Request::ReceiveDatabase { .. } = &request {
            if let Err(e) = handlers::migrate::check_origin(&self.ctx, origin) {
                let response = Err(e);
                self.log_failure(request.name(), &response);
                return response;
            }
        }
        self.execute(request)
    }

    fn log_failure(&self, name: &str, response: &Response) {
        if let Err(e) = response {
            debug!(target: "kvlink::provider", request = name, status = %e.status(), error = %e, "Request failed");
        }
    }

    fn dispatch(&self, request: Request) -> Response {
        let ctx = &self.ctx;
        match request {
            // Catalog
            Request::Probe => Ok(Output::Unit),
            Request::Open { name } => handlers::catalog::open(ctx, &name),
            Request::CountDatabases => handlers::catalog::count_databases(ctx),
            Request::ListDatabases { max } => handlers::catalog::list_databases(ctx, max),

            // Single key
            Request::Put { db, key, value } => handlers::kv::put(ctx, db, &key, &value),
            Request::Get { db, key, capacity } => handlers::kv::get(ctx, db, &key, capacity),
            Request::Length { db, key } => handlers::kv::length(ctx, db, &key),
            Request::Exists { db, key } => handlers::kv::exists(ctx, db, &key),
            Request::Erase { db, key } => handlers::kv::erase(ctx, db, &key),

            // Batch
            Request::PutMulti { db, entries } => handlers::batch::put_multi(ctx, db, &entries),
            Request::GetMulti {
                db,
                keys,
                capacities,
            } => handlers::batch::get_multi(ctx, db, &keys, &capacities),
            Request::LengthMulti { db, keys } => handlers::batch::length_multi(ctx, db, &keys),
            Request::ExistsMulti { db, keys } => handlers::batch::exists_multi(ctx, db, &keys),
            Request::EraseMulti { db, keys } => handlers::batch::erase_multi(ctx, db, &keys),

            // Scan
            Request::ListKeys {
                db,
                start_key,
                prefix,
                max_keys,
                key_capacities,
            } => handlers::scan::list_keys(
                ctx,
                db,
                &start_key,
                &prefix,
                max_keys,
                key_capacities.as_ref(),
            ),
            Request::ListKeyvals {
                db,
                start_key,
                prefix,
                max_keys,
                capacities,
            } => handlers::scan::list_keyvals(
                ctx,
                db,
                &start_key,
                &prefix,
                max_keys,
                capacities.as_ref(),
            ),

            // Migration
            Request::MigrateDatabase {
                db,
                dest_address,
                dest_provider,
                dest_root,
                remove_origin,
            } => handlers::migrate::migrate_database(
                ctx,
                db,
                &dest_address,
                dest_provider,
                &dest_root,
                remove_origin,
            ),
            Request::ReceiveDatabase {
                name,
                db_type,
                root,
                entries,
            } => handlers::migrate::receive_database(ctx, &name, db_type, &root, &entries),
        }
    }
}
