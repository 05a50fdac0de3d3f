//! In-process dashboard wired onto real adapters for integration tests.

use std::sync::Arc;

use actix_web::http::Method;
use actix_web::{App, test, web};
use code_catalog::CodeCatalog;
use mockable::Clock;
use quality_backend::Trace;
use quality_backend::domain::ports::KeyValueStore;
use quality_backend::domain::{
    CodeTableRegistry, ModelCatalogService, ModelCatalogue, SubmissionService,
};
use quality_backend::inbound::http::api_scope;
use quality_backend::inbound::http::state::HttpState;
use quality_backend::outbound::remote::{KvOptionRowRepository, KvSubmissionRepository};
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

/// Services over one store, driven through the `/api/v1` scope.
#[derive(Clone)]
pub struct Dashboard {
    runtime: Arc<Runtime>,
    state: HttpState,
}

impl Dashboard {
    /// Wire every service onto `store` with the built-in catalogue.
    pub fn over<K>(store: Arc<K>, clock: Arc<dyn Clock>) -> Self
    where
        K: KeyValueStore + 'static,
    {
        let catalog = Arc::new(CodeCatalog::builtin());
        let defaults = ModelCatalogue::from_catalog(&catalog);
        let registry = Arc::new(CodeTableRegistry::new(
            Arc::clone(&store),
            Arc::new(KvOptionRowRepository::new(Arc::clone(&store))),
            catalog,
        ));
        let submissions = Arc::new(SubmissionService::new(
            Arc::clone(&store),
            Arc::new(KvSubmissionRepository::new(Arc::clone(&store))),
            Arc::clone(&registry),
            Arc::clone(&clock),
        ));
        let models = Arc::new(ModelCatalogService::new(
            store,
            Arc::clone(&registry),
            defaults,
        ));

        Self {
            runtime: Arc::new(Runtime::new().expect("create runtime")),
            state: HttpState {
                models,
                tables: registry.clone(),
                tables_query: registry,
                submissions: submissions.clone(),
                submissions_query: submissions,
                clock,
            },
        }
    }

    /// Send one request and return the status with the JSON body
    /// (`Value::Null` for empty bodies).
    pub fn request(&self, method: Method, path: &str, payload: Option<Value>) -> (u16, Value) {
        let state = self.state.clone();
        LocalSet::new().block_on(&self.runtime, async move {
            let app = test::init_service(
                App::new()
                    .app_data(web::Data::new(state))
                    .wrap(Trace)
                    .service(api_scope()),
            )
            .await;
            let mut req = test::TestRequest::default().method(method).uri(path);
            if let Some(payload) = payload {
                req = req.set_json(payload);
            }
            let res = test::call_service(&app, req.to_request()).await;
            let status = res.status().as_u16();
            let bytes = test::read_body(res).await;
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).expect("json body")
            };
            (status, body)
        })
    }

    pub fn get(&self, path: &str) -> (u16, Value) {
        self.request(Method::GET, path, None)
    }

    pub fn post(&self, path: &str, payload: Value) -> (u16, Value) {
        self.request(Method::POST, path, Some(payload))
    }

    pub fn delete(&self, path: &str) -> (u16, Value) {
        self.request(Method::DELETE, path, None)
    }
}

/// Code of the entry called `name` in one table of an options body.
pub fn code_of(tables: &Value, table: &str, name: &str) -> Option<String> {
    tables[table]
        .as_array()?
        .iter()
        .find(|entry| entry["name"] == name)
        .and_then(|entry| entry["code"].as_str())
        .map(str::to_owned)
}
