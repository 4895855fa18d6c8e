use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{middleware as app_middleware, state::AppState};

pub mod health;
pub mod network;
pub mod slices;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(network::router())
        .merge(slices::router());

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(app_middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use cbs_client::CbsClientError;
    use db::MemoryStore;
    use inventory_client::{
        Capacity, ENTITY_IP, Entity, InventoryClientError, InventoryItem, Link, Network,
        ResourceItem,
    };
    use serde_json::{Value, json};
    use topology::{InventorySource, Solver, SolverRequest};
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::REQUEST_ID_HEADER;

    struct StaticInventory {
        items: Vec<InventoryItem>,
        resources: HashMap<String, InventoryItem>,
    }

    #[async_trait]
    impl InventorySource for StaticInventory {
        async fn list_inventory_items(&self) -> Result<Vec<InventoryItem>, InventoryClientError> {
            Ok(self.items.clone())
        }

        async fn get_resource_item(
            &self,
            uuid: &str,
        ) -> Result<InventoryItem, InventoryClientError> {
            self.resources
                .get(uuid)
                .cloned()
                .ok_or_else(|| InventoryClientError::NotFound(uuid.to_string()))
        }
    }

    #[derive(Default)]
    struct CountingSolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Solver for CountingSolver {
        async fn solve(
            &self,
            _address: &str,
            request: &SolverRequest,
        ) -> Result<String, CbsClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // answer with every edge of the graph it was given
            let edges: Vec<Value> = request
                .graph
                .edges
                .iter()
                .map(|e| {
                    let (src, dst) = e.endpoints().unwrap();
                    json!({"src": src, "dst": dst})
                })
                .collect();
            let nodes: Vec<Value> = request
                .graph
                .vertices
                .iter()
                .map(|v| json!({"name": v.name}))
                .collect();
            Ok(json!({"nodes": nodes, "edges": edges}).to_string())
        }
    }

    fn device(uuid: &str, ip: &str) -> InventoryItem {
        InventoryItem {
            uuid: uuid.to_string(),
            resource: Some(ResourceItem {
                uuid: uuid.to_string(),
                phy: Some(Capacity {
                    cores: 8,
                    memory: 16,
                    storage: 100,
                }),
                ..Default::default()
            }),
            entity: Some(Entity {
                idtype: ENTITY_IP.to_string(),
                identification: ip.to_string(),
            }),
            version: 1,
        }
    }

    fn link(uuid: &str, src: &str, dst: &str) -> Link {
        Link {
            uuid: uuid.to_string(),
            src_resource: src.to_string(),
            dst_resource: dst.to_string(),
            bandwidth: 10,
            ..Default::default()
        }
    }

    fn app() -> (Router, Arc<CountingSolver>) {
        let devices = vec![
            device("a", "10.0.0.1"),
            device("b", "10.0.0.2"),
            device("c", "10.0.0.3"),
        ];
        let resources = devices
            .iter()
            .map(|d| (d.uuid.clone(), d.clone()))
            .collect();

        let mut items = devices;
        items.push(InventoryItem {
            uuid: "net".to_string(),
            resource: Some(ResourceItem {
                uuid: "net".to_string(),
                parent: "tenant".to_string(),
                network: Some(Network {
                    name: "lan".to_string(),
                    adjlist: vec![link("l1", "a", "b"), link("l2", "b", "c")],
                }),
                ..Default::default()
            }),
            ..Default::default()
        });

        let solver = Arc::new(CountingSolver::default());
        let state = AppState::new(
            Arc::new(StaticInventory { items, resources }),
            solver.clone(),
            Arc::new(MemoryStore::new()),
            None,
        );
        (router(state), solver)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn cpu(vertex: &str) -> Value {
        json!({"object": "cpu", "vertices": [vertex]})
    }

    #[tokio::test]
    async fn test_health_carries_request_id() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_graph_lifecycle() {
        let (app, _) = app();

        let (status, body) = send(&app, Method::GET, "/api/network/graph", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["exists"], false);

        let (status, _) = send(&app, Method::GET, "/api/network/graph/json", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::POST, "/api/network/graph", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, "/api/network/graph", None).await;
        assert_eq!(body["data"]["exists"], true);
        let dotviz = body["data"]["dotviz"].as_str().unwrap();
        assert!(dotviz.starts_with("digraph"));
        assert!(dotviz.contains("label = \"a\""));
        assert!(dotviz.contains("0 -> 1"));

        let (status, body) = send(&app, Method::GET, "/api/network/graph/json", None).await;
        assert_eq!(status, StatusCode::OK);
        let graph: Value = serde_json::from_str(body["data"]["graph"].as_str().unwrap()).unwrap();
        assert_eq!(graph["edges"].as_array().unwrap().len(), 2);

        let (status, _) = send(&app, Method::DELETE, "/api/network/graph", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, Method::GET, "/api/network/graph", None).await;
        assert_eq!(body["data"]["exists"], false);
    }

    #[tokio::test]
    async fn test_solve_validation() {
        let (app, solver) = app();
        send(&app, Method::POST, "/api/network/graph", None).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/network/solve",
            Some(json!({"constraints": [cpu("a")]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/network/cbs",
            Some(json!({"host": "cbs", "port": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/network/cbs",
            Some(json!({"host": "cbs", "port": "15045"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let two_selectors = json!({"constraints": [
            {"object": "bw", "selector": "a"},
            {"object": "bw", "selector": "b"},
        ]});
        let (status, _) = send(&app, Method::POST, "/api/network/solve", Some(two_selectors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/network/solve",
            Some(json!({"constraints": [cpu("nowhere")]})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(solver.calls.load(Ordering::SeqCst), 0);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/network/solve",
            Some(json!({"constraints": [cpu("a")]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let answer: Value =
            serde_json::from_str(body["data"]["response"].as_str().unwrap()).unwrap();
        assert_eq!(answer["edges"].as_array().unwrap().len(), 2);
        assert_eq!(solver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slice_lifecycle() {
        let (app, _) = app();
        send(&app, Method::POST, "/api/network/graph", None).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/slices",
            Some(json!({"constraints": [cpu("a")], "cbs_addr": "cbs:15045"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let uuid = body["data"]["uuid"].as_str().unwrap().to_string();

        let (_, body) = send(&app, Method::GET, "/api/slices", None).await;
        assert_eq!(body["data"]["slices"].as_array().unwrap().len(), 1);

        let (status, body) = send(&app, Method::GET, &format!("/api/slices/{}", uuid), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["edges"].as_array().unwrap().len(), 2);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/slices/{}/configure", uuid),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let path: Vec<String> = serde_json::from_value(body["data"]["path"].clone()).unwrap();
        assert!(path == ["a", "b", "c"] || path == ["c", "b", "a"]);
        assert_eq!(body["data"]["management"]["b"], "10.0.0.2");

        let (status, _) = send(&app, Method::DELETE, &format!("/api/slices/{}", uuid), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::GET, &format!("/api/slices/{}", uuid), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, "/api/slices/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
