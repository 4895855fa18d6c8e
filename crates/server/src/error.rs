use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::StoreError;
use thiserror::Error;
use topology::{GraphError, TopologyError};

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        let ApiError::Topology(err) = self;

        match err {
            TopologyError::Graph(GraphError::Serialization(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GraphError")
            }
            TopologyError::Graph(_) => (StatusCode::BAD_REQUEST, "GraphError"),
            TopologyError::Path(_) => (StatusCode::BAD_REQUEST, "PathError"),
            TopologyError::Inventory(_) => (StatusCode::BAD_GATEWAY, "InventoryError"),
            TopologyError::Solver(_) | TopologyError::SolverResponse(_) => {
                (StatusCode::BAD_GATEWAY, "SolverError")
            }
            TopologyError::Store(StoreError::VersionConflict { .. }) => {
                (StatusCode::CONFLICT, "StoreError")
            }
            TopologyError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "StoreError"),
            TopologyError::TopologyMissing
            | TopologyError::VertexNotFound(_)
            | TopologyError::SliceNotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            TopologyError::EmptyConstraints
            | TopologyError::SolverNotSet
            | TopologyError::InvalidSolverAddress { .. }
            | TopologyError::MalformedConstraint(_)
            | TopologyError::MultipleSelectors(_, _)
            | TopologyError::InvalidSliceId(_)
            | TopologyError::EmptySlice { .. }
            | TopologyError::ManagementAddress { .. } => (StatusCode::BAD_REQUEST, "BadRequest"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status();

        let ApiError::Topology(err) = &self;
        let error_message = format!("{}: {}", error_type, err);

        if status_code.is_server_error() {
            tracing::error!("{}", error_message);
        } else {
            tracing::debug!("request rejected: {}", error_message);
        }

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: TopologyError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(TopologyError::EmptyConstraints), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(TopologyError::MultipleSelectors("a".into(), "b".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(TopologyError::TopologyMissing), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(TopologyError::VertexNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(TopologyError::Store(StoreError::VersionConflict {
                key: "/slice/x".into(),
                expected: 0,
                found: 1,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(TopologyError::Graph(GraphError::DuplicateEdge("a-b".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TopologyError::Inventory(
                inventory_client::InventoryClientError::NotFound("x".into())
            )),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_error_body_names_the_error_kind() {
        let response = ApiError::from(TopologyError::SliceNotFound("42".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "NotFound: slice not found: 42");
    }
}
