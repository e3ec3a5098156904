//! HTTP transport for `envelope.DataService`.
//!
//! Each RPC is a `POST` to `/envelope.DataService/<Method>` with a protobuf
//! request body and a protobuf response body. Failures answer with a JSON
//! error envelope and an HTTP status derived from the error kind.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use envelope_storage::RecordKey;
use prost::Message;
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::proto::{
    ADD_DATA_PATH, AddDataResponse, DataRequest, DataResponse, GET_DATA_PATH, GetDataRequest,
    PROTOBUF_CONTENT_TYPE,
};
use crate::{DataService, ServiceError};

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// Build the RPC router around `service`.
pub fn router(service: DataService, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(ADD_DATA_PATH, post(add_data))
        .route(GET_DATA_PATH, post(get_data))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(service))
}

async fn healthz(State(service): State<Arc<DataService>>) -> Response {
    match service.record_count().await {
        Ok(records) => Json(json!({ "ok": true, "records": records })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn add_data(State(service): State<Arc<DataService>>, body: Bytes) -> Response {
    let request = match DataRequest::decode(body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(ServiceError::InvalidArgument(format!(
                "malformed DataRequest: {}",
                err
            )));
        }
    };
    let Some(value) = request.data else {
        return error_response(ServiceError::InvalidArgument(
            "DataRequest.data is required".to_string(),
        ));
    };

    match service.add_data(value).await {
        Ok(key) => protobuf_response(&AddDataResponse {
            key: key.into_inner(),
        }),
        Err(err) => error_response(err),
    }
}

async fn get_data(State(service): State<Arc<DataService>>, body: Bytes) -> Response {
    let request = match GetDataRequest::decode(body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(ServiceError::InvalidArgument(format!(
                "malformed GetDataRequest: {}",
                err
            )));
        }
    };

    let key = (!request.key.is_empty()).then(|| RecordKey::from(request.key));
    match service.get_data(key.as_ref()).await {
        Ok(value) => protobuf_response(&DataResponse { data: Some(value) }),
        Err(err) => error_response(err),
    }
}

fn protobuf_response<M: Message>(message: &M) -> Response {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROTOBUF_CONTENT_TYPE),
        )],
        message.encode_to_vec(),
    )
        .into_response()
}

fn error_response(err: ServiceError) -> Response {
    let body = ErrorEnvelope {
        error: ErrorBody {
            code: err.code(),
            message: err.to_string(),
        },
    };
    (err.status(), Json(body)).into_response()
}
