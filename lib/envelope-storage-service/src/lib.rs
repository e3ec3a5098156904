//! `envelope.DataService`: AddData / GetData over a document store.
//!
//! [`DataService`] is the transport-independent façade; [`rpc::router`]
//! exposes it over HTTP with protobuf bodies and [`serve`] runs the whole
//! server from a [`ServeConfig`].

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod config;
mod error;
pub mod proto;
pub mod rpc;
mod server;
mod service;

pub use config::{ServeConfig, StoreBackend};
pub use error::ServiceError;
pub use proto::{AddDataResponse, DataRequest, DataResponse, GetDataRequest};
pub use rpc::router;
pub use server::{open_store, schema_registry, serve, serve_with_registry};
pub use service::DataService;
