//! Wire messages of the `envelope.DataService` RPC surface.
//!
//! ```text
//! service DataService {
//!   rpc AddData(DataRequest) returns (AddDataResponse);
//!   rpc GetData(GetDataRequest) returns (DataResponse);
//! }
//! ```

use envelope_storage::TypedValue;
use prost::Message;

pub const SERVICE_NAME: &str = "envelope.DataService";
pub const ADD_DATA_PATH: &str = "/envelope.DataService/AddData";
pub const GET_DATA_PATH: &str = "/envelope.DataService/GetData";
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

#[derive(Clone, PartialEq, Message)]
pub struct DataRequest {
    #[prost(message, optional, tag = "1")]
    pub data: Option<TypedValue>,
}

/// Acknowledgement of a stored value.
///
/// Carries the generated record key; clients that expect an empty response
/// can ignore it.
#[derive(Clone, PartialEq, Message)]
pub struct AddDataResponse {
    #[prost(string, tag = "1")]
    pub key: String,
}

/// Request for a stored value. An empty key selects the most recent record.
#[derive(Clone, PartialEq, Message)]
pub struct GetDataRequest {
    #[prost(string, tag = "1")]
    pub key: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct DataResponse {
    #[prost(message, optional, tag = "1")]
    pub data: Option<TypedValue>,
}
