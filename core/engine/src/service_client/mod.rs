//! Network adapters for the remote landmark service.
//!
//! Each adapter is a one-shot request/response call. Nothing here retries.

mod http;
mod types;

pub use http::HttpServiceClient;
pub use types::{
    CountsClient, ErrorBody, InferenceClient, PredictRequest, PredictResponse, TrainingClient,
    UploadClient, UploadRequest,
};
