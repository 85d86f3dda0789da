pub mod request_tracing;

pub use request_tracing::{extract_request_id, RequestId, RequestTracing, REQUEST_ID_HEADER};
