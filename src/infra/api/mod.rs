pub mod http;

pub use http::{ApiRequest, ApiResponse, HttpClient, MockHttpClient, ReqwestHttpClient};
