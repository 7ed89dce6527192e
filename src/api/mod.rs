pub mod cors;
pub mod edge;
pub mod gateway;
pub mod headers;
pub mod session;
pub mod sign;
pub mod status;

pub use cors::{CorsLayer, CorsPolicy};
pub use edge::{handle_edge_proxy, handle_edge_token, EdgeTokenResponse, __path_handle_edge_token};
pub use gateway::handle_gateway;
pub use sign::{handle_sign, SignResponse, __path_handle_sign};
pub use status::{handle_status, __path_handle_status};
