pub mod edge;
pub mod response;
pub mod routes;

pub use edge::{edge_guard, evaluate, EdgeDecision};
pub use response::{ApiResponse, ApiResult};
pub use routes::{RouteRoleMap, RouteRule};
