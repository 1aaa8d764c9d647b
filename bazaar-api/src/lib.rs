pub mod handlers;
pub mod response;
pub mod server;

pub use handlers::ApiState;
pub use server::{app, router, run};
