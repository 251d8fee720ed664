//! Manager API served over gRPC.

pub mod server;

pub use server::{bind_socket, serve, ManagerServiceImpl};
