//! Berth gRPC API
//!
//! This crate defines the gRPC protocol for berthd ↔ CLI communication.
//! The protobuf definitions are in `proto/berth.proto` and code-generated via `tonic-build`.

// Include the generated code
pub mod berth {
    pub mod v1 {
        tonic::include_proto!("berth.v1");
    }
}
