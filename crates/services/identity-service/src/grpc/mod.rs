//! gRPC layer.

mod identity_grpc;

pub use identity_grpc::IdentityGrpcService;
