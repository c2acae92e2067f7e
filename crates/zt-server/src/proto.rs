//! Generated types from `proto/ztcp.proto`, built by `build.rs` via
//! `tonic-build`/`prost`.

tonic::include_proto!("ztcp.v1");
