// Path: crates/conduit-proto/src/lib.rs
//! Generated `tonic`/`prost` bindings for the three Conduit services.
//! Each service gets its own module, re-exporting the
//! `tonic::include_proto!` output the way the teacher's IPC crate nests
//! `pub mod v1 { tonic::include_proto!(...) }` blocks per proto package.

pub mod registry {
    tonic::include_proto!("conduit.registry.v1");
}

pub mod context {
    tonic::include_proto!("conduit.context.v1");
}

pub mod eventbus {
    tonic::include_proto!("conduit.eventbus.v1");
}
