// Path: crates/conduit-proto/build.rs
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure().compile(
        &["proto/registry.proto", "proto/context.proto", "proto/eventbus.proto"],
        &["proto"],
    )?;
    Ok(())
}
