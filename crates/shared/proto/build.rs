fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile identity service proto
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/identity.proto"], &["proto/"])?;

    // Compile cohort data service proto
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/cohort.proto"], &["proto/"])?;

    Ok(())
}
