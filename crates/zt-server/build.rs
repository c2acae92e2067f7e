fn main() {
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile(&["proto/ztcp.proto"], &["proto"])
        .expect("failed to compile ztcp.proto");
}
