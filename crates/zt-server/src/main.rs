#[tokio::main]
async fn main() -> anyhow::Result<()> {
    zt_server::run().await
}
