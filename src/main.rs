#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cv_builder::bootstrapper::run().await
}
