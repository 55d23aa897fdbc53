#[tokio::main]
async fn main() {
    if let Err(e) = vigil::run().await {
        tracing::error!("{e}");
        eprintln!("vigil: {e}");
        std::process::exit(1);
    }
}
