#[tokio::main]
async fn main() {
    savenexus_lib::init_tracing();

    if let Err(e) = savenexus_lib::run_from_env().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
