use relayq::app::startup;
use relayq::core::error_handling::log_error_with_context;

#[tokio::main]
async fn main() {
    if let Err(e) = startup::run().await {
        if log::log_enabled!(log::Level::Error) {
            log_error_with_context(&e, "Running relay consumer");
        } else {
            // Failed before the logger was up
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}
