#[tokio::main]
async fn main() {
  if let Err(e) = liftlog_lib::run().await {
    eprintln!("liftlog: {}", e);
    std::process::exit(1);
  }
}
