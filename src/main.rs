//! LinkMy backend - binary entry point.
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    linkmy_backend::run().await;
}
