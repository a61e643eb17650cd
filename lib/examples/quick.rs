//! Shortest path to a running site: an in-memory database, canned
//! generation and a couple of gallery images seeded at startup.

use std::str::FromStr;

use embrace::ai::PIXEL_PNG;
use embrace::{config, Config, ImageStore};

#[tokio::main]
async fn main() {
    let config = Config {
        address: std::net::SocketAddr::from_str("127.0.0.1:8001").unwrap(),
        database: config::Database {
            uri: Some("mem:".to_string()),
        },
        dev: config::DevMode {
            enabled: true,
            mock: true,
        },
        assets: config::Assets {
            serve: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let app = embrace::App::new(config).expect("failed building app");
    seed(&app.store).await;

    let router = embrace::axum::router(&app);
    let listener = tokio::net::TcpListener::bind(app.config.address)
        .await
        .expect("failed binding");
    println!("try: curl http://{}/api/images", app.config.address);
    axum::serve(listener, router).await.expect("failed");
}

async fn seed(store: &ImageStore) {
    for prompt in ["a dreamy castle in the clouds", "sunset over the sea"] {
        store.save_image(PIXEL_PNG, prompt).await;
    }
    store
        .save_memory_image("first-date", PIXEL_PNG, "our first date")
        .await;
}
