use axum::serve;
use tokio::net::TcpListener;
use tracing::info;

use mock_server::{app_with, Product};

/// A small catalog so the dev server answers with something to browse.
fn seed_catalog() -> Vec<Product> {
    let entries = [
        ("Mouse", "Wireless mouse", 25.0, "Accessories", 10),
        ("Keyboard", "Mechanical keyboard", 100.0, "Accessories", 5),
        ("Headphones", "Over-ear headphones", 80.0, "Audio", 7),
        ("Monitor", "27 inch monitor", 250.0, "Displays", 3),
    ];
    entries
        .iter()
        .enumerate()
        .map(|(index, (name, description, price, category, stock))| Product {
            id: index as u64 + 1,
            name: name.to_string(),
            description: description.to_string(),
            price: *price,
            currency: "USD".to_string(),
            category: Some(category.to_string()),
            stock: *stock,
            is_active: true,
            created_at: 1_700_000_000_000 + index as u64,
            updated_at: 1_700_000_000_000 + index as u64,
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    serve(listener, app_with(seed_catalog())).await
}
