use commune::{create_client, models::CommuneConfig};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = create_client(CommuneConfig::new("secret"));

    println!("{:?}", client.activate("test_experiment", None).await);

    println!(
        "{:?}",
        client
            .get_variant("test_experiment", "button_color", Some("1238"))
            .await
    );

    let data = json!({"plan": "pro"});
    println!("{:?}", client.track("signup", Some(data), None).await);
}
