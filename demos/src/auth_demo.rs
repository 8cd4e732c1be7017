use dotenv::dotenv;
use shortlink_client::prelude::*;
use uuid::Uuid;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    pretty_env_logger::init();

    // SHORTLINK_API_URL etc. are read from the environment
    let client = Shortlink::from_env()?;
    println!("Using API at {}", client.options.base_url);

    let mut events = client.auth().store().subscribe();

    let username = format!("demo-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let password = "correct-horse-battery";
    let profile = RegistrationProfile::new(&username, &format!("{}@example.com", username), password);

    println!("Registering {}", username);
    client.auth().register(&profile).await?;
    println!("Dashboard after registering: {:?}", client.navigate(Route::Dashboard));

    println!("\nLogging in");
    let session = client.auth().login(&username, password).await?;
    println!("Signed in as {}", session.username());
    println!("Dashboard after login: {:?}", client.navigate(Route::Dashboard));

    println!("\nRefreshing the access token");
    let refreshed = client.auth().refresh_session().await?;
    println!("Token changed: {}", refreshed.access_token() != session.access_token());

    println!("\nLogging out");
    client.auth().logout();
    println!("Dashboard after logout: {:?}", client.navigate(Route::Dashboard));

    while let Ok(event) = events.try_recv() {
        println!("Session event: {:?}", event);
    }

    Ok(())
}
