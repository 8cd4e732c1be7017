use dotenv::dotenv;
use std::env;

use shortlink_client::cooldown::CooldownState;
use shortlink_client::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    pretty_env_logger::init();

    let username = env::var("SHORTLINK_USERNAME").expect("SHORTLINK_USERNAME must be set");
    let password = env::var("SHORTLINK_PASSWORD").expect("SHORTLINK_PASSWORD must be set");

    let client = Shortlink::from_env()?;
    client.auth().login(&username, &password).await?;

    let mut dashboard = client.dashboard();
    dashboard.load().await?;
    println!("{} has {} links", username, dashboard.links().len());

    // keep shortening until the API throttles us
    for n in 1..=6 {
        let long_url = format!("https://www.rust-lang.org/?demo={}", n);
        match dashboard.submit(&long_url).await {
            Ok(link) => println!("{} -> {}", link.long_url, dashboard.short_url(&link)),
            Err(Error::RateLimited) => {
                println!("{}", dashboard.message().unwrap_or_default());
                break;
            }
            Err(e) => {
                println!("Failed: {}", e);
                break;
            }
        }
    }

    let mut cooldown = dashboard.cooldown();
    while let CooldownState::Cooling(secs) = cooldown {
        if secs % 10 == 0 {
            println!("Create enabled again in {}s", secs);
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        cooldown = dashboard.cooldown();
    }

    println!("\nCurrent links:");
    for link in dashboard.links() {
        println!("  [{}] {} -> {}", link.id, dashboard.short_url(link), link.long_url);
    }

    if let Some(link) = dashboard.links().last().cloned() {
        dashboard.delete(link.id).await?;
        println!("Deleted {}", link.short_code);
    }

    dashboard.close();
    client.auth().logout();
    Ok(())
}
