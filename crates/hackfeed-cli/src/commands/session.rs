use anyhow::{Context, Result};
use hackfeed_core::NewsClient;

pub async fn login(client: &NewsClient, username: &str, password: &str) -> Result<()> {
    let identity = client
        .login(username, password)
        .await
        .context("Login failed")?;
    println!("✅ Logged in as {} ({})", identity.name, identity.username);
    Ok(())
}

pub async fn signup(client: &NewsClient, username: &str, password: &str, name: &str) -> Result<()> {
    let identity = client
        .register(username, password, name)
        .await
        .context("Signup failed")?;
    println!("✅ Account created, logged in as {} ({})", identity.name, identity.username);
    Ok(())
}

pub async fn logout(client: &NewsClient) -> Result<()> {
    client.logout().await.context("Failed to clear the stored session")?;
    println!("👋 Logged out");
    Ok(())
}

pub async fn whoami(client: &NewsClient) {
    super::start(client).await;
    match client.current_identity() {
        Some(identity) => {
            println!("{} ({})", identity.name, identity.username);
            println!("Member since {}", identity.created_at.format("%Y-%m-%d"));
            println!("Favorites: {}", identity.favorites.len());
        }
        None => println!("Not logged in"),
    }
}
