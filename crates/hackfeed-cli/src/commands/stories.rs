use anyhow::{Context, Result, bail};
use hackfeed_core::{FeedView, NewsClient};

use super::render::render_items;

pub async fn list(client: &NewsClient, view: FeedView) -> Result<()> {
    client.start().await.context("Failed to load stories")?;

    if view != FeedView::All && client.current_identity().is_none() {
        bail!("Log in to see the '{}' view", view);
    }

    let items = client.show(view);
    if items.is_empty() {
        println!("No stories to show");
    } else {
        print!("{}", render_items(&items));
    }
    Ok(())
}

pub async fn submit(client: &NewsClient, title: &str, url: &str) -> Result<()> {
    super::start(client).await;
    let story = client
        .submit_story(title, url)
        .await
        .context("Submission failed")?;
    println!("✅ Submitted \"{}\" [{}]", story.title, story.story_id);
    Ok(())
}

pub async fn delete(client: &NewsClient, story_id: &str) -> Result<()> {
    super::start(client).await;
    client
        .delete_story(story_id)
        .await
        .context("Deletion failed")?;
    println!("🗑️  Deleted [{}]", story_id);
    Ok(())
}

pub async fn favorite(client: &NewsClient, story_id: &str) -> Result<()> {
    super::start(client).await;
    let now_favorite = client
        .toggle_favorite(story_id)
        .await
        .context("Favorite update failed")?;
    if now_favorite {
        println!("★ Added [{}] to favorites", story_id);
    } else {
        println!("☆ Removed [{}] from favorites", story_id);
    }
    Ok(())
}
