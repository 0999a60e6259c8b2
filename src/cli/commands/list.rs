//! List anime command handler

use crate::config::Config;
use crate::db;
use crate::services::AnimeService;

pub async fn cmd_list_anime(config: &Config, query: Option<&str>) -> anyhow::Result<()> {
    let store = db::open_store(&config.storage).await?;
    let service = AnimeService::new(store, false);
    let anime_list = service.list(query).await?;

    if anime_list.is_empty() {
        println!("No anime found.");
        return Ok(());
    }

    println!("Anime ({} total)", anime_list.len());
    println!("{:-<70}", "");

    for anime in anime_list {
        let year = anime
            .year
            .map_or_else(|| "?".to_string(), |y| y.to_string());

        println!("• {} ({})", anime.title, year);
        if !anime.genres.is_empty() {
            println!("    Genres: {}", anime.genres.join(", "));
        }
        if let Some(studio) = &anime.studio {
            println!("    Studio: {studio}");
        }
        if let Some(author) = &anime.author {
            println!("    Author: {author}");
        }
        println!("    ID: {}", anime.id);
    }

    Ok(())
}
