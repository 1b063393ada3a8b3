use crate::clients::plex::PlexClient;
use crate::config::Config;

pub async fn cmd_libraries(
    config: &Config,
    server: Option<String>,
    token: Option<String>,
) -> anyhow::Result<()> {
    let Some(server) = server.or_else(|| config.plex.server_url.clone()) else {
        println!("Usage: gaps libraries --server <url> --token <token>");
        println!("Or set plex.server_url and plex.token in config.toml");
        return Ok(());
    };
    let Some(token) = token.or_else(|| config.plex.token.clone()) else {
        println!("No Plex token given. Use --token or set plex.token in config.toml");
        return Ok(());
    };

    let client = PlexClient::new(config.plex.connect_timeout(), config.plex.read_timeout())?;
    let libraries = client.movie_libraries(&server, &token).await?;

    if libraries.is_empty() {
        println!("No movie libraries found on {server}");
        return Ok(());
    }

    println!("Movie Libraries");
    println!("{:-<60}", "");
    for lib in &libraries {
        println!("[{}] {}", lib.key, lib.title);
    }

    let keys: Vec<&str> = libraries.iter().map(|l| l.key.as_str()).collect();
    println!();
    println!("To search all of them, add to config.toml:");
    println!("  [plex]");
    println!("  library_keys = [{}]", keys.join(", "));

    Ok(())
}
