//! Compose a post image from the configured template and upload it.
//!
//! Usage:
//!   post-composer <sport> <faculty>...
//!   post-composer --list
//!
//! Settings come from the JSON file named by `COMPOSER_CONFIG`
//! (default `composer.json`); a missing file means stock settings.

use tracing::info;

use post_receiver::composer::{
    list_generated, Composer, ComposerConfig, PostClient, PostGenerator, PostRequest,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config_path =
        std::env::var("COMPOSER_CONFIG").unwrap_or_else(|_| "composer.json".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        ComposerConfig::load(&config_path)?
    } else {
        info!(path = %config_path, "No composer config found, using defaults");
        ComposerConfig::default()
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag] if flag == "--list" => {
            let files = list_generated(&config.output_folder)?;
            println!("Found {} generated posts:", files.len());
            for (i, file) in files.iter().enumerate() {
                println!("{}. {} ({})", i + 1, file.filename, file.created_at.to_rfc3339());
            }
        }
        [sport, faculties @ ..] => {
            let client = PostClient::new(config.server_url.clone())?;
            let generator = PostGenerator::new(Composer::new(config)?, client);
            let generated = generator
                .generate_post(&PostRequest {
                    sport: sport.clone(),
                    faculties: faculties.to_vec(),
                    metadata: None,
                })
                .await?;
            println!(
                "{} -> {}",
                generated.path.display(),
                generated.response.post.url.unwrap_or_default()
            );
        }
        [] => anyhow::bail!("usage: post-composer <sport> <faculty>... | --list"),
    }

    Ok(())
}
