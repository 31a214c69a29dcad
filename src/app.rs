use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use serde::Serialize;
use url::Url;

use media_surface::{
    classify::{MediaKind, MediaSourceDescriptor},
    config::Config,
    path::{extract_media_path, page_title},
    player::PlayerOptions,
    serving::{route_request, ServeRoute},
};

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[arg(help = "The page path (e.g. `/files/clip.mp4`) or full page URL to inspect.")]
    pub location: String,

    #[arg(
        short,
        long,
        help = "The path to the config file. The default is `media-surface.toml`."
    )]
    pub config: Option<String>,

    #[arg(long, help = "Print the result as JSON.")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Inspection {
    title: String,
    media_path: String,
    kind: MediaKind,
    source: MediaSourceDescriptor,
    options: PlayerOptions,
    page_route: ServeRoute,
    raw_route: ServeRoute,
}

fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

fn inspect(location: &str, config: &Config) -> anyhow::Result<Inspection> {
    let base = Url::parse("http://localhost/").context("Failed to build base URL")?;
    let url = base
        .join(location)
        .with_context(|| format!("Invalid page location {location:?}"))?;

    let media_path = extract_media_path(url.path(), &config.page.serving_root);
    let source = MediaSourceDescriptor::from_media_path(&media_path, &config.page.serving_root);
    log::debug!("Resolved {location:?} to {media_path:?}");

    Ok(Inspection {
        title: page_title(&media_path, &config.page.fallback_title).to_string(),
        kind: source.kind(),
        options: config.player.options_for(&source),
        page_route: route_request(&request_target(&url)),
        raw_route: route_request(&source.url),
        media_path,
        source,
    })
}

pub fn start() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("MEDIA_SURFACE_LOG")
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let inspection = inspect(&cli.location, &config)?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&inspection).context("Failed to serialize inspection")?;
        println!("{json}");
        return Ok(());
    }

    if inspection.media_path.is_empty() {
        log::warn!(
            "{:?} has no {} segment",
            cli.location,
            config.page.serving_root
        );
    }
    println!("title:      {}", inspection.title);
    println!("media path: {}", inspection.media_path);
    println!("kind:       {:?}", inspection.kind);
    println!("source:     {}", inspection.source.url);
    println!("mime hint:  {}", inspection.source.mime_hint);
    println!("fluid:      {}", inspection.options.fluid);
    println!("page route: {:?}", inspection.page_route);
    println!("raw route:  {:?}", inspection.raw_route);
    Ok(())
}
