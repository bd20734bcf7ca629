use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use srcl::api;
use srcl::assets::{AssetLoader, InitOutcome};
use srcl::models::AppConfig;
use srcl::rendering::encode_png;
use srcl::server;
use srcl::services::{
    get_safe_image_src, sample_theme_two_color, DitherRenderer, HttpImageLoader, RenderState,
    SafeSourceOptions, StaticThemeResolver, Surface,
};
use srcl_halftone::{DitherOptions, Rgb};

#[derive(Parser)]
#[command(name = "srcl")]
#[command(about = "SRCL halftone - theme-aware ordered dithering and image proxy")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Dither an image (path, URL or data: URI) to a PNG file
    Dither {
        /// Image source
        src: String,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output width (default: natural width)
        #[arg(long)]
        width: Option<u32>,

        /// Output height (default: natural height)
        #[arg(long)]
        height: Option<u32>,

        /// Black and white by luminance
        #[arg(long)]
        monochrome: bool,

        /// Color levels per channel
        #[arg(long)]
        levels: Option<u32>,

        /// Comma-separated palette (e.g. "#000,#fff,#0000aa")
        #[arg(long)]
        palette: Option<String>,

        /// Two-color paper, overriding the theme background
        #[arg(long)]
        paper: Option<String>,

        /// Two-color ink, overriding the theme text color
        #[arg(long)]
        ink: Option<String>,

        /// Theme to sample two-color paper and ink from
        #[arg(long)]
        theme: Option<String>,

        /// Use the theme's hover ink
        #[arg(long)]
        hover: bool,
    },
    /// Print the source a page would use for an image
    SafeSrc {
        /// Image source as written in the page
        src: String,

        /// Page location (default: server.page_origin)
        #[arg(long)]
        page: Option<String>,

        /// Leave cross-origin sources unchanged
        #[arg(long)]
        no_proxy: bool,
    },
    /// Write the embedded config.yaml to CONFIG_FILE or ./config.yaml
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SRCL halftone API",
        description = "Same-origin image proxy and halftone previews",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_image_proxy,
        api::handle_image_proxy_preflight,
        api::handle_halftone,
    ),
    tags(
        (name = "Images", description = "Image proxy and halftone rendering")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Dither {
            src,
            output,
            width,
            height,
            monochrome,
            levels,
            palette,
            paper,
            ink,
            theme,
            hover,
        }) => {
            init_cli_logging();
            let mode = ModeArgs {
                monochrome,
                levels,
                palette,
                paper,
                ink,
                theme,
                hover,
            };
            run_dither_command(&src, &output, width, height, mode).await
        }
        Some(Commands::SafeSrc {
            src,
            page,
            no_proxy,
        }) => {
            init_cli_logging();
            run_safe_src_command(&src, page.as_deref(), no_proxy)
        }
        Some(Commands::Init { force }) => {
            init_cli_logging();
            run_init_command(force)
        }
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Minimal logging for CLI commands
fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "srcl=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

/// Dither mode flags shared by the `dither` command.
#[derive(Debug, Default)]
struct ModeArgs {
    monochrome: bool,
    levels: Option<u32>,
    palette: Option<String>,
    paper: Option<String>,
    ink: Option<String>,
    theme: Option<String>,
    hover: bool,
}

/// Translate CLI flags into dither options.
///
/// Without a palette, `--monochrome` or `--levels`, the output is the theme
/// two-color halftone with `--paper`/`--ink` overriding the sampled pair.
fn build_dither_options(mode: &ModeArgs, config: &AppConfig) -> anyhow::Result<DitherOptions> {
    let mut options = DitherOptions::new();
    if let Some(levels) = mode.levels {
        options = options.levels(levels);
    }
    if mode.monochrome {
        options = options.monochrome(true);
    }
    if let Some(palette) = &mode.palette {
        options = options.palette(parse_palette(palette)?);
    }

    let explicit_pair = mode.paper.is_some() || mode.ink.is_some();
    let other_mode = mode.monochrome || mode.levels.is_some() || mode.palette.is_some();
    if other_mode && !explicit_pair {
        return Ok(options);
    }

    let theme = mode
        .theme
        .clone()
        .unwrap_or_else(|| config.default_theme.clone());
    if !config.themes.contains(&theme) {
        anyhow::bail!(
            "Unknown theme {theme:?} (available: {})",
            config.themes.names().collect::<Vec<_>>().join(", ")
        );
    }
    let resolver = StaticThemeResolver::fixed(Arc::new(config.themes.clone()), &theme);
    let sampled = sample_theme_two_color(&resolver);
    let Some(mut pair) = sampled.two_color(mode.hover) else {
        return Ok(options.monochrome(true));
    };

    if let Some(paper) = &mode.paper {
        pair.paper = parse_rgb(paper)?;
    }
    if let Some(ink) = &mode.ink {
        pair.ink = parse_rgb(ink)?;
    }
    Ok(options.two_color(pair))
}

fn parse_rgb(value: &str) -> anyhow::Result<Rgb> {
    value
        .trim()
        .parse::<Rgb>()
        .map_err(|e| anyhow::anyhow!("Invalid color {value:?}: {e}"))
}

fn parse_palette(value: &str) -> anyhow::Result<Vec<Rgb>> {
    value
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(parse_rgb)
        .collect()
}

/// Page the CLI draws on: the image's own origin for http(s) sources,
/// otherwise the working directory.
fn cli_page(src: &str) -> anyhow::Result<Url> {
    if let Ok(url) = Url::parse(src.trim()) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(url);
        }
    }
    let cwd = std::env::current_dir()?;
    Url::from_directory_path(&cwd)
        .map_err(|_| anyhow::anyhow!("Working directory {} is not absolute", cwd.display()))
}

/// Dither an image directly to a PNG file (no server needed)
async fn run_dither_command(
    src: &str,
    output: &PathBuf,
    width: Option<u32>,
    height: Option<u32>,
    mode: ModeArgs,
) -> anyhow::Result<()> {
    let config = AppConfig::load_from_assets(&AssetLoader::from_env());
    let options = build_dither_options(&mode, &config)?;

    let page = cli_page(src)?;
    let loader = HttpImageLoader::from_config(&config.proxy, page.clone())?;
    let renderer = DitherRenderer::new(Arc::new(loader), page, SafeSourceOptions::without_proxy());
    renderer.set_options(options);
    renderer.set_source(Some(src), width, height);

    match renderer.settled().await {
        RenderState::Ready => {}
        RenderState::Idle => anyhow::bail!("Empty image source"),
        RenderState::Failed | RenderState::Loading => {
            anyhow::bail!("Failed to load image {src} (run with RUST_LOG=srcl=debug for details)")
        }
    }

    let pixels = match renderer.surface() {
        Surface::Pixels(pixels) => pixels,
        Surface::Tainted { .. } => anyhow::bail!("Image pixels are not readable"),
        Surface::Blank => anyhow::bail!("Nothing was drawn for {src}"),
    };

    let png_bytes = encode_png(&pixels)?;
    std::fs::write(output, &png_bytes)?;
    println!(
        "Rendered {} ({}x{}, {} bytes)",
        output.display(),
        pixels.width(),
        pixels.height(),
        png_bytes.len()
    );

    Ok(())
}

/// Print the resolved safe source, or nothing for an empty one
fn run_safe_src_command(src: &str, page: Option<&str>, no_proxy: bool) -> anyhow::Result<()> {
    let config = AppConfig::load_from_assets(&AssetLoader::from_env());
    let page = match page {
        Some(page) => Url::parse(page).map_err(|e| anyhow::anyhow!("Invalid page URL {page:?}: {e}"))?,
        None => config.server.page_url()?,
    };

    let mut options = config.proxy.safe_source_options();
    if no_proxy {
        options.allow_proxy = false;
    }

    if let Some(safe) = get_safe_image_src(Some(src), Some(&page), &options) {
        println!("{safe}");
    }
    Ok(())
}

/// Write the embedded config to the filesystem
fn run_init_command(force: bool) -> anyhow::Result<()> {
    match AssetLoader::from_env().init(force)? {
        InitOutcome::Written(path) => println!("Wrote {}", path.display()),
        InitOutcome::Skipped(path) => {
            println!("Skipped existing {} (use --force to overwrite)", path.display())
        }
    }
    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let port = std::env::var("PORT").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();

    println!("SRCL halftone v{VERSION}");
    println!("Theme-aware ordered dithering and same-origin image proxy\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("(not set)")
    );
    println!("  PORT        = {}", port.as_deref().unwrap_or("(not set)"));
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );

    let loader = AssetLoader::from_env();
    let config_source = match loader.config_file() {
        Some(path) if path.exists() => path.display().to_string(),
        Some(_) => "embedded (file not found)".to_string(),
        None => "embedded".to_string(),
    };
    let config = AppConfig::load_from_assets(&loader);

    println!("\nConfiguration:");
    println!("  Source:        {config_source}");
    println!("  Listen:        {}", config.bind_addr());
    println!("  Page origin:   {}", config.server.page_origin);
    println!(
        "  Proxy:         {} ({})",
        config.proxy.endpoint,
        if config.proxy.allow_proxy {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Themes:        {} (default: {})",
        config.themes.names().collect::<Vec<_>>().join(", "),
        config.default_theme
    );

    println!("\nCommands:");
    println!("  srcl serve     Start the HTTP server");
    println!("  srcl dither    Dither an image to a PNG file");
    println!("  srcl safe-src  Resolve an image source the way a page would");
    println!("  srcl init      Write the default config.yaml");
    println!("\nRun 'srcl --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "srcl=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let asset_loader = Arc::new(AssetLoader::from_env());
    tracing::info!(
        config = ?asset_loader
            .config_file()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded".to_string()),
        "Config source"
    );

    let state = server::create_app_state(asset_loader)?;
    let bind_addr = state.config.bind_addr();

    let app = server::build_router(state)
        // OpenAPI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "SRCL server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
