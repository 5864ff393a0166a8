use graphscout::browser::ChromiumBrowser;
use graphscout::{config, Explorer};
use tracing::{error, info, warn};

fn arg_value(flag: &str) -> Option<String> {
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == flag {
            return args.next();
        }
        if let Some(rest) = a.strip_prefix(&format!("{flag}=")) {
            return Some(rest.to_string());
        }
    }
    None
}

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cfg = if let Some(from_file) = config::load_config_file() {
        from_file
    } else {
        let Some(entry_point) = arg_value("--entry") else {
            error!("graphscout: no config file found and --entry not supplied");
            eprintln!("usage: graphscout --entry <url> [--app-name <name>] [--max-depth <n>] [--headless=false]");
            std::process::exit(2);
        };
        let app_name = arg_value("--app-name").unwrap_or_else(|| "discovered-app".to_string());
        let mut cfg = config::ExplorerConfig::new(app_name, entry_point);
        if let Some(depth) = arg_value("--max-depth").and_then(|v| v.parse().ok()) {
            cfg.max_depth = depth;
        }
        if has_flag("--headless=false") {
            cfg.headless = false;
        }
        cfg
    };

    if let Err(e) = cfg.validate() {
        error!("graphscout: invalid configuration: {}", e);
        std::process::exit(2);
    }

    let events = graphscout::EventSink::default();
    let mut subscriber = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = subscriber.recv().await {
            info!(tag = ?event.tag, "graphscout event: {}", event.payload);
        }
    });

    let browser = match ChromiumBrowser::launch(cfg.headless, 1280, 800).await {
        Ok(b) => b,
        Err(e) => {
            error!("graphscout: failed to launch browser: {}", e);
            std::process::exit(1);
        }
    };
    let page = match browser.new_page(&cfg.entry_points[0]).await {
        Ok(p) => p,
        Err(e) => {
            error!("graphscout: failed to open page: {}", e);
            std::process::exit(1);
        }
    };

    let explorer = match Explorer::new(cfg, events) {
        Ok(e) => e,
        Err(e) => {
            error!("graphscout: failed to construct explorer: {}", e);
            std::process::exit(1);
        }
    };

    let report = explorer.discover(&page).await;
    if !report.errors.is_empty() {
        warn!("graphscout: discovery completed with {} error(s)", report.errors.len());
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
