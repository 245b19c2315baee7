use clap::Parser;
use color_eyre::Result;
use elder_console::app::App;
use elder_console::config::Config;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "elder-console")]
#[command(about = "A terminal admin console for Elder, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/elder-console/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Elder API base URL, overrides the config file
  #[arg(short, long)]
  url: Option<String>,

  /// Page of the organizations list to open on
  #[arg(short, long, default_value_t = 1)]
  page: u64,
}

/// Log to a daily file; the terminal belongs to the UI.
///
/// Level comes from `ELDER_LOG`, e.g. `ELDER_LOG=elder_console=debug`.
fn init_logging() -> Option<WorkerGuard> {
  let dir = dirs::data_dir()?.join("elder-console").join("logs");
  std::fs::create_dir_all(&dir).ok()?;

  let appender = tracing_appender::rolling::daily(dir, "elder-console.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("ELDER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging();

  // A bare --url is enough to start without any config file
  let mut config = match (&args.config, &args.url) {
    (None, Some(url)) => Config::load(None).unwrap_or_else(|_| Config::with_url(url.clone())),
    (path, _) => Config::load(path.as_deref())?,
  };
  if let Some(url) = args.url {
    config.api.url = url;
  }

  let mut app = App::new(config, args.page.max(1))?;
  app.run().await?;

  Ok(())
}
