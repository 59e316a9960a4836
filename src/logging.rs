use tracing_subscriber::EnvFilter;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Installs a compact stderr subscriber.
///
/// `RUST_LOG` takes precedence when set. Otherwise the crate logs at `info`,
/// or `debug` when `verbose` is on, and dependencies only warn.
pub fn init_logging(verbose: bool) -> Result<()> {

    let default = if verbose { "warn,page_fetch=debug" } else { "warn,page_fetch=info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
}
