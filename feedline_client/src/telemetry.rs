use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset or unparseable. The client stays quiet
/// below warnings so log lines do not interleave with the shell's output.
pub const DEFAULT_DIRECTIVES: &str = "feedline_client=warn,feedline_cli=info";

/// Sends log output to stderr; stdout belongs to the feed. Only the first
/// call installs a subscriber.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("tracing initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_tracing();
        init_tracing();
        tracing::info!("still logging");
    }
}
