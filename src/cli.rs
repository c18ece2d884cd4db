//! Command line interface for the `livelink` binary.
//!
//! Kept free of crate imports so the build script can render a man page from
//! it.

use std::net::SocketAddr;

use clap::Parser;

/// Connect to a live-link server and print the scene events it sends.
#[derive(Debug, Parser)]
#[command(name = "livelink", version, about = "Live-link scene synchronisation client")]
pub struct Cli {
    /// Server address, as `host:port` or a `ws://` URL.
    #[arg(short, long, default_value = "localhost:8980")]
    pub server: String,

    /// Request visible objects only.
    #[arg(long)]
    pub visible_only: bool,

    /// Subscribe to changes after the initial list.
    #[arg(long)]
    pub subscribe: bool,

    /// Do not append `_<id>` to display names.
    #[arg(long)]
    pub no_id_suffix: bool,

    /// Handshake timeout in milliseconds.
    #[arg(long, default_value_t = 5000, value_name = "MS")]
    pub connect_timeout_ms: u64,

    /// Serve Prometheus metrics on this address.
    #[arg(long, value_name = "ADDR")]
    pub metrics_listen: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::Cli;

    #[test]
    fn defaults_target_the_local_server() {
        let cli = Cli::parse_from(["livelink"]);
        assert_eq!(cli.server, "localhost:8980");
        assert_eq!(cli.connect_timeout_ms, 5000);
        assert!(!cli.visible_only && !cli.subscribe && !cli.no_id_suffix);
        assert!(cli.metrics_listen.is_none());
    }

    #[rstest]
    #[case(&["livelink", "--server", "10.0.0.2:9000"], "10.0.0.2:9000")]
    #[case(&["livelink", "-s", "ws://cad.local:8980"], "ws://cad.local:8980")]
    fn parses_server_option(#[case] args: &[&str], #[case] expected: &str) {
        let cli = Cli::parse_from(args);
        assert_eq!(cli.server, expected);
    }

    #[test]
    fn parses_flags_and_metrics_address() {
        let cli = Cli::parse_from([
            "livelink",
            "--visible-only",
            "--subscribe",
            "--no-id-suffix",
            "--connect-timeout-ms",
            "250",
            "--metrics-listen",
            "127.0.0.1:9100",
        ]);
        assert!(cli.visible_only && cli.subscribe && cli.no_id_suffix);
        assert_eq!(cli.connect_timeout_ms, 250);
        assert_eq!(
            cli.metrics_listen.map(|addr| addr.port()),
            Some(9100)
        );
    }

    #[test]
    fn rejects_malformed_metrics_address() {
        assert!(Cli::try_parse_from(["livelink", "--metrics-listen", "nowhere"]).is_err());
    }
}
