//! `livelink` binary: connect to a server, list its scene and print events.

mod cli;

use std::{sync::Arc, time::Duration};

use clap::Parser;
use livelink::{
    client::{ClientConfig, ClientError, ConnectionState, LiveLinkClient, ReportLevel, SceneHandler},
    codec::{RefacetBatch, Transaction},
    message::MessageKind,
};
use tracing::{info, warn};

struct PrintHandler;

impl PrintHandler {
    fn print_transaction(label: &str, transaction: &Transaction) {
        println!(
            "{label} {} v{}: {} added, {} updated, {} deleted",
            transaction.filename,
            transaction.version,
            transaction.add.len(),
            transaction.update.len(),
            transaction.delete.len()
        );
        for object in transaction.add.iter().chain(&transaction.update) {
            let triangles = object.geometry.as_ref().map_or(0, |g| g.triangle_count());
            println!(
                "  {} #{} {:?} ({triangles} triangles)",
                object.display_name, object.id, object.kind
            );
        }
    }
}

impl SceneHandler for PrintHandler {
    fn on_connect(&self) { println!("connected"); }

    fn on_disconnect(&self) { println!("disconnected"); }

    fn on_new_file(&self, filename: &str) { println!("file {filename}"); }

    fn on_new_version(&self, filename: &str, version: u32) { println!("version {filename} v{version}"); }

    fn on_transaction(&self, transaction: Transaction) { Self::print_transaction("transaction", &transaction); }

    fn on_list(&self, transaction: Transaction) { Self::print_transaction("list", &transaction); }

    fn on_refacet(&self, batch: RefacetBatch) {
        println!(
            "refacet {} v{}: {} objects",
            batch.filename,
            batch.version,
            batch.items.len()
        );
    }

    fn report(&self, level: ReportLevel, message: &str) { println!("[{level}] {message}"); }

    fn on_request_failed(&self, kind: MessageKind, request_id: u32, status: u32) {
        println!("{kind} request {request_id} failed with status {status}");
    }
}

fn install_metrics(cli: &cli::Cli) {
    let Some(addr) = cli.metrics_listen else {
        return;
    };
    #[cfg(feature = "metrics")]
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => info!(%addr, "serving metrics"),
        Err(err) => warn!(%addr, error = %err, "metrics exporter not installed"),
    }
    #[cfg(not(feature = "metrics"))]
    warn!(%addr, "built without the metrics feature; ignoring --metrics-listen");
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    install_metrics(&cli);

    let config = ClientConfig::default()
        .connect_timeout(Duration::from_millis(cli.connect_timeout_ms))
        .id_suffix(!cli.no_id_suffix);
    let client = LiveLinkClient::with_config(config, Arc::new(PrintHandler));
    client.connect(&cli.server).await?;

    if cli.visible_only {
        client.list_visible().await?;
    } else {
        client.list_all().await?;
    }
    if cli.subscribe {
        client.subscribe_all().await?;
    }

    let mut state = client.watch();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            client.disconnect().await;
        }
        _ = state.wait_for(|snapshot| snapshot.state == ConnectionState::Idle) => {}
    }
    Ok(())
}
