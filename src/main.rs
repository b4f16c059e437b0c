mod config;
mod index;
mod ingest;
mod matcher;
mod model;
mod normalize;
mod year;

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use config::{AppConfig, load_config};
use index::ResolverStore;
use model::{DataCategory, VehicleQuery, VehicleRecord};

/// Shared handle to the current index generation. Rebuilds happen off to the
/// side and swap the inner Arc in one write, so queries never observe a
/// partially built store.
type StoreHandle = Arc<RwLock<Arc<ResolverStore>>>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            warn!("config load error ({e}), using defaults");
            Arc::new(AppConfig::default())
        }
    };

    let store: StoreHandle = match build_store(config.clone()).await {
        Ok(store) => Arc::new(RwLock::new(Arc::new(store))),
        Err(e) => {
            error!("index build failed: {e}");
            return;
        }
    };

    log_stats(&store).await;
    info!("resolver ready; send one JSON query per line, or: stats | reload | quit");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_line(line.trim(), &store, &config).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("stdin read error: {e}");
                        break;
                    }
                }
            }
        }
    }
}

/// Loads the three corpora concurrently and builds a fresh store.
async fn build_store(config: Arc<AppConfig>) -> Result<ResolverStore, Box<dyn std::error::Error>> {
    let dirs = [
        (config.repair_times_dir.clone(), DataCategory::RepairTimes),
        (config.tech_specs_dir.clone(), DataCategory::TechSpecs),
        (config.bulletins_dir.clone(), DataCategory::Bulletins),
    ];

    let tasks: Vec<_> = dirs
        .into_iter()
        .map(|(dir, category)| {
            tokio::task::spawn_blocking(move || ingest::load_corpus_dir(Path::new(&dir), category))
        })
        .collect();

    let mut records: Vec<VehicleRecord> = Vec::new();
    for joined in join_all(tasks).await {
        records.extend(joined??);
    }

    let pivot_year = config.pivot_year;
    let store = tokio::task::spawn_blocking(move || ResolverStore::build(records, pivot_year)).await?;
    Ok(store)
}

/// Handles one input line. Returns false when the loop should exit.
async fn handle_line(line: &str, store: &StoreHandle, config: &Arc<AppConfig>) -> bool {
    match line {
        "" => {}
        "quit" | "exit" => return false,
        "stats" => {
            let snapshot = store.read().await.clone();
            print_json(&snapshot.corpus_stats());
        }
        "reload" => {
            info!("manual reload requested");
            match build_store(config.clone()).await {
                Ok(fresh) => {
                    *store.write().await = Arc::new(fresh);
                    info!("index rebuilt");
                    log_stats(store).await;
                }
                // Keep serving the previous generation on a failed rebuild.
                Err(e) => error!("reload failed: {e}"),
            }
        }
        query => match serde_json::from_str::<VehicleQuery>(query) {
            Ok(query) => {
                let snapshot = store.read().await.clone();
                let resolution = matcher::resolve(&snapshot, &query, &config.tuning);
                print_json(&resolution);
            }
            Err(e) => warn!("expected a JSON query line: {e}"),
        },
    }
    true
}

async fn log_stats(store: &StoreHandle) {
    let snapshot = store.read().await.clone();
    let stats = snapshot.corpus_stats();
    info!(
        records = stats.records,
        lookup_keys = stats.lookup_keys,
        vehicles = stats.vehicles,
        repair_times = stats.repair_times,
        tech_specs = stats.tech_specs,
        bulletins = stats.bulletins,
        "corpus loaded"
    );
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("serialization error: {e}"),
    }
}
