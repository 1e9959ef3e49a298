mod catalog;
mod config;
mod config_persistence;
mod device;
mod discovery_manager;
mod display;
mod history;
mod input;
mod protocol;
mod render;
mod storage;

use std::{
    sync::{Arc, Mutex},
    thread,
};

use catalog::OnlineCatalog;
use config_persistence::{
    config_file_path, config_root, data_root, load_or_create_config, resolve_database_path,
    resolve_page_path,
};
use device::DeviceCapabilities;
use discovery_manager::{DiscoveryManager, DiscoveryOrchestrator};
use display::HtmlPageSurface;
use history::HistoryStore;
use log::{error, info, warn};
use protocol::Message;
use storage::LocalStorage;
use tokio::sync::broadcast;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Debug);
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let config_file = config_file_path(&config_root()?);
    let config = load_or_create_config(&config_file);
    let data_root = data_root()?;

    let database_path = resolve_database_path(&config, &data_root);
    let storage = LocalStorage::open(&database_path)?;
    let display = Arc::new(HtmlPageSurface::new(resolve_page_path(&config, &data_root)));
    info!(
        "Drown ready. config={} storage={} page={}",
        config_file.display(),
        database_path.display(),
        display.page_path().display()
    );

    // Repaint prior state before the first trigger.
    let history = HistoryStore::new(storage, display.clone());
    if let Err(err) = history.repaint() {
        warn!("Failed to paint stored history: {}", err);
    }
    if config.display.open_in_browser {
        display.open_in_browser();
    }

    let orchestrator = DiscoveryOrchestrator::new(
        Arc::new(OnlineCatalog::new(&config.catalog)),
        display.clone(),
        Arc::new(Mutex::new(history)),
        DeviceCapabilities::detect(),
        &config.discovery,
    );

    // Bus for communication between components
    let (bus_sender, _) = broadcast::channel::<Message>(64);

    let discovery_bus_receiver = bus_sender.subscribe();
    let discovery_bus_sender = bus_sender.clone();
    let discovery_thread = thread::spawn(move || {
        let mut discovery_manager =
            DiscoveryManager::new(discovery_bus_receiver, discovery_bus_sender, orchestrator);
        discovery_manager.run();
    });

    input::run_input_binding(std::io::stdin().lock(), &bus_sender);

    if discovery_thread.join().is_err() {
        error!("Discovery manager thread panicked");
    }
    Ok(())
}
