use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use tracing::{info, warn};

use rgscan::actions::{self, ActionStatus};
use rgscan::controller::display::LogDisplay;
use rgscan::host::{AppHost, Host, MemoryPlaylist};
use rgscan::scanner::pcm::PcmScanner;
use rgscan::scanner::{PluginRegistry, SCANNER_PLUGIN_ID};
use rgscan::{ScanSession, cli, config, logging, report};

fn main() -> Result<()> {
    logging::init_logging();

    let cli_opts = cli::parse();
    let loaded = config::load_config(cli_opts.config_path.as_deref())?;
    let mut cfg = loaded.config;
    if let Some(target_db) = cli_opts.target_db {
        cfg.target_db = target_db;
    }

    info!(
        "starting session_id={} config_hash={} inputs={} target_db={}",
        cfg.session_id,
        loaded.config_hash,
        cli_opts.inputs.len(),
        cfg.target_db
    );

    let playlist = MemoryPlaylist::new();
    let mut selection = Vec::with_capacity(cli_opts.inputs.len());
    for path in &cli_opts.inputs {
        if !path.is_file() {
            warn!("skipping {}: not a file", path.display());
            continue;
        }
        let id = playlist.insert_file(path);
        if let Some(track) = playlist.track_ref(id) {
            selection.push(track);
        }
    }
    if selection.is_empty() {
        bail!("no readable input files");
    }

    let mut plugins = PluginRegistry::new();
    plugins.register(SCANNER_PLUGIN_ID, Arc::new(PcmScanner::new()));
    let host = Arc::new(AppHost::new(cfg.clone(), plugins));

    let format = report::format_from_cli(cli_opts.format);
    let reporter = report::build_reporter(format, cli_opts.output.as_deref())?;

    let mut session = ScanSession::new(host.clone(), Box::new(LogDisplay))
        .with_reporter(reporter)
        .with_title_template(cfg.title_format.clone())
        .with_worker_name(cfg.worker_name.clone())
        .with_session_id(cfg.session_id.clone());

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })?;
    }

    let action = cli_opts.mode.action();
    match actions::handle_action(&mut session, action, selection) {
        ActionStatus::Started(job) => info!("{} running as {job}", action.id()),
        status => bail!("{} did not start: {status:?}", action.id()),
    }

    let tick = cfg.tick_interval();
    while !session.is_idle() {
        if interrupted.swap(false, Ordering::SeqCst) {
            warn!("interrupt received; aborting running scans");
            session.abort_all();
        }
        session.wait_tick(tick);
    }

    let stats = session.stats();
    info!(
        "rgscan finished started={} finished={} aborted={} background_jobs={}",
        stats.started,
        stats.finished,
        stats.aborted,
        host.background_jobs().active()
    );
    Ok(())
}
