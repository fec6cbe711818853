//! Context-menu commands exposed to the player.

use tracing::{info, warn};

use crate::controller::ScanSession;
use crate::host::TrackRef;
use crate::registry::JobId;
use crate::scanner::ScanMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScanPerFile,
    ScanAsAlbums,
    ScanAsAlbum,
    RemoveInfo,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::ScanPerFile,
        Action::ScanAsAlbums,
        Action::ScanAsAlbum,
        Action::RemoveInfo,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Action::ScanPerFile => "rg_scan_per_file",
            Action::ScanAsAlbums => "rg_scan_selection_as_albums",
            Action::ScanAsAlbum => "rg_scan_selection_as_album",
            Action::RemoveInfo => "rg_remove_info",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Action::ScanPerFile => "ReplayGain/Scan Per-file Track Gain",
            Action::ScanAsAlbums => "ReplayGain/Scan Selection As Albums (By Tags)",
            Action::ScanAsAlbum => "ReplayGain/Scan Selection As Single Album",
            Action::RemoveInfo => "ReplayGain/Remove ReplayGain Information",
        }
    }

    pub fn scan_mode(self) -> Option<ScanMode> {
        match self {
            Action::ScanPerFile => Some(ScanMode::Track),
            Action::ScanAsAlbums => Some(ScanMode::AlbumsFromTags),
            Action::ScanAsAlbum => Some(ScanMode::SingleAlbum),
            Action::RemoveInfo => None,
        }
    }

    pub fn from_id(id: &str) -> Option<Action> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// A scan job was created and is running.
    Started(JobId),
    /// The command could not start; the reason has been logged.
    Failed,
    /// The command does nothing yet.
    Unsupported,
}

pub fn handle_action(
    session: &mut ScanSession,
    action: Action,
    selection: Vec<TrackRef>,
) -> ActionStatus {
    let Some(mode) = action.scan_mode() else {
        warn!("{} is not implemented", action.id());
        return ActionStatus::Unsupported;
    };
    info!(action = action.id(), tracks = selection.len(), "menu action");
    match session.run_scanner(mode, selection) {
        Ok(job) => ActionStatus::Started(job),
        Err(_) => ActionStatus::Failed,
    }
}
