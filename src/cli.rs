use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::actions::Action;

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    /// Per-file track gain
    Track,
    /// Whole selection as one album
    Album,
    /// Albums grouped by album tag
    Albums,
}

impl ModeArg {
    pub fn action(self) -> Action {
        match self {
            ModeArg::Track => Action::ScanPerFile,
            ModeArg::Album => Action::ScanAsAlbum,
            ModeArg::Albums => Action::ScanAsAlbums,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Audio files to scan (16-bit stereo PCM or WAVE)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Scan mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Track)]
    pub mode: ModeArg,

    /// Optional path to config file (YAML)
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Target loudness in dB (overrides config when set)
    #[arg(long)]
    pub target_db: Option<f32>,

    /// Results format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write results to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}
