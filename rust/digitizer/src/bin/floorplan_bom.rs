// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: turn a saved room snapshot into a wall panel BOM
//!
//! Usage:
//!   floorplan-bom <snapshot.json> --scale 0.05 [--story-height 2.8] [--single-apartment]

use anyhow::{bail, Context, Result};
use clap::Parser;
use floorplan_digitizer::{bom_file_name, FloorplanSession, ScaleFactor};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "floorplan-bom")]
#[command(about = "Export wall panels and rooms from a saved floor plan snapshot")]
#[command(version)]
struct Args {
    /// Snapshot file: JSON array of {points, roomType}
    #[arg(required = true)]
    snapshot: PathBuf,

    /// Real-world units per drawing pixel
    #[arg(long)]
    scale: f64,

    /// Panel height in real-world units (default 3)
    #[arg(long, value_name = "HEIGHT")]
    story_height: Option<String>,

    /// Group every room into Apartment 1
    #[arg(long)]
    single_apartment: bool,

    /// Output path (default: <snapshot>_bom.json next to the snapshot)
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log every step
    #[arg(long, short)]
    verbose: bool,
}

fn default_output(snapshot: &Path) -> PathBuf {
    let name = bom_file_name(snapshot.file_name().and_then(|n| n.to_str()));
    snapshot.with_file_name(name)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let json = fs::read_to_string(&args.snapshot)
        .with_context(|| format!("reading {}", args.snapshot.display()))?;

    let mut session = FloorplanSession::default();
    let restored = session.restore_snapshot_json(&json)?;
    if restored == 0 {
        bail!("{} contains no closed rooms", args.snapshot.display());
    }

    session.set_scale(ScaleFactor::new(args.scale)?)?;
    if let Some(input) = &args.story_height {
        let height = session.set_story_height(input);
        if height.defaulted {
            eprintln!("Invalid story height {:?}, using {}", input, height.value);
        }
    }

    if args.single_apartment {
        session.begin_apartment_selection()?;
        for room in session.rooms() {
            session.select_room(room.id, true)?;
        }
        let apartment = session.group_selected()?;
        if !apartment.boundary.status.is_closed() {
            eprintln!(
                "Warning: {} outline is {:?}",
                apartment.id, apartment.boundary.status
            );
        }
    }

    println!("Rooms: {}", restored);
    for summary in session.room_summaries() {
        println!(
            "  {:<8} {:<12} {:>3} walls  perimeter {:>8.2}  area {:>8.2}",
            summary.id.to_string(),
            summary.room_type.as_str(),
            summary.segment_lengths.len(),
            summary.perimeter,
            summary.area
        );
    }
    for apartment in session.apartment_summaries() {
        println!(
            "  {}: {} (area {:.2})",
            apartment.label, apartment.room_types, apartment.area
        );
    }

    let document = session.export_bom()?;
    let output = args.output.unwrap_or_else(|| default_output(&args.snapshot));
    fs::write(&output, document.to_pretty_json()?)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Wrote {} panels to {}",
        document.panels.max_key,
        output.display()
    );
    Ok(())
}
