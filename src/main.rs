// Small driver for the hex viewer core: dumps the first rows of a file and
// optionally searches it for an ASCII pattern.
//
//   RUST_LOG=ffx_hexview=trace ffx-hexview image.dd "MZ"

use std::process::ExitCode;
use std::time::{Duration, Instant};

use ffx_hexview::common::format_hex_rows;
use ffx_hexview::viewer::ViewerEvent;
use ffx_hexview::{HexViewerService, SearchKind, SearchOptions, TabKey, ViewerResult};

const PREVIEW_ROWS: usize = 16;

fn run(path: &str, pattern: Option<&str>) -> ViewerResult<()> {
    let mut service = HexViewerService::new();
    let tab = TabKey::from("cli");
    let tag = service.open_path(path, tab.clone())?;
    println!("{} (session {})\n", path, tag.session_id);

    let len = (PREVIEW_ROWS * 16) as u64;
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut bytes = service.request_range(&tab, 0, len)?;
    while bytes.iter().any(Option::is_none) && Instant::now() < deadline {
        for event in service.wait_events(Duration::from_millis(250)) {
            if let ViewerEvent::ChunkError { offset, message, .. } = event {
                eprintln!("Read failed at 0x{:X}: {}", offset, message);
            }
        }
        bytes = service.request_range(&tab, 0, len)?;
    }

    for row in format_hex_rows(0, &bytes) {
        println!("{}  {:<49} |{}|", row.offset_label, row.hex, row.ascii);
    }

    if let Some(pattern) = pattern {
        let result = service.request_search(&tab, pattern, SearchKind::Ascii, &SearchOptions::default())?;
        println!("\n{} hit(s) for {:?}{}", result.indices.len(), pattern, if result.truncated { " (truncated)" } else { "" });
        for index in result.indices.iter().take(20) {
            println!("  0x{:08X}", index);
        }
    }

    let stats = service.stats(&tab)?;
    match serde_json::to_string(&stats) {
        Ok(json) => println!("\n{}", json),
        Err(e) => eprintln!("Failed to serialize stats: {}", e),
    }
    service.close_file(&tab);
    Ok(())
}

fn main() -> ExitCode {
    ffx_hexview::logging::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: ffx-hexview <file> [ascii-pattern]");
        return ExitCode::from(2);
    };
    let pattern = args.next();

    match run(&path, pattern.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
