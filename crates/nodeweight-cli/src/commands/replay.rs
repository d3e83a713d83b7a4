use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use nodeweight_cache::{EventHandler, NodeWeightCache, Recorder};
use nodeweight_core::{WatchEvent, WeightConfig};

/// Outcome of replaying an event stream.
#[derive(Debug, Default, Serialize)]
pub struct ReplayReport {
    /// Effective weight of every node left in the table.
    pub weights: BTreeMap<String, u32>,
    /// Events handed to the downstream handler.
    pub forwarded: usize,
    /// Lines that could not be decoded.
    pub skipped: usize,
}

/// Report rendering for `replay`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn replay(events: &str, format: OutputFormat, config: &WeightConfig) -> anyhow::Result<()> {
    let report = if events == "-" {
        replay_stream(io::stdin().lock(), config)?
    } else {
        let file = File::open(events).with_context(|| format!("opening {events}"))?;
        replay_stream(BufReader::new(file), config)?
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", format_report(&report)),
    }
    Ok(())
}

/// Feed every decodable line through a cache chained to a recorder.
pub fn replay_stream(reader: impl BufRead, config: &WeightConfig) -> anyhow::Result<ReplayReport> {
    let recorder = Arc::new(Recorder::new());
    let cache = NodeWeightCache::from_config(config).with_next(recorder.clone());
    let mut skipped = 0;

    // Split on raw bytes so a non-UTF-8 line is skipped like any other
    // undecodable line instead of ending the replay.
    for (index, raw) in reader.split(b'\n').enumerate() {
        let raw = raw?;
        let decoded = String::from_utf8(raw)
            .map_err(anyhow::Error::from)
            .and_then(|line| {
                if line.trim().is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(WatchEvent::from_json(&line)?))
                }
            });
        match decoded {
            Ok(Some(event)) => cache.handle(&event),
            Ok(None) => {}
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping undecodable event");
                skipped += 1;
            }
        }
    }

    let weights = cache
        .snapshot()
        .into_keys()
        .map(|node| {
            let weight = cache.weight_of_node(&node);
            (node, weight)
        })
        .collect();

    let report = ReplayReport {
        weights,
        forwarded: recorder.len(),
        skipped,
    };
    info!(
        nodes = report.weights.len(),
        forwarded = report.forwarded,
        skipped = report.skipped,
        "replay complete"
    );
    Ok(report)
}

fn format_report(report: &ReplayReport) -> String {
    let mut out = String::new();
    for (node, weight) in &report.weights {
        out.push_str(&format!("{node}\t{weight}\n"));
    }
    out.push_str(&format!(
        "# {} node(s), {} event(s) forwarded, {} skipped\n",
        report.weights.len(),
        report.forwarded,
        report.skipped
    ));
    out
}
