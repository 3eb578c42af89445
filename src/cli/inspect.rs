use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::core::{FlowerId, GenomeGraph};

#[derive(Args)]
pub struct InspectArgs {
    /// Graph snapshot (JSON; gzip-compressed when the name ends in .gz)
    #[arg(required = true)]
    pub snapshot: PathBuf,
}

/// Shape of one flower
#[derive(Debug, Serialize)]
pub struct FlowerSummary {
    pub flower: FlowerId,
    pub parent: Option<FlowerId>,
    pub depth: usize,
    pub ends: usize,
    pub attached_stubs: usize,
    pub free_stubs: usize,
    pub block_ends: usize,
    pub ungrouped_ends: usize,
    pub tangle_groups: usize,
    pub link_groups: usize,
    pub nested_flowers: usize,
    pub blocks: usize,
    pub chains: usize,
    pub events: usize,
}

impl FlowerSummary {
    #[must_use]
    pub fn new(graph: &GenomeGraph, flower: FlowerId) -> Self {
        let record = graph.flower(flower);
        let ends = record.ends.iter().map(|&e| graph.end(e));
        let groups = record.groups.iter().map(|&g| graph.group(g));

        let mut depth = 0;
        let mut current = flower;
        while let Some(parent) = graph.parent_flower(current) {
            depth += 1;
            current = parent;
        }

        Self {
            flower,
            parent: graph.parent_flower(flower),
            depth,
            ends: record.ends.len(),
            attached_stubs: ends.clone().filter(|e| e.is_attached_stub()).count(),
            free_stubs: ends
                .clone()
                .filter(|e| e.is_stub_end() && !e.is_attached_stub())
                .count(),
            block_ends: ends.clone().filter(|e| e.is_block_end()).count(),
            ungrouped_ends: ends.filter(|e| e.group.is_none()).count(),
            tangle_groups: groups.clone().filter(|g| g.is_tangle()).count(),
            link_groups: groups.clone().filter(|g| g.is_link()).count(),
            nested_flowers: groups.filter(|g| g.nested.is_some()).count(),
            blocks: record.blocks.len(),
            chains: record.chains.len(),
            events: graph.event_tree(record.event_tree).events.len(),
        }
    }
}

pub fn run(args: InspectArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let graph = GenomeGraph::load(&args.snapshot)
        .with_context(|| format!("Failed to load {}", args.snapshot.display()))?;

    if verbose {
        eprintln!(
            "Loaded {} flowers from {}",
            graph.flower_count(),
            args.snapshot.display()
        );
    }

    let summaries: Vec<FlowerSummary> = graph
        .flower_ids()
        .map(|f| FlowerSummary::new(&graph, f))
        .collect();

    match format {
        OutputFormat::Text => {
            println!("Graph snapshot ({} flowers)\n", summaries.len());
            println!(
                "{:<12} {:>5} {:>6} {:>8} {:>6} {:>7} {:>6} {:>6} {:>6}",
                "Flower", "Depth", "Ends", "Attached", "Tangle", "Link", "Blocks", "Chains", "Nested"
            );
            println!("{}", "-".repeat(76));
            for s in &summaries {
                println!(
                    "{:<12} {:>5} {:>6} {:>8} {:>6} {:>7} {:>6} {:>6} {:>6}",
                    s.flower.to_string(),
                    s.depth,
                    s.ends,
                    s.attached_stubs,
                    s.tangle_groups,
                    s.link_groups,
                    s.blocks,
                    s.chains,
                    s.nested_flowers
                );
                if s.attached_stubs % 2 != 0 {
                    println!("  warning: odd number of attached stub ends");
                }
                if s.ungrouped_ends > 0 {
                    println!("  warning: {} ends have no group", s.ungrouped_ends);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputFormat::Tsv => {
            println!("flower\tparent\tdepth\tends\tattached_stubs\tfree_stubs\tblock_ends\tungrouped_ends\ttangle_groups\tlink_groups\tnested_flowers\tblocks\tchains\tevents");
            for s in &summaries {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    s.flower.index(),
                    s.parent.map_or_else(|| "-".to_string(), |p| p.index().to_string()),
                    s.depth,
                    s.ends,
                    s.attached_stubs,
                    s.free_stubs,
                    s.block_ends,
                    s.ungrouped_ends,
                    s.tangle_groups,
                    s.link_groups,
                    s.nested_flowers,
                    s.blocks,
                    s.chains,
                    s.events
                );
            }
        }
    }

    Ok(())
}
