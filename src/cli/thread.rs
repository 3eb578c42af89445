use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::core::{FlowerId, GenomeGraph};
use crate::matching::DEFAULT_MAX_EXACT_NODES;
use crate::threading::{
    thread_hierarchy, SolverKind, ThreadReport, ThreadingConfig, DEFAULT_REFERENCE_HEADER,
};
use crate::utils::validation::{compute_thread_signature, validate_event_header};

#[derive(Args)]
pub struct ThreadArgs {
    /// Graph snapshot (JSON; gzip-compressed when the name ends in .gz)
    #[arg(required = true)]
    pub snapshot: PathBuf,

    /// Header of the reference event threaded through every flower
    #[arg(long, default_value = DEFAULT_REFERENCE_HEADER)]
    pub reference_header: String,

    /// Matching strategy
    #[arg(long, value_enum, default_value = "greedy")]
    pub solver: SolverKind,

    /// Largest number of free ends the exact solver accepts per flower
    #[arg(long, default_value_t = DEFAULT_MAX_EXACT_NODES)]
    pub max_exact_nodes: usize,

    /// Write the threaded graph snapshot to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct FlowerThread<'a> {
    #[serde(flatten)]
    report: &'a ThreadReport,
    signature: String,
}

#[derive(Serialize)]
struct ThreadSummary<'a> {
    config: &'a ThreadingConfig,
    flowers: Vec<FlowerThread<'a>>,
}

pub fn run(args: ThreadArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    validate_event_header(&args.reference_header).map_err(anyhow::Error::msg)?;

    let mut graph = GenomeGraph::load(&args.snapshot)
        .with_context(|| format!("Failed to load {}", args.snapshot.display()))?;

    let roots: Vec<FlowerId> = graph
        .flower_ids()
        .filter(|&f| graph.parent_group(f).is_none())
        .collect();
    if roots.is_empty() {
        anyhow::bail!("Snapshot {} contains no root flower", args.snapshot.display());
    }

    if verbose {
        eprintln!(
            "Loaded {} flowers ({} roots) from {}",
            graph.flower_count(),
            roots.len(),
            args.snapshot.display()
        );
    }

    let config = ThreadingConfig {
        reference_header: args.reference_header,
        solver: args.solver,
        max_exact_nodes: args.max_exact_nodes,
    };

    let mut reports = Vec::new();
    for root in roots {
        reports.extend(thread_hierarchy(&mut graph, root, &config)?);
    }

    if let Some(output) = &args.output {
        graph
            .save(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        if verbose {
            eprintln!("Wrote threaded snapshot to {}", output.display());
        }
    }

    let flowers: Vec<FlowerThread> = reports
        .iter()
        .map(|report| FlowerThread {
            report,
            signature: compute_thread_signature(&graph, report.flower, report.reference_event),
        })
        .collect();

    match format {
        OutputFormat::Text => print_text(&flowers, &config),
        OutputFormat::Json => {
            let summary = ThreadSummary {
                config: &config,
                flowers,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Tsv => {
            println!("flower\tparent\tnodes\tchain_edges\tstub_edges\tadjacency_edges\tadjacency_votes\timported_ends\tlink_breaking_blocks\tbridge_blocks\tlink_edges\tadjacencies\tsignature");
            for f in &flowers {
                let r = f.report;
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    r.flower.index(),
                    r.parent.map_or_else(|| "-".to_string(), |p| p.index().to_string()),
                    r.nodes,
                    r.chain_edges,
                    r.stub_edges,
                    r.adjacency_edges,
                    r.adjacency_votes,
                    r.imported_ends,
                    r.link_breaking_blocks,
                    r.bridge_blocks,
                    r.link_edges,
                    r.adjacencies,
                    f.signature
                );
            }
        }
    }

    Ok(())
}

fn print_text(flowers: &[FlowerThread], config: &ThreadingConfig) {
    println!(
        "Threaded reference '{}' through {} flowers ({:?} solver)\n",
        config.reference_header,
        flowers.len(),
        config.solver
    );
    println!(
        "{:<12} {:>6} {:>6} {:>6} {:>6} {:>8} {:>8} {:>8}  Signature",
        "Flower", "Nodes", "Chain", "Stub", "Votes", "Imported", "Bridges", "Adjacent"
    );
    println!("{}", "-".repeat(100));
    for f in flowers {
        let r = f.report;
        println!(
            "{:<12} {:>6} {:>6} {:>6} {:>6} {:>8} {:>8} {:>8}  {}",
            r.flower.to_string(),
            r.nodes,
            r.chain_edges,
            r.stub_edges,
            r.adjacency_votes,
            r.imported_ends,
            r.bridge_blocks + r.link_breaking_blocks,
            r.adjacencies,
            f.signature
        );
    }
}
