//! Command-line front end: inspect and render saved pipeline graphs.

use rasterflow::graph::serialization;
use rasterflow::graph::{NodeKind, PipelineGraph};
use rasterflow::RasterflowError;
use std::env;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("kinds") => {
            print_kinds();
            Ok(())
        }
        Some("show") if args.len() == 3 => show(&args[2]),
        Some("render") if args.len() == 4 => render(&args[2], &args[3]),
        Some("help") | None => {
            print_usage();
            Ok(())
        }
        _ => {
            print_usage();
            process::exit(2);
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("rasterflow - typed image pipeline graphs");
    println!();
    println!("usage:");
    println!("  rasterflow kinds                      list node kinds and their slots");
    println!("  rasterflow show <graph.{ext}>             print a saved graph", ext = serialization::GRAPH_EXTENSION);
    println!("  rasterflow render <graph.{ext}> <out>     evaluate the sink and write the image", ext = serialization::GRAPH_EXTENSION);
    println!("  rasterflow help                       show this message");
}

fn print_kinds() {
    for kind in NodeKind::ALL {
        let slots: Vec<String> = kind
            .slots()
            .iter()
            .map(|(name, expected)| format!("{name}: {expected}"))
            .collect();
        println!(
            "{:14} -> {:6} [{}]",
            kind.display_name(),
            kind.output_kind().display_name(),
            slots.join(", ")
        );
    }
}

fn show(path: &str) -> Result<(), RasterflowError> {
    let graph = serialization::load_from_path(path).map_err(RasterflowError::Persist)?;
    println!("{} nodes, {} links", graph.node_count(), graph.link_count());
    for node in graph.nodes() {
        let state = if node.is_ready() { "ready" } else { "not ready" };
        let data = node.raw().unwrap_or("-");
        println!("  node {} {:14} {:9} data={data}", node.id(), node.kind(), state);
    }
    for link in graph.links() {
        println!(
            "  link {} {} -> {}:{}",
            link.id, link.source, link.target, link.target_slot
        );
    }
    Ok(())
}

fn render(graph_path: &str, out_path: &str) -> Result<(), RasterflowError> {
    let graph: PipelineGraph =
        serialization::load_from_path(graph_path).map_err(RasterflowError::Persist)?;
    let sinks = graph.sinks();
    if sinks.is_empty() {
        eprintln!("graph has no sink node");
        process::exit(1);
    }
    for (index, &sink) in sinks.iter().enumerate() {
        if !graph.is_ready(sink)? {
            eprintln!("sink {sink} is not ready, skipping");
            continue;
        }
        let path = numbered_path(out_path, index);
        graph.export_image(sink, &path)?;
        println!("wrote {path}");
    }
    Ok(())
}

/// `out.png`, then `out-1.png`, `out-2.png` for further sinks.
fn numbered_path(out_path: &str, index: usize) -> String {
    if index == 0 {
        return out_path.to_string();
    }
    match out_path.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{index}.{ext}"),
        None => format!("{out_path}-{index}"),
    }
}
