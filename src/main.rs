use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use marlin::board::attacks;
use marlin::board::Board;
use marlin::engine::{Engine, Limits};
use marlin::perft;
use marlin::uci::UciSession;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "UCI chess engine", long_about = None)]
struct Args {
    /// Path to a quantized network file; without it the engine falls back
    /// to the material evaluation
    #[arg(long)]
    nnue: Option<PathBuf>,

    /// Search threads
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Transposition table size in MiB
    #[arg(long, default_value_t = 16)]
    hash: usize,

    /// Run a perft node count to the given depth and exit
    #[arg(long)]
    perft: Option<u32>,

    /// Position for --perft and --bench, FEN
    #[arg(long)]
    fen: Option<String>,

    /// Run a fixed-depth search benchmark and exit
    #[arg(long)]
    bench: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    attacks::init();

    let board = match &args.fen {
        Some(fen) => Board::from_fen(fen).with_context(|| format!("invalid fen '{fen}'"))?,
        None => Board::startpos(),
    };

    if let Some(depth) = args.perft {
        let start = Instant::now();
        let nodes = perft::perft_parallel(&board, depth);
        let elapsed = start.elapsed();
        println!(
            "perft({depth}) = {nodes} in {:.3}s ({:.1} Mnps)",
            elapsed.as_secs_f64(),
            nodes as f64 / elapsed.as_secs_f64().max(1e-9) / 1e6
        );
        return Ok(());
    }

    let mut engine = Engine::new(args.hash, args.threads);
    if let Some(path) = &args.nnue {
        engine
            .load_network(path)
            .with_context(|| format!("load network '{}'", path.display()))?;
    }

    if let Some(depth) = args.bench {
        engine.set_position(Some(&board.to_fen()), &[])?;
        let start = Instant::now();
        let result = engine
            .think(Limits { depth: Some(depth), ..Default::default() })?
            .wait();
        let elapsed = start.elapsed();
        println!(
            "bench depth {depth}: best {} score {} nodes {} in {:.3}s",
            result.best_move.map(|m| m.to_uci()).unwrap_or_else(|| "(none)".into()),
            result.score_cp,
            result.nodes,
            elapsed.as_secs_f64()
        );
        return Ok(());
    }

    info!("starting uci loop ({} threads, {} MiB hash)", args.threads, args.hash);
    UciSession::new(engine).run_loop();
    Ok(())
}
