//! UCI front end: a line-oriented loop over stdin driving the engine.
//!
//! Searches run on their own thread; `bestmove` is printed by a waiter
//! thread so the loop keeps reading and `stop` stays responsive.

use crate::engine::{Engine, Limits};
use log::warn;
use std::io::{self, BufRead};
use std::time::Duration;

pub struct UciSession {
    engine: Engine,
}

impl Default for UciSession {
    fn default() -> Self {
        UciSession::new(Engine::default())
    }
}

impl UciSession {
    pub fn new(mut engine: Engine) -> UciSession {
        engine.set_reporting(true);
        UciSession { engine }
    }

    fn cmd_uci(&self) {
        println!("id name Marlin");
        println!("id author Marlin developers");
        println!("option name Threads type spin default 1 min 1 max 512");
        println!("option name Hash type spin default 16 min 1 max 16384");
        println!("uciok");
    }

    fn cmd_isready(&self) {
        println!("readyok");
    }

    fn cmd_ucinewgame(&mut self) {
        if let Err(e) = self.engine.new_game() {
            warn!("ucinewgame: {e}");
        }
    }

    fn cmd_setoption(&mut self, args: &str) {
        // setoption name <id> value <x>
        let mut tokens = args.split_whitespace();
        if tokens.next() != Some("name") {
            return;
        }
        let name: Vec<&str> = tokens.by_ref().take_while(|&t| t != "value").collect();
        let value = tokens.next();
        match (name.join(" ").as_str(), value) {
            ("Hash", Some(v)) => {
                if let Ok(mb) = v.parse::<usize>() {
                    if let Err(e) = self.engine.set_hash_mb(mb) {
                        warn!("setoption Hash: {e}");
                    }
                }
            }
            ("Threads", Some(v)) => {
                if let Ok(n) = v.parse::<usize>() {
                    self.engine.set_threads(n);
                }
            }
            (other, _) => warn!("unknown option '{other}'"),
        }
    }

    fn cmd_position(&mut self, args: &str) {
        let mut tokens = args.split_whitespace().peekable();
        let fen: Option<String> = match tokens.next() {
            Some("startpos") => None,
            Some("fen") => {
                let fields: Vec<&str> = tokens.by_ref().take_while(|&t| t != "moves").collect();
                // Re-enter move parsing below on the shared path.
                let moves: Vec<String> = tokens.map(str::to_string).collect();
                if let Err(e) = self.engine.set_position(Some(&fields.join(" ")), &moves) {
                    warn!("position: {e}");
                }
                return;
            }
            _ => return,
        };
        let moves: Vec<String> = match tokens.next() {
            Some("moves") => tokens.map(str::to_string).collect(),
            _ => Vec::new(),
        };
        if let Err(e) = self.engine.set_position(fen.as_deref(), &moves) {
            warn!("position: {e}");
        }
    }

    fn cmd_go(&mut self, args: &str) {
        let mut limits = Limits::default();
        let mut tokens = args.split_whitespace();
        let mut saw_any = false;
        fn ms(t: Option<&str>) -> Option<Duration> {
            t.and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
        }
        while let Some(tok) = tokens.next() {
            match tok {
                "depth" => limits.depth = tokens.next().and_then(|s| s.parse().ok()),
                "nodes" => limits.nodes = tokens.next().and_then(|s| s.parse().ok()),
                "movetime" => limits.movetime = ms(tokens.next()),
                "wtime" => limits.wtime = ms(tokens.next()),
                "btime" => limits.btime = ms(tokens.next()),
                "winc" => limits.winc = ms(tokens.next()),
                "binc" => limits.binc = ms(tokens.next()),
                "infinite" => limits.infinite = true,
                _ => continue,
            }
            saw_any = true;
        }
        if !saw_any {
            limits.infinite = true;
        }
        match self.engine.think(limits) {
            Ok(handle) => {
                std::thread::spawn(move || {
                    let result = handle.wait();
                    match result.best_move {
                        Some(mv) => println!("bestmove {mv}"),
                        None => println!("bestmove 0000"),
                    }
                });
            }
            Err(e) => warn!("go: {e}"),
        }
    }

    pub fn run_loop(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(s) => s.trim().to_string(),
                Err(_) => break,
            };
            if line.is_empty() {
                continue;
            }
            if !self.dispatch(&line) {
                break;
            }
        }
        self.engine.stop();
    }

    /// Handle one command line; false means quit.
    pub fn dispatch(&mut self, line: &str) -> bool {
        match line {
            "uci" => self.cmd_uci(),
            "isready" => self.cmd_isready(),
            "ucinewgame" => self.cmd_ucinewgame(),
            "stop" => self.engine.stop(),
            "quit" => return false,
            _ => {
                if let Some(rest) = line.strip_prefix("setoption ") {
                    self.cmd_setoption(rest);
                } else if let Some(rest) = line.strip_prefix("position ") {
                    self.cmd_position(rest);
                } else if let Some(rest) = line.strip_prefix("go") {
                    self.cmd_go(rest.trim_start());
                } else {
                    warn!("unknown command '{line}'");
                }
            }
        }
        true
    }
}
