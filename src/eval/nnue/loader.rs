//! Binary weight-file reader. The format is a data contract with the
//! (external) training pipeline; every field is little-endian.
//!
//! Layout:
//!   magic: 8 bytes b"MRLNNUE1"
//!   u32 version
//!   u32 activation (0 = clipped ReLU, 1 = squared clipped ReLU)
//!   u32 input_dim (must be 768), u32 hidden_dim
//!   i32 qa, i32 qb, i32 scale
//!   i16 w1[input_dim * hidden_dim]   (feature-major: w1[f * hidden + j])
//!   i16 b1[hidden_dim]
//!   i8  w2[2 * hidden_dim]           (side-to-move half first)
//!   i32 b2

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const MAGIC: &[u8; 8] = b"MRLNNUE1";
pub const INPUT_DIM: usize = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    ClippedRelu,
    SquaredClippedRelu,
}

#[derive(Debug)]
pub struct NnueMeta {
    pub version: u32,
    pub activation: Activation,
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub qa: i32,
    pub qb: i32,
    pub scale: i32,
}

#[derive(Debug)]
pub struct QuantNnue {
    pub meta: NnueMeta,
    pub w1: Vec<i16>,
    pub b1: Vec<i16>,
    pub w2: Vec<i8>,
    pub b2: i32,
}

fn read_u32<R: Read>(r: &mut R, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).with_context(|| format!("read {what}"))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32<R: Read>(r: &mut R, what: &str) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).with_context(|| format!("read {what}"))?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i16s<R: Read>(r: &mut R, n: usize, what: &str) -> Result<Vec<i16>> {
    let mut buf = vec![0u8; n * 2];
    r.read_exact(&mut buf)
        .with_context(|| format!("read {n} i16s for {what}"))?;
    Ok(buf
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect())
}

fn read_i8s<R: Read>(r: &mut R, n: usize, what: &str) -> Result<Vec<i8>> {
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf)
        .with_context(|| format!("read {n} i8s for {what}"))?;
    Ok(buf.into_iter().map(|b| b as i8).collect())
}

impl QuantNnue {
    /// Load a weight file. Any truncation or header mismatch is a hard
    /// error; the engine must not search with a half-read network.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<QuantNnue> {
        let f = File::open(&path)
            .with_context(|| format!("open nnue file: {}", path.as_ref().display()))?;
        let mut r = BufReader::new(f);

        let mut magic = [0u8; 8];
        r.read_exact(&mut magic).context("read magic")?;
        if &magic != MAGIC {
            bail!("bad NNUE magic: {:?}", magic);
        }
        let version = read_u32(&mut r, "version")?;
        let activation = match read_u32(&mut r, "activation")? {
            0 => Activation::ClippedRelu,
            1 => Activation::SquaredClippedRelu,
            other => bail!("unknown NNUE activation id {other}"),
        };
        let input_dim = read_u32(&mut r, "input_dim")? as usize;
        if input_dim != INPUT_DIM {
            bail!("unsupported NNUE input_dim {input_dim}, expected {INPUT_DIM}");
        }
        let hidden_dim = read_u32(&mut r, "hidden_dim")? as usize;
        if hidden_dim == 0 || hidden_dim > 4096 {
            bail!("implausible NNUE hidden_dim {hidden_dim}");
        }
        let qa = read_i32(&mut r, "qa")?;
        let qb = read_i32(&mut r, "qb")?;
        let scale = read_i32(&mut r, "scale")?;
        if qa <= 0 || qb <= 0 || scale <= 0 {
            bail!("non-positive quantization constants (qa={qa}, qb={qb}, scale={scale})");
        }

        let w1 = read_i16s(&mut r, input_dim * hidden_dim, "feature weights")?;
        let b1 = read_i16s(&mut r, hidden_dim, "feature bias")?;
        let w2 = read_i8s(&mut r, 2 * hidden_dim, "output weights")?;
        let b2 = read_i32(&mut r, "output bias")?;

        Ok(QuantNnue {
            meta: NnueMeta { version, activation, input_dim, hidden_dim, qa, qb, scale },
            w1,
            b1,
            w2,
            b2,
        })
    }
}
