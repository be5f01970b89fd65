use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use human_bytes::human_bytes;
use lzstream::{Decoder, Encoder, EncoderOptions};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Error, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::Instant;

const EXTENSION: &str = "lzma";

#[derive(Parser)]
struct Config {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a file
    Compress(CompressCfg),
    /// Decompress a file
    Decompress(DecompressCfg),
}

#[derive(Args)]
struct CompressCfg {
    /// Input file path
    #[arg()]
    path: PathBuf,

    /// Compression level, 0 (fast) to 9 (best)
    #[arg(long, short = 'c', default_value = "6")]
    level: u32,

    /// Compressed size in bytes at which a member is closed and a new one started
    #[arg(long)]
    member_size: Option<u64>,

    /// Size of a read chunk in bytes
    #[arg(long, short = 'b', default_value = "65536")]
    chunk_size: usize,
}

#[derive(Args)]
struct DecompressCfg {
    /// Input file path
    #[arg()]
    path: PathBuf,

    /// Release decoded output only in multiples of this many bytes
    #[arg(long, short = 'w', default_value = "1")]
    word_size: usize,

    /// Size of a read chunk in bytes
    #[arg(long, short = 'b', default_value = "65536")]
    chunk_size: usize,
}

fn main() {
    let cmd = Config::parse();
    if let Err(e) = run(cmd) {
        eprintln!("error: {}", e);
        exit(1);
    }
}

fn run(cmd: Config) -> anyhow::Result<()> {
    match cmd.command {
        Command::Compress(cfg) => run_compress_cmd(cfg),
        Command::Decompress(cfg) => run_decompress_cmd(cfg),
    }
}

fn run_compress_cmd(cfg: CompressCfg) -> anyhow::Result<()> {
    let mut options = EncoderOptions::level(cfg.level)?;
    if let Some(member_size) = cfg.member_size {
        options = options.member_size(member_size);
    }
    let mut encoder = Encoder::with_options(options)?;
    let mut input = open_input(&cfg.path)?;
    let mut output = open_output(&output_path(&cfg.path, true)?)?;

    let start_time = Instant::now();
    let mut chunk = vec![0u8; cfg.chunk_size];
    let mut read_total = 0u64;
    let mut written_total = 0u64;
    loop {
        let count = input.read(&mut chunk)?;
        if count == 0 {
            break;
        }
        let compressed = encoder.compress(&chunk[..count])?;
        output.write_all(&compressed)?;
        read_total += count as u64;
        written_total += compressed.len() as u64;
    }
    let tail = encoder.finish()?;
    output.write_all(&tail)?;
    output.flush()?;
    written_total += tail.len() as u64;

    print_summary(read_total, written_total, read_total, start_time);
    Ok(())
}

fn run_decompress_cmd(cfg: DecompressCfg) -> anyhow::Result<()> {
    let mut decoder = Decoder::with_word_size(cfg.word_size)?;
    let mut input = open_input(&cfg.path)?;
    let mut output = open_output(&output_path(&cfg.path, false)?)?;

    let start_time = Instant::now();
    let mut chunk = vec![0u8; cfg.chunk_size];
    let mut read_total = 0u64;
    let mut written_total = 0u64;
    loop {
        let count = input.read(&mut chunk)?;
        if count == 0 {
            break;
        }
        let decoded = decoder.decompress(&chunk[..count])?;
        output.write_all(&decoded)?;
        read_total += count as u64;
        written_total += decoded.len() as u64;
    }
    let (aligned, remainder) = decoder.finish()?;
    output.write_all(&aligned)?;
    output.flush()?;
    written_total += aligned.len() as u64;
    if !remainder.is_empty() {
        bail!(
            "the total number of bytes is not a multiple of {} ({} remaining)",
            cfg.word_size,
            remainder.len()
        );
    }

    print_summary(read_total, written_total, written_total, start_time);
    Ok(())
}

fn print_summary(read: u64, written: u64, raw: u64, start_time: Instant) {
    let elapsed = start_time.elapsed();
    eprintln!(
        "{} => {} ({:.1} %), {:.1} MB/s",
        human_bytes(read as f64),
        human_bytes(written as f64),
        written as f64 / read as f64 * 100.0,
        raw as f64 / elapsed.as_secs_f64() / 1_000_000.0
    );
}

fn output_path(input_path: &Path, compress: bool) -> anyhow::Result<PathBuf> {
    if compress {
        let new_extension = match input_path.extension() {
            None => EXTENSION.to_owned(),
            Some(ext) => format!("{}.{}", ext.to_string_lossy(), EXTENSION),
        };
        Ok(input_path.with_extension(new_extension))
    } else {
        if input_path.extension() != Some(OsStr::new(EXTENSION)) {
            bail!(
                "cannot determine the output name: {} does not end in .{}",
                input_path.display(),
                EXTENSION
            );
        }
        Ok(input_path.with_extension(""))
    }
}

fn open_input(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|e| {
        Error::new(
            e.kind(),
            format!("Could not open file {}: {}", path.display(), e),
        )
    })
}

fn open_output(path: &Path) -> Result<BufWriter<File>, Error> {
    let output = File::create(path).map_err(|e| {
        Error::new(
            e.kind(),
            format!("Could not create file {}: {}", path.display(), e),
        )
    })?;
    Ok(BufWriter::new(output))
}
