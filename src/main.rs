//! Binary entry point for the `lz4stream` command-line tool.
//!
//! Compresses a file (or stdin) into a raw LZ4 block stream via
//! [`StreamEncoder`], reporting byte counts and the compression ratio on
//! stderr.  The output is a single headerless LZ4 block; a decoder needs the
//! original length to reconstruct the input.

use std::cell::Cell;
use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use lz4stream::{StreamEncoder, StreamingXxh32};

/// Extension appended to the input filename when no output is given.
const STREAM_EXTENSION: &str = ".lz4b";

/// Chunk size for the read loop.
const READ_CHUNK: usize = 64 * 1024;

#[derive(Parser)]
#[command(name = "lz4stream", version, about = "Streaming LZ4 block compressor")]
struct Args {
    /// Input file; reads stdin when omitted.
    input: Option<PathBuf>,

    /// Output file; defaults to `<input>.lz4b`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write compressed output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Print the XXH32 checksum of the uncompressed input on stderr.
    #[arg(long)]
    checksum: bool,

    /// Suppress the summary line.
    #[arg(short, long)]
    quiet: bool,
}

/// Pass-through writer counting the bytes it forwards, so the total is still
/// observable after the encoder tears the sink down.
struct CountingWriter<W: Write> {
    inner: W,
    written: Rc<Cell<u64>>,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written.set(self.written.get() + n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn open_input(args: &Args) -> Result<Box<dyn Read>> {
    match &args.input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => {
            if io::stdin().is_terminal() {
                bail!("refusing to read from a console; pipe data in or name a file");
            }
            Ok(Box::new(io::stdin().lock()))
        }
    }
}

fn open_output(args: &Args) -> Result<Box<dyn Write>> {
    if args.stdout {
        if io::stdout().is_terminal() {
            bail!("refusing to write compressed data to a console without redirection");
        }
        return Ok(Box::new(io::stdout().lock()));
    }
    let path = match (&args.output, &args.input) {
        (Some(out), _) => out.clone(),
        (None, Some(input)) => {
            let mut name = input.clone().into_os_string();
            name.push(STREAM_EXTENSION);
            PathBuf::from(name)
        }
        (None, None) => bail!("reading stdin requires -o or -c to say where output goes"),
    };
    let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(Box::new(file))
}

fn run(args: &Args) -> Result<()> {
    let mut reader = open_input(args)?;
    let written = Rc::new(Cell::new(0u64));
    let sink = CountingWriter {
        inner: open_output(args)?,
        written: Rc::clone(&written),
    };

    let mut encoder = StreamEncoder::new(sink);
    let mut hasher = args.checksum.then(|| StreamingXxh32::new(0));
    let mut buf = vec![0u8; READ_CHUNK];
    let mut bytes_read: u64 = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("read failed"),
        };
        if let Some(hasher) = hasher.as_mut() {
            // The state stays live until the summary; update cannot fail here.
            let _ = hasher.update(&buf[..n]);
        }
        encoder.write(&buf[..n]).context("compression failed")?;
        bytes_read += n as u64;
    }

    encoder.close().context("failed to finalize stream")?;

    if !args.quiet {
        let bytes_written = written.get();
        let ratio = if bytes_read == 0 {
            100.0
        } else {
            (bytes_written as f64) / (bytes_read as f64) * 100.0
        };
        eprintln!(
            "Compressed {} bytes into {} bytes ==> {:.2}%",
            bytes_read, bytes_written, ratio
        );
    }
    if let Some(mut hasher) = hasher {
        if let Ok(value) = hasher.value() {
            eprintln!("XXH32 of input: 0x{:08X}", value);
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("lz4stream: {:#}", e);
        std::process::exit(1);
    }
}
