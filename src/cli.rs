// Command-line front end for building and inspecting front-coded lists.
//
// Entries are newline-delimited: `build` turns each input line (without its
// trailing '\n') into one entry; `get` and `dump` print one entry per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::codec::encoder::{DEFAULT_RATIO, FrontCodedOptions};
use crate::list::FrontCodedList;
use crate::storage::width::{Big, IndexWidth, Standard};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Segment size parsing
// ---------------------------------------------------------------------------

/// Parse a segment size such as `4096`, `64K`, `128MiB` or `1g`.
/// Units are binary; zero is rejected.
fn parse_segment_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("segment size '{s}' must start with a number"));
    }
    let shift = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 0,
        "k" | "kib" => 10,
        "m" | "mib" => 20,
        "g" | "gib" => 30,
        other => return Err(format!("unknown size unit '{other}' (use K, M or G)")),
    };
    let value: u64 = digits
        .parse()
        .map_err(|e| format!("segment size '{s}': {e}"))?;
    if value == 0 {
        return Err("segment size must be non-zero".into());
    }
    value
        .checked_mul(1u64 << shift)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .ok_or_else(|| format!("segment size '{s}' is too large for this platform"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Build and inspect front-coded string lists.
#[derive(Parser, Debug)]
#[command(
    name = "frontcode",
    version,
    about = "Front-coded list builder and inspector",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Build a list from newline-delimited entries.
    Build(BuildArgs),
    /// Print entries by index.
    Get(GetArgs),
    /// Print entries in order, starting anywhere, in either direction.
    Dump(DumpArgs),
    /// Print size and layout figures.
    Stats(ListArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Persisted list file.
    #[arg(value_hint = ValueHint::FilePath)]
    list: PathBuf,

    /// The list uses the big (64-bit) layout.
    #[arg(long)]
    big: bool,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Anchor interval: every RATIO-th entry is stored verbatim.
    #[arg(long, short = 'r', value_parser = clap::value_parser!(u32).range(1..), default_value_t = DEFAULT_RATIO)]
    ratio: u32,

    /// Use the big (64-bit) layout.
    #[arg(long)]
    big: bool,

    /// Storage segment size in bytes (K/M/G suffixes accepted).
    #[arg(long = "segment-size", value_parser = parse_segment_size)]
    segment_size: Option<usize>,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GetArgs {
    #[command(flatten)]
    list: ListArgs,

    /// Entry indices to print.
    #[arg(required = true)]
    indices: Vec<u64>,

    /// Print entries as hex.
    #[arg(long)]
    hex: bool,
}

#[derive(Args, Debug)]
struct DumpArgs {
    #[command(flatten)]
    list: ListArgs,

    /// Start position (0..=len). Defaults to the front, or the end with --reverse.
    #[arg(long)]
    from: Option<u64>,

    /// Walk backwards.
    #[arg(long)]
    reverse: bool,

    /// Stop after this many entries.
    #[arg(long)]
    limit: Option<u64>,

    /// Print entries as hex.
    #[arg(long)]
    hex: bool,
}

struct Options {
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
}

fn resolve_options(cli: &Cli) -> Options {
    Options {
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("frontcode".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(&cli);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn write_entry<W: Write>(out: &mut W, entry: &[u8], hex: bool) -> io::Result<()> {
    if hex {
        writeln!(out, "{}", to_hex(entry))
    } else {
        out.write_all(entry)?;
        out.write_all(b"\n")
    }
}

fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(p) => Box::new(BufReader::with_capacity(BUF_SIZE, File::open(p)?)),
        None => Box::new(BufReader::with_capacity(BUF_SIZE, io::stdin())),
    })
}

fn check_output(path: Option<&Path>, force: bool) -> io::Result<()> {
    match path {
        Some(p) if p.exists() && !force => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists (use --force to overwrite)", p.display()),
        )),
        _ => Ok(()),
    }
}

/// Create (truncating) the output. Only called once there is something to
/// write, so a failed build never clobbers an existing file.
fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::with_capacity(BUF_SIZE, File::create(p)?)),
        None => Box::new(BufWriter::with_capacity(BUF_SIZE, io::stdout())),
    })
}

fn load<W: IndexWidth>(path: &Path) -> Result<FrontCodedList<u8, W>, i32> {
    FrontCodedList::<u8, W>::read_file(path).map_err(|e| {
        eprintln!("frontcode: cannot load {}: {e}", path.display());
        1
    })
}

// ---------------------------------------------------------------------------
// Build command
// ---------------------------------------------------------------------------

fn cmd_build<W: IndexWidth>(args: &BuildArgs, opts: &Options) -> i32 {
    let mut list_opts = FrontCodedOptions::with_ratio(args.ratio);
    if let Some(size) = args.segment_size {
        list_opts = list_opts.segment_size(size);
    }

    if let Err(e) = check_output(args.output.as_deref(), opts.force) {
        eprintln!("frontcode: output: {e}");
        return 1;
    }
    let input = match open_input(args.input.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("frontcode: input: {e}");
            return 1;
        }
    };

    let list = match FrontCodedList::<u8, W>::try_build(input.split(b'\n'), &list_opts) {
        Ok(list) => list,
        Err(e) => {
            eprintln!("frontcode: build error: {e}");
            return 1;
        }
    };

    let mut writer = match open_output(args.output.as_deref()) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("frontcode: output: {e}");
            return 1;
        }
    };
    if let Err(e) = list.write_to(&mut writer).and_then(|()| Ok(writer.flush()?)) {
        eprintln!("frontcode: write error: {e}");
        return 1;
    }

    let stats = list.stats();
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "frontcode: build: {} entries, ratio {}, {} anchors, {} stream bytes",
            stats.entries, stats.ratio, stats.anchors, stats.stream_bytes
        );
    }
    if opts.json_output {
        let json = serde_json::json!({
            "command": "build",
            "width": stats.width,
            "entries": stats.entries,
            "ratio": stats.ratio,
            "persisted_bytes": stats.persisted_bytes,
        });
        eprintln!("{json:#}");
    }

    0
}

// ---------------------------------------------------------------------------
// Get command
// ---------------------------------------------------------------------------

fn cmd_get<W: IndexWidth>(args: &GetArgs) -> i32 {
    let list = match load::<W>(&args.list.list) {
        Ok(list) => list,
        Err(code) => return code,
    };
    let mut out = BufWriter::with_capacity(BUF_SIZE, io::stdout().lock());
    let mut entry = Vec::new();
    for &index in &args.indices {
        if let Err(e) = list.get_into(index, &mut entry) {
            eprintln!("frontcode: get {index}: {e}");
            return 1;
        }
        if let Err(e) = write_entry(&mut out, &entry, args.hex) {
            eprintln!("frontcode: write error: {e}");
            return 1;
        }
    }
    if let Err(e) = out.flush() {
        eprintln!("frontcode: write error: {e}");
        return 1;
    }
    0
}

// ---------------------------------------------------------------------------
// Dump command
// ---------------------------------------------------------------------------

fn cmd_dump<W: IndexWidth>(args: &DumpArgs, opts: &Options) -> i32 {
    let list = match load::<W>(&args.list.list) {
        Ok(list) => list,
        Err(code) => return code,
    };
    let from = args
        .from
        .unwrap_or(if args.reverse { list.len() } else { 0 });
    let mut cursor = match list.cursor_at(from) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("frontcode: dump: {e}");
            return 1;
        }
    };

    let limit = args.limit.unwrap_or(u64::MAX);
    let mut out = BufWriter::with_capacity(BUF_SIZE, io::stdout().lock());
    let mut printed = 0u64;
    while printed < limit {
        let more = if args.reverse {
            cursor.has_previous()
        } else {
            cursor.has_next()
        };
        if !more {
            break;
        }
        let entry = if args.reverse {
            cursor.previous_entry()
        } else {
            cursor.next_entry()
        };
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                eprintln!("frontcode: dump: {e}");
                return 1;
            }
        };
        if let Err(e) = write_entry(&mut out, entry, args.hex) {
            eprintln!("frontcode: write error: {e}");
            return 1;
        }
        printed += 1;
    }
    if let Err(e) = out.flush() {
        eprintln!("frontcode: write error: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!("frontcode: dump: {printed} entries from position {from}");
    }
    0
}

// ---------------------------------------------------------------------------
// Stats command
// ---------------------------------------------------------------------------

fn cmd_stats<W: IndexWidth>(args: &ListArgs, opts: &Options) -> i32 {
    let list = match load::<W>(&args.list) {
        Ok(list) => list,
        Err(code) => return code,
    };
    let stats = list.stats();

    // Raw size needs a full decode; a cursor keeps it to one pass.
    let mut raw_bytes = 0u64;
    let mut cursor = list.cursor();
    while cursor.has_next() {
        match cursor.next_entry() {
            Ok(entry) => raw_bytes += entry.len() as u64,
            Err(e) => {
                eprintln!("frontcode: stats: {e}");
                return 1;
            }
        }
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "stats",
            "width": stats.width,
            "entries": stats.entries,
            "ratio": stats.ratio,
            "anchors": stats.anchors,
            "stream_bytes": stats.stream_bytes,
            "raw_bytes": raw_bytes,
            "segments": stats.segments,
            "persisted_bytes": stats.persisted_bytes,
        });
        println!("{json:#}");
    } else if !opts.quiet {
        println!("width:           {}", stats.width);
        println!("entries:         {}", stats.entries);
        println!("ratio:           {}", stats.ratio);
        println!("anchors:         {}", stats.anchors);
        println!("raw bytes:       {raw_bytes}");
        println!("stream bytes:    {}", stats.stream_bytes);
        println!("persisted bytes: {}", stats.persisted_bytes);
        println!("segments:        {}", stats.segments);
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn dispatch(cli: Cli) -> i32 {
    let opts = resolve_options(&cli);
    match &cli.command {
        Cmd::Build(args) if args.big => cmd_build::<Big>(args, &opts),
        Cmd::Build(args) => cmd_build::<Standard>(args, &opts),
        Cmd::Get(args) if args.list.big => cmd_get::<Big>(args),
        Cmd::Get(args) => cmd_get::<Standard>(args),
        Cmd::Dump(args) if args.list.big => cmd_dump::<Big>(args, &opts),
        Cmd::Dump(args) => cmd_dump::<Standard>(args, &opts),
        Cmd::Stats(args) if args.big => cmd_stats::<Big>(args, &opts),
        Cmd::Stats(args) => cmd_stats::<Standard>(args, &opts),
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -v raises the default level.
    let default_filter = match cli.verbose.min(2) {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    process::exit(dispatch(cli));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
