//! Command-line utility for exploring the message catalog and replaying
//! event traces through a bridge backed by the mock engine.

use anyhow::{anyhow, Context, Result};
use bridge::{Bridge, BridgeConfig, MsgGroup, MsgKind, RawEvent};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use mock_engine::MockEngine;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

mod trace;

/// Text rendering helpers used by the CLI commands.
mod render {
    use bridge::{BridgeVM, MsgKind, Payload, Stamp, Status};
    use std::fmt::Write;

    /// One catalog row per kind: tag, key, group, payload shape.
    pub fn catalog(kinds: impl IntoIterator<Item = MsgKind>) -> String {
        let mut out = String::new();
        for kind in kinds {
            writeln!(
                out,
                "{:<4} {:<22} {:<11} {:?}",
                kind.raw(),
                kind.key(),
                kind.group().label(),
                kind.shape()
            )
            .expect("write catalog row");
        }
        out
    }

    pub fn payload(value: &Payload) -> String {
        match value {
            Payload::Int(a) => format!("{a}"),
            Payload::Pair(a, b) => format!("{a},{b}"),
            Payload::Quad([a, b, c, d]) => format!("{a},{b},{c},{d}"),
        }
    }

    /// Line printed for each replayed event that reached a channel.
    pub fn event(seq: usize, kind: MsgKind, stamp: Stamp, value: Option<&Payload>) -> String {
        match value {
            Some(value) => format!("#{seq:<4} {kind} -> {stamp} [{}]\n", payload(value)),
            None => format!("#{seq:<4} {kind} -> {stamp}\n"),
        }
    }

    pub fn status(seq: usize, status: &Status) -> String {
        format!("#{seq:<4} status {}: {}\n", status.code, status.message)
    }

    /// End-of-replay table of fired channels, mirrors and counters.
    pub fn summary(vm: &BridgeVM) -> String {
        let mut out = String::new();
        writeln!(out, "Channels:").expect("write header");
        for channel in &vm.channels {
            write!(out, "  {:<22} {:>5}", channel.kind.key(), channel.count.get())
                .expect("write channel");
            if let Some(value) = &channel.value {
                write!(out, "  last={}", payload(value)).expect("write value");
            }
            out.push('\n');
        }
        writeln!(out, "Mirrors:").expect("write header");
        for mirror in &vm.mirrors {
            writeln!(
                out,
                "  {:<8} version={} stale={}",
                mirror.name, mirror.version, mirror.stale as u8
            )
            .expect("write mirror");
        }
        writeln!(
            out,
            "Dispatched={} unknown={} malformed={} fatal={}",
            vm.stats.dispatched, vm.stats.unknown, vm.stats.malformed, vm.stats.fatal
        )
        .expect("write stats");
        writeln!(out, "Status: {} {}", vm.status.code, vm.status.message).expect("write status");
        out
    }
}

/// Explore the engine message catalog and replay event traces.
#[derive(Parser, Debug)]
#[command(author, version, about = "Drive the emulator message bridge", long_about = None)]
struct Cli {
    /// Bridge configuration file (TOML).
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List message kinds with their tags, groups and payload shapes.
    Catalog {
        /// Only list kinds from this subsystem.
        #[arg(short, long, value_enum)]
        group: Option<GroupArg>,
    },
    /// Describe one kind given its key or numeric tag.
    Show {
        #[arg(value_name = "KIND")]
        kind: String,
    },
    /// Replay a trace file (or `-` for stdin) through a mock-engine bridge.
    Replay {
        #[arg(value_name = "TRACE")]
        trace: PathBuf,
        /// Emit one inspector JSON line per event instead of text.
        #[arg(long)]
        ndjson: bool,
        /// Post events from a separate engine thread and pump them.
        #[arg(long)]
        threaded: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GroupArg {
    Lifecycle,
    Console,
    Video,
    Debugger,
    Memory,
    Floppy,
    HardDrive,
    Input,
    Serial,
    Snapshot,
    Recording,
    Server,
}

impl From<GroupArg> for MsgGroup {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Lifecycle => MsgGroup::Lifecycle,
            GroupArg::Console => MsgGroup::Console,
            GroupArg::Video => MsgGroup::Video,
            GroupArg::Debugger => MsgGroup::Debugger,
            GroupArg::Memory => MsgGroup::Memory,
            GroupArg::Floppy => MsgGroup::FloppyDrive,
            GroupArg::HardDrive => MsgGroup::HardDrive,
            GroupArg::Input => MsgGroup::Input,
            GroupArg::Serial => MsgGroup::Serial,
            GroupArg::Snapshot => MsgGroup::Snapshot,
            GroupArg::Recording => MsgGroup::Recording,
            GroupArg::Server => MsgGroup::Server,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Catalog { group } => handle_catalog(group.map(MsgGroup::from)),
        Command::Show { kind } => handle_show(&kind),
        Command::Replay {
            trace,
            ndjson,
            threaded,
        } => {
            let config = load_config(cli.config.as_deref())?;
            handle_replay(&trace, config, ndjson, threaded)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::load(path).with_context(|| format!("loading {path:?}")),
        None => Ok(BridgeConfig::default()),
    }
}

fn handle_catalog(group: Option<MsgGroup>) -> Result<()> {
    let out = match group {
        Some(group) => render::catalog(group.kinds()),
        None => render::catalog(MsgKind::ALL.iter().copied()),
    };
    print!("{out}");
    Ok(())
}

fn handle_show(input: &str) -> Result<()> {
    let kind = match input.parse::<i64>() {
        Ok(raw) => MsgKind::from_raw(raw)?,
        Err(_) => MsgKind::from_key(input)?,
    };
    print!("{}", render::catalog([kind]));
    println!(
        "fatal={} stateful={}",
        kind.is_fatal() as u8,
        kind.is_stateful() as u8
    );
    Ok(())
}

fn read_trace(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read trace from stdin")?;
        return Ok(input);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read trace {path:?}"))
}

fn handle_replay(path: &Path, config: BridgeConfig, ndjson: bool, threaded: bool) -> Result<()> {
    let events = trace::parse(&read_trace(path)?)?;
    let engine = Arc::new(MockEngine::new());
    let bridge = Bridge::builder()
        .engine(engine.clone())
        .config(config)
        .build()?;
    info!("replaying {} events from {path:?}", events.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if threaded {
        replay_threaded(&bridge, &engine, events)?;
    } else {
        for (seq, event) in events.into_iter().enumerate() {
            replay_one(&mut out, &bridge, &engine, seq, event, ndjson)?;
        }
    }
    if !ndjson || threaded {
        write_report(&mut out, &bridge, ndjson)?;
    }
    Ok(())
}

fn replay_one(
    out: &mut impl Write,
    bridge: &Bridge,
    engine: &MockEngine,
    seq: usize,
    event: RawEvent,
    ndjson: bool,
) -> Result<()> {
    let before = bridge.status().revision();
    let kind = MsgKind::from_raw(event.id).ok();
    engine.emit(bridge, event);
    if ndjson {
        return write_report(out, bridge, true);
    }
    if let Some(kind) = kind {
        let channel = bridge.channel(kind);
        let value = channel.last_value();
        out.write_all(render::event(seq, kind, channel.stamp(), value.as_ref()).as_bytes())?;
    }
    if bridge.status().revision().is_newer_than(before) {
        out.write_all(render::status(seq, &bridge.status().current()).as_bytes())?;
    }
    Ok(())
}

/// Posts every event from an engine thread, pumping on this side until the
/// thread is done and the inbox is empty.
fn replay_threaded(bridge: &Bridge, engine: &Arc<MockEngine>, events: Vec<RawEvent>) -> Result<()> {
    let link = bridge.link();
    let engine = Arc::clone(engine);
    let poster = thread::spawn(move || -> Result<()> {
        for event in events {
            engine.apply_effect(&event);
            link.post(event)?;
        }
        Ok(())
    });
    while !poster.is_finished() || bridge.pending() > 0 {
        if bridge.pump() == 0 {
            thread::yield_now();
        }
    }
    poster
        .join()
        .map_err(|_| anyhow!("engine thread panicked"))?
}

fn write_report(out: &mut impl Write, bridge: &Bridge, ndjson: bool) -> Result<()> {
    let vm = bridge.inspect();
    if ndjson {
        out.write_all(vm.to_ndjson_line()?.as_bytes())?;
    } else {
        out.write_all(render::summary(&vm).as_bytes())?;
    }
    Ok(())
}
