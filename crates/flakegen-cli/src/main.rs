mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};

use clap::Parser;
use config::{CliArgs, ClockKind, Command, GeneratorConfig, GeneratorKind};
use flakegen::{
    AtomicIdGenerator, DerivedNodeId, EPOCH_BITS, IdGenerator, MonotonicClock, NODE_ID_BITS,
    NodeIdSource, ParsedId, SEQUENCE_BITS, SnowflakeGenerator, SystemClock, TimeSource,
    derive_node_id,
};
use serde::Serialize;
use telemetry::init_tracing;

type DynGenerator = Box<dyn SnowflakeGenerator + Send + Sync>;

/// Where the node id in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolvedNodeId {
    node_id: u64,
    origin: &'static str,
}

/// One decoded ID, as written by `--json`.
#[derive(Serialize)]
struct IdRecord {
    id: u64,
    #[serde(flatten)]
    parsed: ParsedId,
}

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = GeneratorConfig::try_from(args)?;

    init_tracing();

    let node = resolve_node_id(config.node_id);
    let generator = build_generator(&config, node.node_id)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match &config.command {
        Command::Generate { count, json } => {
            write_generated(&mut out, generator.as_ref(), *count, *json)?
        }
        Command::Parse { ids, json } => write_parsed(&mut out, generator.as_ref(), ids, *json)?,
        Command::Info => write_info(&mut out, &config, node)?,
    }
    out.flush()?;

    Ok(())
}

fn resolve_node_id(configured: Option<u64>) -> ResolvedNodeId {
    match configured {
        Some(node_id) => ResolvedNodeId {
            node_id,
            origin: "configured",
        },
        None => {
            let DerivedNodeId { node_id, source } = derive_node_id();
            let origin = match source {
                NodeIdSource::Hardware => "hardware",
                NodeIdSource::Random => "random",
            };
            tracing::info!(node_id, origin, "no node id configured, derived one");
            ResolvedNodeId { node_id, origin }
        }
    }
}

fn build_generator(config: &GeneratorConfig, node_id: u64) -> anyhow::Result<DynGenerator> {
    let node_id = i64::try_from(node_id)?;
    match config.clock {
        ClockKind::System => with_clock(config.generator, node_id, config.epoch_ms, SystemClock),
        ClockKind::Monotonic => with_clock(
            config.generator,
            node_id,
            config.epoch_ms,
            MonotonicClock::new(),
        ),
    }
}

fn with_clock<T>(
    kind: GeneratorKind,
    node_id: i64,
    epoch_ms: u64,
    clock: T,
) -> anyhow::Result<DynGenerator>
where
    T: TimeSource + Send + Sync + 'static,
{
    let generator: DynGenerator = match kind {
        GeneratorKind::Lock => Box::new(IdGenerator::with_clock(node_id, epoch_ms, clock)?),
        GeneratorKind::Atomic => {
            Box::new(AtomicIdGenerator::with_clock(node_id, epoch_ms, clock)?)
        }
    };
    Ok(generator)
}

fn write_generated(
    out: &mut impl Write,
    generator: &dyn SnowflakeGenerator,
    count: usize,
    json: bool,
) -> anyhow::Result<()> {
    for _ in 0..count {
        let id = generator.next()?;
        if json {
            write_record(out, generator, id)?;
        } else {
            writeln!(out, "{id}")?;
        }
    }
    Ok(())
}

fn write_parsed(
    out: &mut impl Write,
    generator: &dyn SnowflakeGenerator,
    ids: &[u64],
    json: bool,
) -> anyhow::Result<()> {
    for &id in ids {
        if json {
            write_record(out, generator, id)?;
        } else {
            let ParsedId {
                timestamp_millis,
                node_id,
                sequence,
            } = generator.parse(id);
            writeln!(
                out,
                "{id} timestamp_millis={timestamp_millis} node_id={node_id} sequence={sequence}"
            )?;
        }
    }
    Ok(())
}

fn write_record(
    out: &mut impl Write,
    generator: &dyn SnowflakeGenerator,
    id: u64,
) -> anyhow::Result<()> {
    let record = IdRecord {
        id,
        parsed: generator.parse(id),
    };
    serde_json::to_writer(&mut *out, &record)?;
    writeln!(out)?;
    Ok(())
}

fn write_info(
    out: &mut impl Write,
    config: &GeneratorConfig,
    node: ResolvedNodeId,
) -> anyhow::Result<()> {
    writeln!(out, "generator:    {}", config.generator.as_str())?;
    writeln!(out, "clock:        {}", config.clock.as_str())?;
    writeln!(out, "node_id:      {} ({})", node.node_id, node.origin)?;
    writeln!(out, "custom_epoch: {}", config.epoch_ms)?;
    writeln!(
        out,
        "layout:       reserved=1 timestamp={EPOCH_BITS} node_id={NODE_ID_BITS} sequence={SEQUENCE_BITS}"
    )?;
    Ok(())
}
