use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use flakegen::{DEFAULT_EPOCH, INSTAGRAM_EPOCH, MAX_NODE_ID, TWITTER_EPOCH};

/// Command line configuration for the `flakegen` binary.
///
/// Every global option can also be set through the environment (or a `.env`
/// file in the working directory).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flakegen",
    version,
    about = "Generate and decode Snowflake-style 64-bit IDs"
)]
pub struct CliArgs {
    /// Node id embedded in generated IDs, in `0..=1023`.
    ///
    /// When absent, one is derived from the host's network hardware
    /// addresses, falling back to a random value. Derived ids may collide
    /// across hosts.
    ///
    /// Environment variable: `FLAKEGEN_NODE_ID`
    #[arg(long, env = "FLAKEGEN_NODE_ID", global = true)]
    pub node_id: Option<i64>,

    /// Custom epoch in milliseconds since the Unix epoch, or one of the named
    /// epochs `default` (2015-01-01), `twitter` or `instagram`.
    ///
    /// Environment variable: `FLAKEGEN_EPOCH_MS`
    #[arg(long, env = "FLAKEGEN_EPOCH_MS", default_value_t = DEFAULT_EPOCH, value_parser = parse_epoch, global = true)]
    pub epoch_ms: u64,

    /// Generator strategy.
    ///
    /// Environment variable: `FLAKEGEN_GENERATOR`
    #[arg(long, env = "FLAKEGEN_GENERATOR", value_enum, default_value_t = GeneratorKind::Lock, global = true)]
    pub generator: GeneratorKind,

    /// Time source.
    ///
    /// Environment variable: `FLAKEGEN_CLOCK`
    #[arg(long, env = "FLAKEGEN_CLOCK", value_enum, default_value_t = ClockKind::System, global = true)]
    pub clock: ClockKind,

    #[command(subcommand)]
    pub command: Command,
}

/// Accepts a named epoch or a raw millisecond value.
fn parse_epoch(value: &str) -> Result<u64, String> {
    match value {
        "default" => Ok(DEFAULT_EPOCH),
        "twitter" => Ok(TWITTER_EPOCH),
        "instagram" => Ok(INSTAGRAM_EPOCH),
        millis => millis.parse().map_err(|_| {
            format!("expected milliseconds or default|twitter|instagram, got `{millis}`")
        }),
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate new IDs, one per line.
    Generate {
        /// Number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Emit one JSON object per line instead of bare integers.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Decode existing IDs into timestamp, node id and sequence.
    Parse {
        /// IDs to decode.
        #[arg(required = true)]
        ids: Vec<u64>,

        /// Emit one JSON object per line.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the generator settings and exit.
    Info,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    /// `IdGenerator`, serialized through a mutex.
    Lock,
    /// `AtomicIdGenerator`, compare-and-swap.
    Atomic,
}

impl GeneratorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Atomic => "atomic",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Wall clock, read on every call.
    System,
    /// Wall clock sampled once, then advanced by a monotonic ticker.
    Monotonic,
}

impl ClockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Monotonic => "monotonic",
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// `None` means derive one.
    pub node_id: Option<u64>,
    pub epoch_ms: u64,
    pub generator: GeneratorKind,
    pub clock: ClockKind,
    pub command: Command,
}

impl TryFrom<CliArgs> for GeneratorConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let node_id = match args.node_id {
            None => None,
            Some(id) => match u64::try_from(id) {
                Ok(id) if id <= MAX_NODE_ID => Some(id),
                _ => bail!(
                    "FLAKEGEN_NODE_ID ({}) is outside the valid range [0, {}]",
                    id,
                    MAX_NODE_ID
                ),
            },
        };

        if let Command::Generate { count: 0, .. } = args.command {
            bail!("--count must be greater than 0");
        }

        Ok(Self {
            node_id,
            epoch_ms: args.epoch_ms,
            generator: args.generator,
            clock: args.clock,
            command: args.command,
        })
    }
}
