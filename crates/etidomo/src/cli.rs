//! Clap derive structures for the `etidomo` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// etidomo -- control a CAME ETI/Domo gateway from the command line
#[derive(Debug, Parser)]
#[command(
    name = "etidomo",
    version,
    about = "Control CAME ETI/Domo home automation from the command line",
    long_about = "Talks to the local ETI/Domo gateway over its JSON API: lists floors,\n\
        rooms and devices, switches lights and relays, moves openings, sets\n\
        thermostats, runs scenarios and streams live status changes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "ETIDOMO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Gateway host or IP (overrides profile)
    #[arg(long, short = 'H', env = "ETIDOMO_HOST", global = true)]
    pub host: Option<String>,

    /// Static access token
    #[arg(long, env = "ETIDOMO_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Session login name
    #[arg(long, short = 'u', env = "ETIDOMO_USERNAME", global = true)]
    pub username: Option<String>,

    /// Session password
    #[arg(long, env = "ETIDOMO_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ETIDOMO_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ETIDOMO_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show gateway firmware, serial and features
    Info,

    /// List floors
    Floors,

    /// List rooms
    Rooms,

    /// List and inspect devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Switch and dim lights
    #[command(alias = "l")]
    Light(LightArgs),

    /// Switch generic relays
    Relay(RelayArgs),

    /// Move openings (shutters, gates)
    #[command(alias = "cover")]
    Opening(OpeningArgs),

    /// Configure thermoregulation zones
    #[command(alias = "climate")]
    Thermo(ThermoArgs),

    /// Manage stored scenarios
    #[command(alias = "scenes")]
    Scenarios(ScenariosArgs),

    /// Stream live status changes until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and credentials
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List {
        /// Only devices of this kind
        #[arg(long, short = 'k')]
        kind: Option<KindFilter>,

        /// Only devices on this floor id
        #[arg(long)]
        floor: Option<i64>,

        /// Only devices in this room id
        #[arg(long)]
        room: Option<i64>,
    },

    /// Show one device with its raw gateway record
    Get {
        /// Unique id, action id, or name
        device: String,
    },

    /// Re-read one device from the gateway
    Update {
        /// Unique id, action id, or name
        device: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindFilter {
    Light,
    Thermostat,
    Relay,
    Opening,
    DigitalIn,
    Energy,
    Sensor,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LIGHTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LightArgs {
    #[command(subcommand)]
    pub command: LightCommand,
}

#[derive(Debug, Subcommand)]
pub enum LightCommand {
    /// Turn a light on
    On {
        /// Unique id, action id, or name
        device: String,

        /// Brightness in percent
        #[arg(long, short = 'b', value_parser = clap::value_parser!(u8).range(0..=100))]
        brightness: Option<u8>,

        /// Color as three 0-255 channels
        #[arg(long, num_args = 3, value_names = ["R", "G", "B"])]
        rgb: Option<Vec<u8>>,
    },

    /// Turn a light off
    Off {
        /// Unique id, action id, or name
        device: String,
    },

    /// Put a light in automatic mode
    Auto {
        /// Unique id, action id, or name
        device: String,
    },

    /// Set brightness (dimmers and RGB lights)
    Brightness {
        /// Unique id, action id, or name
        device: String,

        /// Brightness in percent (clamped to 0-100)
        #[arg(allow_negative_numbers = true)]
        percent: i64,
    },

    /// Set hue and saturation (RGB lights)
    Color {
        /// Unique id, action id, or name
        device: String,

        /// Hue in degrees (0-360)
        hue: f64,

        /// Saturation in percent (0-100)
        saturation: f64,
    },

    /// Set the RGB color (RGB lights)
    Rgb {
        /// Unique id, action id, or name
        device: String,

        /// Red channel (clamped to 0-255)
        red: i64,

        /// Green channel (clamped to 0-255)
        green: i64,

        /// Blue channel (clamped to 0-255)
        blue: i64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RELAYS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RelayArgs {
    #[command(subcommand)]
    pub command: RelayCommand,
}

#[derive(Debug, Subcommand)]
pub enum RelayCommand {
    /// Close the relay
    On {
        /// Unique id, action id, or name
        device: String,
    },

    /// Open the relay
    Off {
        /// Unique id, action id, or name
        device: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OPENINGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct OpeningArgs {
    #[command(subcommand)]
    pub command: OpeningCommand,
}

#[derive(Debug, Subcommand)]
pub enum OpeningCommand {
    /// Start opening
    Open {
        /// Unique id, action id, or name
        device: String,
    },

    /// Start closing
    Close {
        /// Unique id, action id, or name
        device: String,
    },

    /// Stop moving
    Stop {
        /// Unique id, action id, or name
        device: String,
    },

    /// Move to an estimated position, stopping on arrival
    Position {
        /// Unique id, action id, or name
        device: String,

        /// Target position in percent (0 = closed, 100 = open)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,

        /// Assumed current position in percent
        #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(0..=100))]
        from: u8,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  THERMOREGULATION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ThermoArgs {
    #[command(subcommand)]
    pub command: ThermoCommand,
}

#[derive(Debug, Subcommand)]
pub enum ThermoCommand {
    /// Change a zone's mode, set point, season or fan speed
    Set {
        /// Unique id, action id, or name
        device: String,

        /// Operating mode
        #[arg(long, short = 'm')]
        mode: Option<ThermoModeArg>,

        /// Set point in degrees Celsius
        #[arg(long, short = 't', allow_negative_numbers = true)]
        temperature: Option<f64>,

        /// Plant season
        #[arg(long, short = 's')]
        season: Option<SeasonArg>,

        /// Fan-coil speed
        #[arg(long, conflicts_with = "fan_mode")]
        fan: Option<FanSpeedArg>,

        /// Fan mode by display name (LOW, MEDIUM, HIGH, AUTO)
        #[arg(long)]
        fan_mode: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThermoModeArg {
    Off,
    Manual,
    Auto,
    Jolly,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeasonArg {
    PlantOff,
    Winter,
    Summer,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FanSpeedArg {
    Off,
    Slow,
    Medium,
    Fast,
    Auto,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCENARIOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ScenariosArgs {
    #[command(subcommand)]
    pub command: ScenariosCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScenariosCommand {
    /// List stored scenarios
    #[command(alias = "ls")]
    List,

    /// Run a scenario
    Activate {
        /// Scenario id
        id: i64,
    },

    /// Start recording a new scenario
    Create {
        /// Scenario name
        name: String,
    },

    /// Delete a scenario
    Delete {
        /// Scenario id
        id: i64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Server-side long-poll wait in seconds (overrides profile)
    #[arg(long)]
    pub poll_timeout: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the current configuration (secrets redacted)
    Show,

    /// Store the session password in the system keyring
    SetPassword {
        /// Password; read from stdin when omitted
        #[arg(long)]
        value: Option<String>,
    },

    /// Store the access token in the system keyring
    SetToken {
        /// Token; read from stdin when omitted
        #[arg(long)]
        value: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
