//! Flex command parsing
//!
//! The orchestrator runs the driver once per lifecycle event as
//! `<binary> <verb> <args...>`. Each verb has a fixed positional arity;
//! parsing is pure and fails before any side effect happens.

use crate::error::{FlexError, Result};
use clap::{CommandFactory, Parser, Subcommand};

/// Lifecycle verb selected by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Init,
    GetVolumeName,
    Attach,
    Detach,
    WaitForAttach,
    IsAttached,
    MountDevice,
    UnmountDevice,
    Mount,
    Unmount,
}

impl Verb {
    pub const ALL: [Verb; 10] = [
        Verb::Init,
        Verb::GetVolumeName,
        Verb::Attach,
        Verb::Detach,
        Verb::WaitForAttach,
        Verb::IsAttached,
        Verb::MountDevice,
        Verb::UnmountDevice,
        Verb::Mount,
        Verb::Unmount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Init => "init",
            Verb::GetVolumeName => "get-volume-name",
            Verb::Attach => "attach",
            Verb::Detach => "detach",
            Verb::WaitForAttach => "wait-for-attach",
            Verb::IsAttached => "is-attached",
            Verb::MountDevice => "mount-device",
            Verb::UnmountDevice => "unmount-device",
            Verb::Mount => "mount",
            Verb::Unmount => "unmount",
        }
    }

    /// Whether the verb talks to the storage provider's API
    pub fn needs_provider(&self) -> bool {
        matches!(self, Verb::Attach | Verb::Detach | Verb::IsAttached)
    }

    /// Number of positional arguments following the verb
    pub fn arity(&self) -> usize {
        match self {
            Verb::Init => 0,
            Verb::GetVolumeName | Verb::UnmountDevice | Verb::Unmount => 1,
            Verb::Attach
            | Verb::Detach
            | Verb::WaitForAttach
            | Verb::IsAttached
            | Verb::Mount => 2,
            Verb::MountDevice => 3,
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed flex invocation
///
/// Which fields are set is fully determined by the verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    options: Option<String>,
    node_name: Option<String>,
    device: Option<String>,
    mount_dir: Option<String>,
}

impl Command {
    /// Parse a full argument vector, program name included
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        if args.len() < 2 {
            return Err(FlexError::MalformedCommand(
                "flex command argument was not found".to_string(),
            ));
        }

        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        match FlexArgs::try_parse_from(&args) {
            Ok(parsed) => Ok(parsed.verb.into()),
            Err(_) if FlexArgs::command().find_subcommand(args[1]).is_none() => {
                Err(FlexError::UnknownVerb(args[1].to_string()))
            }
            Err(e) => Err(FlexError::MalformedCommand(format!(
                "{} ({:?})",
                args[1..].join(" "),
                e.kind()
            ))),
        }
    }

    fn new(verb: Verb) -> Self {
        Self {
            verb,
            options: None,
            node_name: None,
            device: None,
            mount_dir: None,
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Raw JSON options payload
    pub fn options(&self) -> Option<&str> {
        self.options.as_deref()
    }

    pub fn node_name(&self) -> Option<&str> {
        self.node_name.as_deref()
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn mount_dir(&self) -> Option<&str> {
        self.mount_dir.as_deref()
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "flex",
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
struct FlexArgs {
    #[command(subcommand)]
    verb: VerbArgs,
}

#[derive(Subcommand, Debug)]
enum VerbArgs {
    Init,
    #[command(name = "get-volume-name", alias = "getvolumename")]
    GetVolumeName { options: String },
    Attach { options: String, node_name: String },
    Detach { device: String, node_name: String },
    #[command(name = "wait-for-attach", alias = "waitforattach")]
    WaitForAttach { device: String, options: String },
    #[command(name = "is-attached", alias = "isattached")]
    IsAttached { options: String, node_name: String },
    #[command(name = "mount-device", alias = "mountdevice")]
    MountDevice {
        mount_dir: String,
        device: String,
        options: String,
    },
    #[command(name = "unmount-device", alias = "unmountdevice")]
    UnmountDevice { device: String },
    Mount { mount_dir: String, options: String },
    Unmount { mount_dir: String },
}

impl From<VerbArgs> for Command {
    fn from(args: VerbArgs) -> Self {
        match args {
            VerbArgs::Init => Command::new(Verb::Init),
            VerbArgs::GetVolumeName { options } => Command {
                options: Some(options),
                ..Command::new(Verb::GetVolumeName)
            },
            VerbArgs::Attach { options, node_name } => Command {
                options: Some(options),
                node_name: Some(node_name),
                ..Command::new(Verb::Attach)
            },
            VerbArgs::Detach { device, node_name } => Command {
                device: Some(device),
                node_name: Some(node_name),
                ..Command::new(Verb::Detach)
            },
            VerbArgs::WaitForAttach { device, options } => Command {
                device: Some(device),
                options: Some(options),
                ..Command::new(Verb::WaitForAttach)
            },
            VerbArgs::IsAttached { options, node_name } => Command {
                options: Some(options),
                node_name: Some(node_name),
                ..Command::new(Verb::IsAttached)
            },
            VerbArgs::MountDevice {
                mount_dir,
                device,
                options,
            } => Command {
                mount_dir: Some(mount_dir),
                device: Some(device),
                options: Some(options),
                ..Command::new(Verb::MountDevice)
            },
            VerbArgs::UnmountDevice { device } => Command {
                device: Some(device),
                ..Command::new(Verb::UnmountDevice)
            },
            VerbArgs::Mount { mount_dir, options } => Command {
                mount_dir: Some(mount_dir),
                options: Some(options),
                ..Command::new(Verb::Mount)
            },
            VerbArgs::Unmount { mount_dir } => Command {
                mount_dir: Some(mount_dir),
                ..Command::new(Verb::Unmount)
            },
        }
    }
}
