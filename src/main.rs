//! hipchat_room_message - send a message to a HipChat room
//!
//! Options come from `/etc/hipchat`, `~/.hipchat`, `HIPCHAT_*` environment
//! variables and flags, in increasing order of precedence.

use clap::{ArgAction, CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use hipchat_notify::config::{self, OptionMap};
use hipchat_notify::{commands, Error, HttpTransport};

#[derive(Parser, Debug)]
#[command(name = "hipchat_room_message")]
#[command(about = "Send a message to a HipChat room", long_about = None)]
#[command(disable_help_flag = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', action = ArgAction::SetTrue)]
    help: bool,

    /// API token (required)
    #[arg(short = 't', value_name = "TOKEN")]
    token: Option<String>,

    /// Room ID (required)
    #[arg(short = 'r', value_name = "ROOM_ID")]
    room_id: Option<String>,

    /// From name (required for v1)
    #[arg(short = 'f', value_name = "FROM")]
    from: Option<String>,

    /// Message color: yellow, red, green, purple, gray, random
    #[arg(short = 'c', value_name = "COLOR")]
    color: Option<String>,

    /// Message format: html or text
    #[arg(short = 'm', value_name = "FORMAT")]
    format: Option<String>,

    /// Message text (read from stdin when omitted)
    #[arg(short = 'i', value_name = "INPUT")]
    input: Option<String>,

    /// Nagios-style level: critical, warning, unknown, ok, down, up
    #[arg(short = 'l', value_name = "LEVEL")]
    level: Option<String>,

    /// Notify room members
    #[arg(short = 'n', action = ArgAction::SetTrue)]
    notify: bool,

    /// API host
    #[arg(short = 'o', value_name = "HOST")]
    host: Option<String>,

    /// API version: v1 or v2
    #[arg(short = 'v', value_name = "API")]
    api: Option<String>,

    /// Allow insecure TLS connections
    #[arg(short = 'k', action = ArgAction::SetTrue)]
    insecure: bool,

    /// Print the request instead of sending it
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

impl Cli {
    /// Only options given on the command line end up in the flag layer.
    fn flags(&self) -> OptionMap {
        let mut flags = OptionMap::new();
        let values = [
            ("token", &self.token),
            ("room_id", &self.room_id),
            ("from", &self.from),
            ("color", &self.color),
            ("format", &self.format),
            ("input", &self.input),
            ("level", &self.level),
            ("host", &self.host),
            ("api", &self.api),
        ];
        for (name, value) in values {
            if let Some(value) = value {
                flags.insert(name, value.as_str());
            }
        }
        if self.notify {
            flags.insert("notify", "1");
        }
        if self.insecure {
            flags.insert("insecure", "1");
        }
        flags
    }
}

fn print_usage() {
    eprintln!("{}", Cli::command().render_help());
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the service response.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hipchat_notify=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.help {
        print_usage();
        std::process::exit(1);
    }

    let files = OptionMap::from_defaults_files(&config::default_files())?;
    let env = OptionMap::from_process_env();
    let config = match config::resolve(&files, &env, &cli.flags()) {
        Ok(config) => config,
        Err(err @ Error::MissingRequiredField(_)) => {
            print_usage();
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    let stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();

    if cli.dry_run {
        commands::dry_run(&config, stdin, &mut stdout)?;
        return Ok(());
    }

    let transport = HttpTransport::new(config.insecure)?;
    commands::send_run(&config, &transport, stdin, &mut stdout).await?;
    Ok(())
}
