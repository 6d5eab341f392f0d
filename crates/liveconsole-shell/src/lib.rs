//! Headless host for the live console core.
//!
//! Reads one command per line from stdin, feeds them into the console's
//! event queue and prints view notifications as JSON lines on stdout.
//! Logs go to stderr.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use liveconsole_core::settings_form::{DESCRIPTION, FIELD_LABEL, TITLE};
use liveconsole_core::{
    Config, Console, ConsoleError, ConsoleEvent, ConsoleHandle, Credential, CredentialStore,
    FileStore, SessionConnector, SessionTransport, SettingsForm, StoreBackend, StreamRef,
    StreamSource, ViewEvent, ViewListener,
};
use thiserror::Error;
use tokio::sync::watch;
use url::Url;

const APP_DIR: &str = "liveconsole";
const KEYRING_SERVICE: &str = "liveconsole";

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Settings,
    Key(String),
    Save,
    Cancel,
    Mount,
    Unmount,
    Webcam,
    Screen,
    StopStream,
    Refresh,
    Quit,
}

pub const HELP: &str = "commands: settings | key <value> | save | cancel | mount | unmount | webcam | screen | stop | refresh | quit";

pub fn parse_command(line: &str) -> Option<ShellCommand> {
    // The key is taken verbatim, surrounding spaces included.
    if let Some(value) = line.strip_prefix("key ") {
        return Some(ShellCommand::Key(value.to_string()));
    }
    let command = match line.trim() {
        "settings" => ShellCommand::Settings,
        "key" => ShellCommand::Key(String::new()),
        "save" => ShellCommand::Save,
        "cancel" => ShellCommand::Cancel,
        "mount" => ShellCommand::Mount,
        "unmount" => ShellCommand::Unmount,
        "webcam" => ShellCommand::Webcam,
        "screen" => ShellCommand::Screen,
        "stop" => ShellCommand::StopStream,
        "refresh" => ShellCommand::Refresh,
        "quit" | "exit" => ShellCommand::Quit,
        _ => return None,
    };
    Some(command)
}

/// Drive the console from line input until EOF or `quit`.
///
/// Plays both the settings surface (through [`SettingsForm`]) and the
/// capture controller (through the watch channel).
pub fn read_input(
    reader: impl BufRead,
    handle: ConsoleHandle,
    streams: watch::Sender<Option<StreamRef>>,
) -> Result<(), ShellError> {
    let mut form = SettingsForm::new();
    let mut stream_seq = 0u32;

    for line in reader.lines() {
        let line = line?;
        let Some(command) = parse_command(&line) else {
            eprintln!("{HELP}");
            continue;
        };
        tracing::debug!(?command, "input");

        match command {
            ShellCommand::Settings => handle.blocking_send(ConsoleEvent::OpenSettings)?,
            ShellCommand::Key(value) => form.set_draft(value),
            ShellCommand::Save => match form.save() {
                Some(events) => {
                    for event in events {
                        handle.blocking_send(event)?;
                    }
                }
                None => eprintln!("{FIELD_LABEL} is required"),
            },
            ShellCommand::Cancel => handle.blocking_send(form.cancel())?,
            ShellCommand::Mount => handle.blocking_send(ConsoleEvent::SurfaceMounted)?,
            ShellCommand::Unmount => handle.blocking_send(ConsoleEvent::SurfaceUnmounted)?,
            ShellCommand::Webcam => {
                publish_stream(&streams, &mut stream_seq, StreamSource::Webcam)
            }
            ShellCommand::Screen => {
                publish_stream(&streams, &mut stream_seq, StreamSource::ScreenCapture)
            }
            ShellCommand::StopStream => {
                streams.send_replace(None);
            }
            ShellCommand::Refresh => handle.blocking_send(ConsoleEvent::Refresh)?,
            ShellCommand::Quit => break,
        }
    }
    Ok(())
}

fn publish_stream(
    streams: &watch::Sender<Option<StreamRef>>,
    seq: &mut u32,
    source: StreamSource,
) {
    *seq += 1;
    streams.send_replace(Some(StreamRef {
        id: format!("stream-{seq}"),
        source,
    }));
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Prints every view notification as a JSON line.
struct PrintListener;

impl ViewListener for PrintListener {
    fn on_event(&self, event: ViewEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("unprintable view event: {e}"),
        }
        if event == (ViewEvent::ModalChanged { open: true }) {
            eprintln!("== {TITLE} ==\n{DESCRIPTION}\n{FIELD_LABEL}: key <value>, then save");
        }
    }
}

/// Session stand-in for running without the media client attached.
struct LogConnector;

struct LogSession {
    endpoint: Url,
}

impl SessionTransport for LogSession {
    fn close(&mut self) {
        tracing::info!(endpoint = %self.endpoint, "session transport released");
    }
}

impl SessionConnector for LogConnector {
    fn connect(
        &mut self,
        endpoint: &Url,
        _credential: &Credential,
    ) -> Result<Box<dyn SessionTransport>, ConsoleError> {
        tracing::info!(%endpoint, "session transport created");
        Ok(Box::new(LogSession {
            endpoint: endpoint.clone(),
        }))
    }
}

fn data_dir(config: &Config) -> Result<PathBuf, ConsoleError> {
    config
        .data_dir()
        .cloned()
        .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
        .ok_or_else(|| {
            ConsoleError::Config(format!(
                "no data directory found; set {}",
                liveconsole_core::config::DATA_DIR_VAR
            ))
        })
}

fn open_store(config: &Config) -> Result<Box<dyn CredentialStore>, ConsoleError> {
    match config.store() {
        StoreBackend::File => {
            let store = FileStore::new(data_dir(config)?);
            tracing::info!(path = %store.path().display(), "using file credential store");
            Ok(Box::new(store))
        }
        #[cfg(not(any(target_os = "android", target_os = "ios")))]
        StoreBackend::Keyring => {
            tracing::info!(service = KEYRING_SERVICE, "using keyring credential store");
            Ok(Box::new(liveconsole_core::KeyringStore::new(KEYRING_SERVICE)))
        }
        #[cfg(any(target_os = "android", target_os = "ios"))]
        StoreBackend::Keyring => Err(ConsoleError::Config(
            "keyring store is not available on this platform".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liveconsole_core=info,liveconsole_shell=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> Result<(), ShellError> {
    init_logging();

    let config = Config::from_env()?;
    let store = open_store(&config)?;
    let console = Console::new(&config, store, LogConnector);
    console.add_listener(Arc::new(PrintListener));

    let rt = tokio::runtime::Runtime::new()?;
    let (handle, rx) = liveconsole_core::channel();
    let (stream_tx, stream_rx) = watch::channel(None);
    {
        let _guard = rt.enter();
        let _forwarder = handle.forward_stream(stream_rx);
    }

    let input = std::thread::spawn(move || read_input(std::io::stdin().lock(), handle, stream_tx));

    tracing::info!(endpoint = %config.endpoint(), "live console started");
    rt.block_on(console.run(rx));

    match input.join() {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("input thread panicked");
            Ok(())
        }
    }
}
