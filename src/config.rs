//! Option resolution for HipChat notifications
//!
//! Options arrive as flat key/value layers (defaults files, environment,
//! command-line flags). `resolve` merges them, validates required fields and
//! freezes the result into a [`Config`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "api.hipchat.com";
pub const SYSTEM_DEFAULTS_FILE: &str = "/etc/hipchat";
pub const USER_DEFAULTS_FILE: &str = ".hipchat";

/// Environment variable → option name.
pub const ENV_KEYS: &[(&str, &str)] = &[
    ("HIPCHAT_TOKEN", "token"),
    ("HIPCHAT_ROOM_ID", "room_id"),
    ("HIPCHAT_FROM", "from"),
    ("HIPCHAT_COLOR", "color"),
    ("HIPCHAT_FORMAT", "format"),
    ("HIPCHAT_MESSAGE", "input"),
    ("HIPCHAT_NOTIFY", "notify"),
    ("HIPCHAT_HOST", "host"),
    ("HIPCHAT_LEVEL", "level"),
    ("HIPCHAT_API", "api"),
    ("HIPCHAT_INSECURE", "insecure"),
];

/// Message background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Yellow,
    Red,
    Green,
    Purple,
    Gray,
    Random,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Yellow => "yellow",
            Color::Red => "red",
            Color::Green => "green",
            Color::Purple => "purple",
            Color::Gray => "gray",
            Color::Random => "random",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "yellow" => Some(Color::Yellow),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "purple" => Some(Color::Purple),
            "gray" => Some(Color::Gray),
            "random" => Some(Color::Random),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the service renders the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    #[default]
    Html,
    Text,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Html => "html",
            MessageFormat::Text => "text",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "html" => Some(MessageFormat::Html),
            "text" => Some(MessageFormat::Text),
            _ => None,
        }
    }
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    V1,
    V2,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "v1" => Some(ApiVersion::V1),
            "v2" => Some(ApiVersion::V2),
            _ => None,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nagios-style severity keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Critical,
    Warning,
    Unknown,
    Ok,
    Down,
    Up,
}

impl Level {
    /// Case-insensitive; `None` for anything outside the six known levels.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "critical" => Some(Level::Critical),
            "warning" => Some(Level::Warning),
            "unknown" => Some(Level::Unknown),
            "ok" => Some(Level::Ok),
            "down" => Some(Level::Down),
            "up" => Some(Level::Up),
            _ => None,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Level::Critical | Level::Down => Color::Red,
            Level::Warning => Color::Yellow,
            Level::Unknown => Color::Gray,
            Level::Ok | Level::Up => Color::Green,
        }
    }
}

/// Color implied by `level`, or `current` when the level is not recognized.
pub fn derive_color(level: &str, current: Color) -> Color {
    Level::parse(level).map_or(current, |l| l.color())
}

/// One layer of option values keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap(HashMap<String, String>);

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    /// Empty values are treated as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a layer from `HIPCHAT_*` style pairs. Unknown names are ignored.
    pub fn from_env_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            if let Some(option) = option_for_env_key(key.as_ref()) {
                map.insert(option, value);
            }
        }
        map
    }

    pub fn from_process_env() -> Self {
        Self::from_env_pairs(std::env::vars())
    }

    /// Parse dotenv-style defaults files. Later files win; missing files are skipped.
    pub fn from_defaults_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut map = Self::new();
        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                continue;
            }

            let entries = dotenvy::from_path_iter(path)
                .map_err(|e| Error::ConfigFile(format!("{}: {}", path.display(), e)))?;
            let mut pairs = Vec::new();
            for entry in entries {
                pairs.push(
                    entry.map_err(|e| Error::ConfigFile(format!("{}: {}", path.display(), e)))?,
                );
            }

            let layer = Self::from_env_pairs(pairs);
            debug!(path = %path.display(), keys = layer.len(), "Loaded defaults file");
            map.0.extend(layer.0);
        }
        Ok(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OptionMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

fn option_for_env_key(key: &str) -> Option<&'static str> {
    ENV_KEYS
        .iter()
        .find(|(env_key, _)| *env_key == key)
        .map(|(_, option)| *option)
}

/// `/etc/hipchat` followed by `$HOME/.hipchat`.
pub fn default_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from(SYSTEM_DEFAULTS_FILE)];
    if let Some(home) = std::env::var_os("HOME") {
        files.push(PathBuf::from(home).join(USER_DEFAULTS_FILE));
    }
    files
}

/// Resolved options for one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub room_id: String,
    pub from: String,
    pub color: Color,
    pub format: MessageFormat,
    pub notify: bool,
    pub host: String,
    pub level: Option<String>,
    pub api: ApiVersion,
    pub insecure: bool,
    /// Explicit message text; stdin is read when absent.
    pub input: Option<String>,
}

/// Merge the layers (flags > env > defaults files > built-ins) into a [`Config`].
pub fn resolve(config_file: &OptionMap, env: &OptionMap, flags: &OptionMap) -> Result<Config> {
    let lookup = |name: &str| {
        flags
            .get(name)
            .or_else(|| env.get(name))
            .or_else(|| config_file.get(name))
    };

    let api = parse_with(lookup("api"), "api", ApiVersion::parse);

    let mut missing = Vec::new();
    if lookup("token").is_none() {
        missing.push("token".to_string());
    }
    if lookup("room_id").is_none() {
        missing.push("room_id".to_string());
    }
    if matches!(api, Ok(ApiVersion::V1)) && lookup("from").is_none() {
        missing.push("from".to_string());
    }
    if !missing.is_empty() {
        return Err(Error::MissingRequiredField(missing));
    }

    let api = api?;
    let mut color = parse_with(lookup("color"), "color", Color::parse)?;
    let format = parse_with(lookup("format"), "format", MessageFormat::parse)?;
    let notify = parse_with(lookup("notify"), "notify", parse_bool)?;
    let insecure = parse_with(lookup("insecure"), "insecure", parse_bool)?;

    let level = lookup("level").map(str::to_string);
    if let Some(level) = level.as_deref() {
        if Level::parse(level).is_none() {
            debug!(level, "Ignoring unrecognized level");
        }
        color = derive_color(level, color);
    }

    Ok(Config {
        token: lookup("token").unwrap_or_default().to_string(),
        room_id: lookup("room_id").unwrap_or_default().to_string(),
        from: lookup("from").unwrap_or_default().to_string(),
        color,
        format,
        notify,
        host: lookup("host").unwrap_or(DEFAULT_HOST).to_string(),
        level,
        api,
        insecure,
        input: lookup("input").map(str::to_string),
    })
}

/// Parse an optional value, falling back to the type's default when unset.
fn parse_with<T: Default>(
    value: Option<&str>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T> {
    match value {
        None => Ok(T::default()),
        Some(raw) => parse(raw).ok_or_else(|| Error::InvalidOption {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{LazyLock, Mutex};

    static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

    struct EnvGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = std::env::var(key).ok();
            std::env::set_var(key, value);
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(value) => std::env::set_var(&self.key, value),
                None => std::env::remove_var(&self.key),
            }
        }
    }

    fn layer(pairs: &[(&str, &str)]) -> OptionMap {
        pairs.iter().copied().collect()
    }

    fn required() -> OptionMap {
        layer(&[("token", "tok"), ("room_id", "42"), ("from", "CI")])
    }

    #[test]
    fn defaults_apply_when_only_required_fields_given() {
        let config = resolve(&OptionMap::new(), &OptionMap::new(), &required()).unwrap();

        assert_eq!(config.color, Color::Yellow);
        assert_eq!(config.format, MessageFormat::Html);
        assert!(!config.notify);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.api, ApiVersion::V1);
        assert!(!config.insecure);
        assert!(config.level.is_none());
        assert!(config.input.is_none());
    }

    #[test]
    fn reports_every_missing_field_at_once() {
        let err = resolve(&OptionMap::new(), &OptionMap::new(), &OptionMap::new()).unwrap_err();
        match err {
            Error::MissingRequiredField(fields) => {
                assert_eq!(fields, vec!["token", "room_id", "from"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_is_optional_for_v2() {
        let flags = layer(&[("token", "tok"), ("room_id", "42"), ("api", "v2")]);
        let config = resolve(&OptionMap::new(), &OptionMap::new(), &flags).unwrap();

        assert_eq!(config.api, ApiVersion::V2);
        assert!(config.from.is_empty());
    }

    #[test]
    fn from_is_required_for_v1() {
        let flags = layer(&[("token", "tok"), ("room_id", "42")]);
        let err = resolve(&OptionMap::new(), &OptionMap::new(), &flags).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField(ref f) if f == &["from"]));
    }

    #[test]
    fn empty_values_count_as_missing() {
        let flags = layer(&[("token", ""), ("room_id", "42"), ("api", "v2")]);
        let err = resolve(&OptionMap::new(), &OptionMap::new(), &flags).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField(ref f) if f == &["token"]));
    }

    #[test]
    fn precedence_is_flag_then_env_then_file() {
        let file = layer(&[
            ("token", "file"),
            ("room_id", "1"),
            ("from", "file"),
            ("color", "purple"),
            ("host", "file.example.com"),
        ]);
        let env = layer(&[("token", "env"), ("color", "red")]);
        let flags = layer(&[("token", "flag")]);

        let config = resolve(&file, &env, &flags).unwrap();

        assert_eq!(config.token, "flag");
        assert_eq!(config.color, Color::Red);
        assert_eq!(config.host, "file.example.com");
        assert_eq!(config.from, "file");
    }

    #[test]
    fn level_overrides_color() {
        let mut flags = required();
        flags.insert("color", "purple");
        flags.insert("level", "CRITICAL");

        let config = resolve(&OptionMap::new(), &OptionMap::new(), &flags).unwrap();
        assert_eq!(config.color, Color::Red);
        assert_eq!(config.level.as_deref(), Some("CRITICAL"));
    }

    #[test]
    fn unknown_level_keeps_color() {
        let mut flags = required();
        flags.insert("color", "purple");
        flags.insert("level", "bogus");

        let config = resolve(&OptionMap::new(), &OptionMap::new(), &flags).unwrap();
        assert_eq!(config.color, Color::Purple);
    }

    #[test]
    fn derive_color_mapping() {
        assert_eq!(derive_color("critical", Color::Yellow), Color::Red);
        assert_eq!(derive_color("warning", Color::Red), Color::Yellow);
        assert_eq!(derive_color("unknown", Color::Yellow), Color::Gray);
        assert_eq!(derive_color("ok", Color::Yellow), Color::Green);
        assert_eq!(derive_color("down", Color::Yellow), Color::Red);
        assert_eq!(derive_color("UP", Color::Yellow), Color::Green);
        assert_eq!(derive_color("bogus", Color::Purple), Color::Purple);
        assert_eq!(derive_color("", Color::Random), Color::Random);
    }

    #[test]
    fn invalid_color_is_rejected() {
        let mut flags = required();
        flags.insert("color", "blue");

        let err = resolve(&OptionMap::new(), &OptionMap::new(), &flags).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOption { ref name, ref value } if name == "color" && value == "blue"
        ));
    }

    #[test]
    fn invalid_api_still_reports_missing_fields_first() {
        let flags = layer(&[("api", "v3")]);
        let err = resolve(&OptionMap::new(), &OptionMap::new(), &flags).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField(ref f) if f == &["token", "room_id"]));

        let flags = layer(&[("token", "t"), ("room_id", "1"), ("api", "v3")]);
        let err = resolve(&OptionMap::new(), &OptionMap::new(), &flags).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref name, .. } if name == "api"));
    }

    #[test]
    fn boolean_options_accept_common_spellings() {
        let cases = [
            ("1", true),
            ("TRUE", true),
            ("yes", true),
            ("0", false),
            ("off", false),
        ];
        for (raw, expected) in cases {
            let mut flags = required();
            flags.insert("notify", raw);
            flags.insert("insecure", raw);
            let config = resolve(&OptionMap::new(), &OptionMap::new(), &flags).unwrap();
            assert_eq!(config.notify, expected, "notify={raw}");
            assert_eq!(config.insecure, expected, "insecure={raw}");
        }
    }

    #[test]
    fn env_pairs_map_onto_option_names() {
        let map = OptionMap::from_env_pairs([
            ("HIPCHAT_TOKEN", "tok"),
            ("HIPCHAT_ROOM_ID", "99"),
            ("HIPCHAT_MESSAGE", "hi"),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(map.get("token"), Some("tok"));
        assert_eq!(map.get("room_id"), Some("99"));
        assert_eq!(map.get("input"), Some("hi"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn process_env_is_read_through_mapping() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::set("HIPCHAT_LEVEL", "down");

        let map = OptionMap::from_process_env();
        assert_eq!(map.get("level"), Some("down"));
    }

    #[test]
    fn defaults_files_later_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("hipchat");
        let user = dir.path().join(".hipchat");
        std::fs::write(&system, "HIPCHAT_TOKEN=system\nHIPCHAT_HOST=chat.internal\n").unwrap();
        std::fs::write(&user, "export HIPCHAT_TOKEN=\"user\"\n").unwrap();

        let map = OptionMap::from_defaults_files(&[system, user]).unwrap();

        assert_eq!(map.get("token"), Some("user"));
        assert_eq!(map.get("host"), Some("chat.internal"));
    }

    #[test]
    fn defaults_files_skip_missing_paths() {
        let map = OptionMap::from_defaults_files(&["/nonexistent/path/hipchat"]).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn defaults_file_parse_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hipchat");
        std::fs::write(&path, "HIPCHAT_TOKEN='unterminated\n").unwrap();

        let err = OptionMap::from_defaults_files(&[&path]).unwrap_err();
        assert!(matches!(err, Error::ConfigFile(_)));
    }

    #[test]
    fn default_files_start_with_system_file() {
        let files = default_files();
        assert_eq!(files[0], PathBuf::from(SYSTEM_DEFAULTS_FILE));
    }
}
