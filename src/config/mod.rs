use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

pub const DEFAULT_API_BASE_URL: &str = "https://godbolt.org/api";
pub const DEFAULT_COMPILER: &str = "clang_concepts";
pub const DEFAULT_INCLUDE_URL_PREFIX: &str =
    "https://raw.githubusercontent.com/Quuxplusone/coro/master/";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path(), env::vars())
    }

    /// Layer defaults, then the rc file at `config_path` if readable, then `vars`.
    pub fn load_from<I>(config_path: PathBuf, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut map = default_map();
        if let Ok(file) = fs::File::open(&config_path) {
            map.extend(parse_rc(BufReader::new(file)));
        }
        map.extend(vars.into_iter().filter(|(k, _)| is_config_key(k)));
        Self { inner: map, config_path }
    }

    /// Defaults only; ignores the rc file and the environment.
    #[cfg(test)]
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let mut inner = default_map();
        for (k, v) in entries {
            inner.insert(k.to_string(), v.to_string());
        }
        Self { inner, config_path: PathBuf::new() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn api_base_url(&self) -> String {
        self.get("GODBOLT_API_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn compiler(&self) -> String {
        self.get("GODBOLT_COMPILER")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COMPILER.to_string())
    }

    pub fn include_url_prefix(&self) -> String {
        self.get("INCLUDE_URL_PREFIX")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INCLUDE_URL_PREFIX.to_string())
    }

    /// `None` unless REQUEST_TIMEOUT holds a number of seconds.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.get("REQUEST_TIMEOUT")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

/// `KEY=VALUE` lines; blank lines and `#` comments are skipped.
fn parse_rc<R: BufRead>(reader: R) -> Vec<(String, String)> {
    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            line.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "GODBOLT_API_BASE_URL",
        "GODBOLT_COMPILER",
        "REQUEST_TIMEOUT",
        "INCLUDE_URL_PREFIX",
    ];

    KEYS.contains(&k)
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("compile_on_godbolt").join(".godboltrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("GODBOLT_API_BASE_URL".into(), DEFAULT_API_BASE_URL.into());
    m.insert("GODBOLT_COMPILER".into(), DEFAULT_COMPILER.into());
    m.insert("INCLUDE_URL_PREFIX".into(), DEFAULT_INCLUDE_URL_PREFIX.into());
    m
}
