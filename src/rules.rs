use std::collections::HashMap;
use std::io;
use std::iter::FromIterator;
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_RULE: &str = r#""/ping" => "https://github.com/goldlink/goldlink""#;

/// A single `from` path to `to` target mapping declared in the rules file.
#[derive(Debug, PartialEq, Eq)]
pub struct Rule {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Error)]
pub enum BadRule {
    #[error("rule does not start with a quoted path")]
    MissingOpenQuote,
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("path does not start with '/'")]
    MissingSlash,
    #[error("missing '=>' between path and target")]
    MissingArrow,
    #[error("target is not quoted")]
    MissingTargetQuote,
}

impl FromStr for Rule {
    type Err = BadRule;

    /// Extracts `"<path>" => "<target>"`, tolerating whitespace around the
    /// arrow. The target capture is greedy: it runs to the last quote on the
    /// line, so quotes embedded in the target survive.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let rest = line.trim_start();
        let rest = rest.strip_prefix('"').ok_or(BadRule::MissingOpenQuote)?;
        let (from, rest) = rest.split_once('"').ok_or(BadRule::UnterminatedQuote)?;
        if !from.starts_with('/') {
            return Err(BadRule::MissingSlash);
        }
        let rest = rest.trim_start();
        let rest = rest.strip_prefix("=>").ok_or(BadRule::MissingArrow)?;
        let rest = rest.trim_start();
        let rest = rest.strip_prefix('"').ok_or(BadRule::MissingTargetQuote)?;
        let (to, _) = rest.rsplit_once('"').ok_or(BadRule::UnterminatedQuote)?;
        Ok(Rule {
            from: from.trim().to_string(),
            to: to.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// Write an example rules file if none exists, then load it.
    Enabled,
    Disabled,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open rules file: {0}")]
    Open(io::Error),
}

/// Loads rules from `path` in file order.
///
/// An absent file is never fatal: with `Bootstrap::Enabled` an example file is
/// written and loading is attempted once more (explicitly, so the retry is
/// bounded); otherwise an empty set is returned. A file that exists but cannot
/// be opened is fatal, since serving with an unknown rule set is unsafe.
pub async fn load(path: &Path, bootstrap: Bootstrap) -> Result<Vec<Rule>, LoadError> {
    if let Some(rules) = try_load(path).await? {
        return Ok(rules);
    }
    warn!("no rules file at {}", path.display());
    match bootstrap {
        Bootstrap::Enabled => {
            info!("writing example rules file");
            if let Err(e) = fs::write(path, DEFAULT_RULE).await {
                warn!("failed to write example rules file: {}", e);
                return Ok(Vec::new());
            }
            Ok(try_load(path).await?.unwrap_or_default())
        }
        Bootstrap::Disabled => Ok(Vec::new()),
    }
}

/// Returns `Ok(None)` when the file does not exist. Any other failure to open
/// a file that stat just saw is an error. A read failure mid-scan keeps the
/// rules collected up to that point.
async fn try_load(path: &Path) -> Result<Option<Vec<Rule>>, LoadError> {
    if let Err(e) = fs::metadata(path).await {
        if e.kind() == io::ErrorKind::NotFound {
            return Ok(None);
        }
    }
    let file = File::open(path).await.map_err(LoadError::Open)?;
    let mut lines = BufReader::new(file).lines();
    let mut rules = Vec::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Rule>() {
                    Ok(rule) => {
                        if rule.from.is_empty() || rule.to.is_empty() {
                            continue;
                        }
                        rules.push(rule);
                    }
                    Err(e) => warn!("skipping malformed rule {:?}: {}", line, e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("error while reading rules file: {}", e);
                break;
            }
        }
    }
    Ok(Some(rules))
}

/// The immutable path to target mapping every request is matched against.
/// Built once before the listener starts accepting; never written afterwards,
/// which is what lets request handlers share it without locks.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RoutingTable {
    routes: HashMap<String, String>,
}

impl RoutingTable {
    pub fn lookup(&self, path: &str) -> Option<&str> {
        self.routes.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<Rule> for RoutingTable {
    /// Sequential insertion: a later rule for the same path overwrites an
    /// earlier one, so the last rule in the file wins.
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut routes = HashMap::new();
        for rule in iter {
            routes.insert(rule.from, rule.to);
        }
        Self { routes }
    }
}
