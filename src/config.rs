//! Configuração do edgediag.
//!
//! Duas fontes:
//! - as credenciais EdgeGrid, lidas de uma seção do arquivo `.edgerc`
//!   (formato INI). As variáveis de ambiente `AKAMAI_*` têm precedência
//!   sobre o arquivo;
//! - os parâmetros da própria ferramenta, em `edgediag.toml` no diretório
//!   atual. Valores ausentes usam defaults sensíveis.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::api::{Credentials, DEFAULT_MAX_BODY};
use crate::translation::{DEFAULT_RETRIES, FIRST_ATTEMPT_COST, PollPolicy, RATE_LIMIT_WAIT_SECS};

/// Nome do arquivo de parâmetros procurado no diretório atual.
pub const SETTINGS_FILE: &str = "edgediag.toml";

/// Seção do `.edgerc` usada quando `--section` não é informado.
pub const DEFAULT_SECTION: &str = "default";

/// Parâmetros da ferramenta carregados de `edgediag.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Orçamento de tentativas de polling por tradução.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Unidades do orçamento consumidas pela primeira consulta.
    #[serde(default = "default_first_attempt_cost")]
    pub first_attempt_cost: u32,

    /// Espera única, em segundos, quando o servidor limita requisições.
    #[serde(default = "default_rate_limit_wait_secs")]
    pub rate_limit_wait_secs: u64,

    /// Timeout de cada chamada HTTP, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_first_attempt_cost() -> u32 {
    FIRST_ATTEMPT_COST
}

fn default_rate_limit_wait_secs() -> u64 {
    RATE_LIMIT_WAIT_SECS
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            first_attempt_cost: default_first_attempt_cost(),
            rate_limit_wait_secs: default_rate_limit_wait_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Settings {
    /// Carrega `edgediag.toml` do diretório atual, ou os defaults se ele não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings = toml::from_str::<Settings>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(settings)
    }

    /// Política de polling; `retries` da linha de comando vence o arquivo.
    pub fn poll_policy(&self, retries: Option<u32>) -> PollPolicy {
        PollPolicy {
            retries: retries.unwrap_or(self.retries),
            first_attempt_cost: self.first_attempt_cost,
            rate_limit_wait: Duration::from_secs(self.rate_limit_wait_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Caminho padrão do `.edgerc`: `~/.edgerc`.
pub fn default_edgerc_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".edgerc"))
}

/// Carrega as credenciais da seção pedida do `.edgerc`.
///
/// O arquivo pode não existir quando todas as variáveis `AKAMAI_*` estão definidas.
pub fn load_credentials(path: &Path, section: &str) -> Result<Credentials> {
    let sections = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_edgerc(&contents).with_context(|| format!("failed to parse {}", path.display()))?
    } else {
        tracing::debug!(path = %path.display(), "edgerc not found, relying on environment");
        HashMap::new()
    };

    credentials_from(&sections, section, |name| {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    })
}

type Sections = HashMap<String, HashMap<String, String>>;

// Variáveis de ambiente com precedência sobre cada chave do arquivo.
const ENV_OVERRIDES: [(&str, &str); 4] = [
    ("host", "AKAMAI_HOST"),
    ("client_token", "AKAMAI_CLIENT_TOKEN"),
    ("client_secret", "AKAMAI_CLIENT_SECRET"),
    ("access_token", "AKAMAI_ACCESS_TOKEN"),
];

fn credentials_from(
    sections: &Sections,
    section: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Credentials> {
    let empty = HashMap::new();
    let values = sections.get(section).unwrap_or(&empty);

    let mut resolved: HashMap<&str, String> = HashMap::new();
    for (key, var) in ENV_OVERRIDES {
        let value = env(var).or_else(|| values.get(key).cloned());
        match value {
            Some(value) => {
                resolved.insert(key, value);
            }
            None if values.is_empty() => {
                bail!("section [{section}] not found in edgerc and {var} is not set")
            }
            None => bail!("missing `{key}` in edgerc section [{section}]"),
        }
    }

    let max_body = match values.get("max_body") {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("invalid `max_body` in edgerc section [{section}]"))?,
        None => DEFAULT_MAX_BODY,
    };

    let mut take = |key: &str| resolved.remove(key).unwrap_or_default();
    Ok(Credentials {
        host: take("host"),
        client_token: take("client_token"),
        client_secret: take("client_secret"),
        access_token: take("access_token"),
        max_body,
    })
}

/// Interpreta o formato INI do `.edgerc`.
fn parse_edgerc(contents: &str) -> Result<Sections> {
    let mut sections = Sections::new();
    let mut current: Option<String> = None;

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            bail!("line {}: expected `key = value`", idx + 1);
        };
        let Some(section) = current.as_ref() else {
            bail!("line {}: `{}` appears before any [section]", idx + 1, key.trim());
        };

        let value = value.trim().trim_matches('"').to_string();
        sections
            .entry(section.clone())
            .or_default()
            .insert(key.trim().to_string(), value);
    }

    Ok(sections)
}
