use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, bail};
use logbook_crypto::CostParams;

pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Testing,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "testing" | "test" => Ok(Self::Testing),
            other => bail!("LOGBOOK_ENV must be development, production or testing (got '{other}')"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub db_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub hash_cost: CostParams,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let environment: Environment = match lookup("LOGBOOK_ENV") {
            Some(v) => v.parse()?,
            None => Environment::Development,
        };

        let db_path = match environment {
            Environment::Testing => PathBuf::from(IN_MEMORY),
            _ => lookup("LOGBOOK_DB_PATH")
                .unwrap_or_else(|| "logbook.db".into())
                .into(),
        };

        let host = parse_or(&lookup, "LOGBOOK_HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port = parse_or(&lookup, "LOGBOOK_PORT", 5000)?;

        let defaults = CostParams::default();
        let hash_cost = CostParams {
            memory_kib: parse_or(&lookup, "LOGBOOK_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "LOGBOOK_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "LOGBOOK_HASH_PARALLELISM", defaults.parallelism)?,
        };

        if environment == Environment::Production && hash_cost.is_weaker_than(&defaults) {
            bail!(
                "Password hashing cost {:?} is below the production minimum {:?}",
                hash_cost,
                defaults
            );
        }

        Ok(Self {
            environment,
            db_path,
            host,
            port,
            hash_cost,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
