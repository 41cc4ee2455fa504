//! Configuração do eventsweep carregada a partir de `eventsweep.toml`.
//!
//! A struct [`SweepConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `EVENTSWEEP_STORE` tem precedência sobre o arquivo
//! para o caminho do store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SweepError;

const DEFAULT_CONFIG_FILE: &str = "eventsweep.toml";
const STORE_ENV_VAR: &str = "EVENTSWEEP_STORE";

/// Configuração de nível superior carregada de `eventsweep.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Caminho do documento JSON com os registros.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Quando verdadeiro, apenas relata as transições sem aplicá-las.
    #[serde(default)]
    pub dry_run: bool,

    /// Nível de log padrão quando `RUST_LOG` não está definido.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Coleções varridas em cada passagem, na ordem declarada.
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionSchema>,
}

/// Onde encontrar as datas de início e fim dos registros de uma coleção.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionSchema {
    pub name: String,

    #[serde(default = "default_start_field")]
    pub start_field: String,

    #[serde(default = "default_end_field")]
    pub end_field: String,
}

impl CollectionSchema {
    /// Coleção com os nomes de campo padrão ("Start Date" / "End Date").
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_field: default_start_field(),
            end_field: default_end_field(),
        }
    }
}

// Valor padrão para o store: "records.json".
fn default_store_path() -> PathBuf {
    PathBuf::from("records.json")
}

// Valor padrão para o nível de log: "info".
fn default_log_level() -> String {
    "info".to_string()
}

// Eventos primeiro, depois transmissões.
fn default_collections() -> Vec<CollectionSchema> {
    vec![
        CollectionSchema::new("events"),
        CollectionSchema::new("transmissions"),
    ]
}

fn default_start_field() -> String {
    "Start Date".to_string()
}

fn default_end_field() -> String {
    "End Date".to_string()
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            dry_run: false,
            log_level: default_log_level(),
            collections: default_collections(),
        }
    }
}

impl SweepConfig {
    /// Carrega a configuração de `path`, ou de `eventsweep.toml` no diretório atual.
    ///
    /// Um caminho explícito precisa existir; o arquivo padrão é opcional e
    /// os valores padrão são usados se ele não existir.
    pub fn load(path: Option<&Path>) -> Result<Self, SweepError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração para o store.
        if let Ok(store) = std::env::var(STORE_ENV_VAR)
            && !store.is_empty()
        {
            config.store_path = PathBuf::from(store);
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, SweepError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<SweepConfig>(&contents)?)
    }

    /// Rejeita listas de coleções vazias ou com nomes repetidos.
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.collections.is_empty() {
            return Err(SweepError::Config(
                "at least one collection must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        for collection in &self.collections {
            if collection.name.trim().is_empty() {
                return Err(SweepError::Config("collection name must not be empty".into()));
            }
            if !seen.insert(collection.name.as_str()) {
                return Err(SweepError::Config(format!(
                    "collection `{}` is configured more than once",
                    collection.name
                )));
            }
        }
        Ok(())
    }

    /// Restringe a varredura às coleções nomeadas, mantendo a ordem configurada.
    pub fn select_collections(&mut self, names: &[String]) -> Result<(), SweepError> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.collections.iter().any(|c| &c.name == *name))
        {
            return Err(SweepError::Config(format!(
                "collection `{unknown}` is not configured"
            )));
        }
        self.collections.retain(|c| names.contains(&c.name));
        Ok(())
    }
}
