//! Interface de linha de comando do eventsweep baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (sweep, evaluate)
//! e flags globais (--config, --verbose, --json).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// eventsweep: avança eventos e transmissões no seu ciclo de vida.
#[derive(Debug, Parser)]
#[command(name = "eventsweep", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./eventsweep.toml).
    #[arg(long, short, global = true, env = "EVENTSWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Imprime o resultado como JSON em vez do resumo formatado.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Avalia todos os registros e aplica as transições devidas.
    Sweep {
        /// Restringe a varredura a esta coleção (pode ser repetido).
        #[arg(long = "collection", value_name = "NAME")]
        collections: Vec<String>,

        /// Apenas relata as transições, sem alterar o store.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Instante de referência em RFC 3339 (padrão: agora).
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Caminho do store JSON, sobrepondo a configuração.
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Avalia uma única janela de tempo e mostra a decisão.
    Evaluate {
        /// Início da janela em RFC 3339.
        #[arg(long)]
        start: DateTime<Utc>,

        /// Fim da janela em RFC 3339.
        #[arg(long)]
        end: DateTime<Utc>,

        /// Instante de referência em RFC 3339 (padrão: agora).
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
}
