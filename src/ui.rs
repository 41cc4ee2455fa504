//! Interface de terminal do eventsweep: spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`SweepProgress`] acompanha visualmente
//! uma passagem de varredura no terminal.

use chrono::{DateTime, Utc};
use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::EvaluationError;
use crate::sweep::{RecordOutcome, SweepReport};
use crate::window::TransitionDecision;

/// Indicador visual de progresso para uma varredura no terminal.
///
/// Exibe um spinner animado durante a passagem e mensagens coloridas
/// para transições aplicadas (verde), falhas (vermelho) e planos (amarelo).
pub struct SweepProgress {
    // Spinner do indicatif; oculto quando stdout não é um terminal.
    pb: ProgressBar,
    // Estilo verde para transições aplicadas.
    green: Style,
    // Estilo vermelho para falhas.
    red: Style,
    // Estilo amarelo para simulações e avisos.
    yellow: Style,
    // Estilo discreto para registros inalterados.
    dim: Style,
}

impl SweepProgress {
    /// Inicia o spinner com o caminho do store e retorna a instância de progresso.
    pub fn start(store: &str) -> Self {
        let pb = if Term::stdout().is_term() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Sweeping {store}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }

    /// Finaliza o spinner e exibe cada coleção com o resultado por registro.
    pub fn complete(&self, report: &SweepReport) {
        self.pb.finish_and_clear();

        let mode = if report.dry_run { " (dry run)" } else { "" };
        println!("Sweep at {}{mode}", report.now.to_rfc3339());

        for collection in &report.collections {
            println!();
            println!("  {}", Style::new().bold().apply_to(&collection.name));
            for record in &collection.records {
                let line = match &record.outcome {
                    RecordOutcome::Unchanged => {
                        format!("{} {}", self.dim.apply_to("·"), record.record_id)
                    }
                    RecordOutcome::Applied(t) => {
                        format!("{} {} {t}", self.green.apply_to("✓"), record.record_id)
                    }
                    RecordOutcome::AlreadyApplied(t) => format!(
                        "{} {} {t} (already applied)",
                        self.dim.apply_to("="),
                        record.record_id
                    ),
                    RecordOutcome::Planned(t) => {
                        format!("{} {} {t}", self.yellow.apply_to("→"), record.record_id)
                    }
                    RecordOutcome::Failed(kind) => {
                        format!("{} {} {kind}", self.red.apply_to("✗"), record.record_id)
                    }
                };
                println!("    {line}");
            }
        }

        let s = report.summary();
        println!();
        let status_style = if s.failed > 0 { &self.red } else { &self.green };
        println!(
            "{}",
            status_style.apply_to(format!(
                "{} evaluated, {} applied, {} already applied, {} planned, {} unchanged, {} failed",
                s.evaluated, s.applied, s.already_applied, s.planned, s.unchanged, s.failed
            ))
        );
    }

    /// Interrompe o spinner quando a passagem é abortada.
    pub fn abort(&self) {
        self.pb.finish_and_clear();
    }
}

/// Imprime o relatório completo em JSON.
pub fn print_report_json(report: &SweepReport) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Imprime a decisão para uma única janela.
pub fn print_decision(
    now: DateTime<Utc>,
    result: &Result<TransitionDecision, EvaluationError>,
    json: bool,
) {
    if json {
        let value = match result {
            Ok(decision) => serde_json::json!({
                "now": now,
                "decision": decision,
                "transition": decision.transition(),
            }),
            Err(err) => serde_json::json!({
                "now": now,
                "error": err.to_string(),
            }),
        };
        println!("{value}");
        return;
    }

    match result {
        Ok(decision) => {
            let transition = decision
                .transition()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{} {decision} (transition: {transition})",
                Style::new().green().bold().apply_to("✓")
            );
        }
        Err(err) => {
            println!("{} {err}", Style::new().red().bold().apply_to("✗"));
        }
    }
}
