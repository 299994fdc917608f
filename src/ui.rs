//! Interface de terminal do edgediag — spinner e saída colorida.
//!
//! Usa `indicatif` para o spinner enquanto a tradução é consultada e
//! `console` para estilizar as mensagens finais. Resultados JSON vão para
//! stdout; mensagens de progresso e de erro vão para stderr.

use std::io::{self, Write};
use std::time::Duration;

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use serde_json::Value;

use crate::translation::{Phase, RunSummary};

/// Indicador visual de uma tradução de erro em andamento.
///
/// Exibe um spinner enquanto o job é consultado e uma linha colorida
/// para sucesso (verde) ou falha (vermelho) ao final.
pub struct TranslationProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl TranslationProgress {
    /// Inicia o spinner para o código de erro informado.
    pub fn start(error_code: &str) -> Self {
        let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{}: translating {error_code}", Phase::Init));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finaliza o spinner com a mensagem de sucesso.
    pub fn succeed(&self, request_id: Option<&str>) {
        self.pb.finish_and_clear();
        let suffix = request_id
            .map(|id| format!(" (request {id})"))
            .unwrap_or_default();
        eprintln!(
            "  {} Error translated{suffix}",
            self.green.apply_to("✓")
        );
    }

    /// Finaliza o spinner com a mensagem de falha.
    pub fn fail(&self, reason: &str) {
        self.pb.finish_and_clear();
        eprintln!("  {} {reason}", self.red.apply_to("✗"));
    }

    /// Imprime o resumo da execução em JSON (apenas com --debug).
    pub fn print_summary(&self, summary: &RunSummary) {
        let style = match summary.phases.last() {
            Some(Phase::Succeeded) => &self.green,
            Some(Phase::Failed) => &self.red,
            _ => &self.yellow,
        };
        eprintln!();
        eprintln!("{}", style.apply_to("─── Translation Run ───"));
        eprintln!(
            "{}",
            serde_json::to_string_pretty(summary).unwrap_or_default()
        );
    }
}

/// Imprime um valor serializável como JSON indentado em stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{rendered}")
}

/// Imprime um corpo de resposta: indentado quando é JSON, cru caso contrário.
pub fn print_body(body: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", render_body(body))
}

/// Mensagem de erro em vermelho no stderr.
pub fn print_error(message: &str) {
    let red = Style::new().red().bold();
    let _ = Term::stderr().write_line(&format!("{} {message}", red.apply_to("error:")));
}

fn render_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}
