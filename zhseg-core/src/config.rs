//! # Configuração do Segmentador
//!
//! Parâmetros com valores padrão razoáveis, serializáveis em JSON para que a
//! aplicação embarcadora possa guardá-los junto com o resto da sua
//! configuração.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lexicon::DEFAULT_LOAD_BATCH;

/// Estratégia de corte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutMode {
    /// **Preciso**: caminho de máxima probabilidade no DAG, com o HMM cobrindo
    /// trechos desconhecidos. Indicado para análise de texto.
    Accurate,
    /// **Completo**: todas as palavras do dicionário encontradas na frase,
    /// inclusive sobrepostas. Rápido, mas ambíguo.
    Full,
    /// **Busca**: modo preciso mais os bigramas/trigramas conhecidos dentro de
    /// palavras longas, aumentando o recall de mecanismos de busca.
    Search,
}

impl Default for CutMode {
    fn default() -> Self {
        CutMode::Accurate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub mode: CutMode,
    /// Usa o HMM para trechos que o dicionário não cobre.
    pub hmm: bool,
    /// Tokens aplicados por aquisição do lock de escrita durante cargas.
    pub load_batch_size: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            mode: CutMode::default(),
            hmm: true,
            load_batch_size: DEFAULT_LOAD_BATCH,
        }
    }
}

impl SegmenterConfig {
    /// Lê a configuração de um documento JSON; campos ausentes ficam com o
    /// valor padrão.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SegmenterConfig::default();
        assert_eq!(cfg.mode, CutMode::Accurate);
        assert!(cfg.hmm);
        assert_eq!(cfg.load_batch_size, DEFAULT_LOAD_BATCH);
    }

    #[test]
    fn test_partial_json() {
        let cfg = SegmenterConfig::from_json(r#"{"mode": "search", "hmm": false}"#).unwrap();
        assert_eq!(cfg.mode, CutMode::Search);
        assert!(!cfg.hmm);
        assert_eq!(cfg.load_batch_size, DEFAULT_LOAD_BATCH);
    }

    #[test]
    fn test_invalid_mode_is_error() {
        assert!(SegmenterConfig::from_json(r#"{"mode": "fuzzy"}"#).is_err());
    }
}
