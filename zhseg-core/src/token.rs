//! # Token do dicionário
//!
//! Um `Token` é um registro do dicionário já interpretado: a palavra, sua
//! frequência e, opcionalmente, a classe gramatical (part-of-speech).
//! É imutável depois de construído; o léxico só copia o texto e a frequência.
//!
//! A frequência é sempre finita e `>= 0`. Todo caminho de construção passa
//! por [`Token::new`], inclusive a desserialização.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegError};

/// Registro imutável `palavra[ frequência[ pos]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TokenRecord")]
pub struct Token {
    text: String,
    frequency: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pos: Option<String>,
}

/// Forma crua aceita pelo serde antes da validação.
#[derive(Deserialize)]
struct TokenRecord {
    text: String,
    frequency: f64,
    #[serde(default)]
    pos: Option<String>,
}

impl TryFrom<TokenRecord> for Token {
    type Error = SegError;

    fn try_from(record: TokenRecord) -> Result<Self> {
        Token::new(record.text, record.frequency, record.pos.as_deref())
    }
}

impl Token {
    /// Cria um token. `pos` vazio é tratado como ausente.
    ///
    /// Frequências negativas, `NaN` ou infinitas são rejeitadas com
    /// [`SegError::FrequencyOutOfRange`].
    pub fn new(text: impl Into<String>, frequency: f64, pos: Option<&str>) -> Result<Self> {
        let text = text.into();
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(SegError::FrequencyOutOfRange {
                word: text,
                value: frequency,
            });
        }
        Ok(Self {
            text,
            frequency,
            pos: pos.filter(|p| !p.is_empty()).map(str::to_string),
        })
    }

    /// Token sem frequência conhecida (frequência 0).
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            frequency: 0.0,
            pos: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Classe gramatical, se o registro trouxer uma (ex: "ns", "n", "v").
    pub fn pos(&self) -> Option<&str> {
        self.pos.as_deref()
    }
}
