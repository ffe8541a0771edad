//! # Erros do núcleo de segmentação
//!
//! Todas as operações do crate são determinísticas e em memória: ou terminam
//! com sucesso, ou falham imediatamente. Não há retentativas aqui.
//!
//! | Situação                              | Tratamento                          |
//! |---------------------------------------|-------------------------------------|
//! | Frequência ilegível num registro      | [`SegError::MalformedFrequency`]    |
//! | Frequência negativa ou não finita     | [`SegError::InvalidFrequency`] / [`SegError::FrequencyOutOfRange`] |
//! | Palavra ausente no léxico             | `None` (não é erro)                 |
//! | Sequência vazia passada ao Viterbi    | [`SegError::EmptySequence`]         |
//! | Caractere sem emissão para um estado  | piso `MIN_FLOAT` (não é erro)       |

use std::num::ParseFloatError;

/// Erro retornado pelas operações de carga e decodificação.
#[derive(Debug, thiserror::Error)]
pub enum SegError {
    /// O campo de frequência de um registro do dicionário não é um número.
    ///
    /// O léxico mantém tudo o que foi aplicado antes deste registro.
    #[error("linha {line}: frequência inválida {field:?}: {source}")]
    MalformedFrequency {
        line: usize,
        field: String,
        #[source]
        source: ParseFloatError,
    },

    /// Frequência negativa (ou não finita) num registro.
    #[error("linha {line}: frequência fora do intervalo: {value}")]
    InvalidFrequency { line: usize, value: f64 },

    /// Frequência negativa (ou não finita) ao construir um [`Token`] fora do
    /// carregador: `Token::new`, desserialização ou `Segmenter::add_word`.
    ///
    /// [`Token`]: crate::token::Token
    #[error("{word:?}: frequência fora do intervalo: {value}")]
    FrequencyOutOfRange { word: String, value: f64 },

    /// Um token precisa de ao menos um caractere.
    #[error("linha {line}: palavra vazia")]
    EmptyToken { line: usize },

    /// Linha mal formada numa tabela de emissão em texto.
    #[error("tabela de emissão, linha {line}: {reason}")]
    MalformedEmission { line: usize, reason: String },

    /// O decodificador de Viterbi exige ao menos um caractere.
    #[error("sequência vazia não pode ser decodificada")]
    EmptySequence,

    #[error("erro de leitura: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
}

/// Atalho para `Result<T, SegError>`.
pub type Result<T> = std::result::Result<T, SegError>;
