//! # Leitura de Registros do Dicionário
//!
//! Formato orientado a linhas, campos separados por espaço:
//!
//! ```text
//! 北京 3 ns
//! 大学 2 n
//! 清华
//! ```
//!
//! - o primeiro campo é a palavra (um BOM inicial é removido);
//! - o segundo, opcional, é a frequência (padrão 0);
//! - o terceiro, opcional, é a classe gramatical.
//!
//! A leitura é preguiçosa: [`TokenReader`] produz um token por linha sem
//! carregar o arquivo inteiro, e [`load_reader`] entrega esse fluxo ao
//! [`Lexicon`] em lotes.

use std::io::{BufRead, Lines};

use tracing::warn;

use crate::error::{Result, SegError};
use crate::lexicon::Lexicon;
use crate::token::Token;

const BOM: char = '\u{feff}';

/// Interpreta uma linha do dicionário.
///
/// Linhas em branco (inclusive uma linha só com o BOM) retornam `Ok(None)`.
/// `line_no` só é usado nas mensagens de erro.
pub fn parse_record(line: &str, line_no: usize) -> Result<Option<Token>> {
    let line = line.trim_start();
    let line = line.strip_prefix(BOM).unwrap_or(line);
    let mut fields = line.split_whitespace();

    let Some(text) = fields.next() else {
        return Ok(None);
    };
    if text.chars().all(|c| c == BOM) {
        return Err(SegError::EmptyToken { line: line_no });
    }

    let frequency = match fields.next() {
        Some(field) => {
            let value: f64 = field.parse().map_err(|source| SegError::MalformedFrequency {
                line: line_no,
                field: field.to_string(),
                source,
            })?;
            if !value.is_finite() || value < 0.0 {
                return Err(SegError::InvalidFrequency { line: line_no, value });
            }
            value
        }
        None => 0.0,
    };

    let pos = fields.next();
    Token::new(text, frequency, pos).map(Some)
}

/// Iterador preguiçoso de tokens sobre qualquer `BufRead`.
pub struct TokenReader<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> TokenReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for TokenReader<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            match parse_record(&line, self.line_no) {
                Ok(Some(token)) => return Some(Ok(token)),
                Ok(None) => continue,
                Err(e) => {
                    warn!(line = self.line_no, error = %e, "registro de dicionário inválido");
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Carrega todos os registros de `reader` em `lexicon`.
///
/// Retorna quantos tokens foram aplicados. No primeiro registro inválido a
/// carga para e o erro é devolvido; o que já entrou no léxico permanece.
pub fn load_reader<R: BufRead>(lexicon: &Lexicon, reader: R) -> Result<usize> {
    lexicon.try_load_tokens(TokenReader::new(reader))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let token = parse_record("北京 0.03 ns", 1).unwrap().unwrap();
        assert_eq!(token.text(), "北京");
        assert_eq!(token.frequency(), 0.03);
        assert_eq!(token.pos(), Some("ns"));
    }

    #[test]
    fn test_parse_strips_bom_and_defaults() {
        let token = parse_record("\u{feff}清华", 1).unwrap().unwrap();
        assert_eq!(token.text(), "清华");
        assert_eq!(token.frequency(), 0.0);
        assert_eq!(token.pos(), None);
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(parse_record("   ", 4).unwrap().is_none());
    }

    #[test]
    fn test_parse_bom_only_line_is_blank() {
        assert!(parse_record("\u{feff}", 1).unwrap().is_none());
        assert!(parse_record("\u{feff}   ", 1).unwrap().is_none());
    }

    #[test]
    fn test_parse_word_made_only_of_bom() {
        let err = parse_record("\u{feff}\u{feff} 3", 5).unwrap_err();
        assert!(matches!(err, SegError::EmptyToken { line: 5 }));
    }

    #[test]
    fn test_load_reader_bom_on_its_own_line() {
        let lex = Lexicon::new();
        let loaded = load_reader(&lex, "\u{feff}\n北京 3\n".as_bytes()).unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(lex.frequency("北京"), Some(3.0));
    }

    #[test]
    fn test_parse_malformed_frequency() {
        let err = parse_record("北京 abc ns", 7).unwrap_err();
        match err {
            SegError::MalformedFrequency { line, field, .. } => {
                assert_eq!(line, 7);
                assert_eq!(field, "abc");
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn test_parse_negative_frequency() {
        let err = parse_record("北京 -1", 2).unwrap_err();
        assert!(matches!(err, SegError::InvalidFrequency { line: 2, .. }));
    }

    #[test]
    fn test_load_reader_full() {
        let lex = Lexicon::new();
        let dict = "\u{feff}北京 0.03 ns\n大学 0.02 n\n\n";
        let loaded = load_reader(&lex, dict.as_bytes()).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(lex.frequency("北京"), Some(0.03));
        assert_eq!(lex.frequency("北"), Some(0.0));
        assert_eq!(lex.frequency("清华"), None);
    }

    #[test]
    fn test_load_reader_partial_on_error() {
        let lex = Lexicon::new();
        let dict = "北京 3 ns\n上海 x\n广州 1\n";
        let err = load_reader(&lex, dict.as_bytes()).unwrap_err();
        assert!(matches!(err, SegError::MalformedFrequency { line: 2, .. }));
        assert_eq!(lex.frequency("北京"), Some(3.0));
        assert_eq!(lex.frequency("广州"), None);
        assert!((lex.log_total() - 3.0f64.ln()).abs() < 1e-12);
    }
}
