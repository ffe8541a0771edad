//! # Extrator de Segmentos
//!
//! Converte a sequência de estados `B/M/E/S` produzida pelo Viterbi em
//! palavras, numa varredura linear:
//!
//! - `B` abre um novo buffer;
//! - `M` continua o buffer;
//! - `E` fecha o buffer e emite a palavra;
//! - `S` emite o caractere sozinho.
//!
//! Também expõe o corte "só HMM" ([`cut_hmm`]): blocos Han passam pelo
//! Viterbi, o restante (números, letras latinas, pontuação) sai como está.

use std::sync::OnceLock;

use regex::Regex;

use crate::hmm::{HmmParams, State};
use crate::viterbi::decode;

/// Agrupa `runes` em palavras segundo `states`.
///
/// A concatenação do resultado reproduz `runes` exatamente: um buffer que
/// não foi fechado por `E` é emitido no fim (ou quando um novo `B`/`S`
/// começa).
///
/// # Panics
/// Se `runes` e `states` tiverem tamanhos diferentes (erro de programação).
pub fn extract_words(runes: &[char], states: &[State]) -> Vec<String> {
    assert_eq!(
        runes.len(),
        states.len(),
        "sequência de estados deve ter o mesmo tamanho da entrada"
    );

    let mut words = Vec::new();
    let mut buf = String::new();

    for (&ch, &state) in runes.iter().zip(states) {
        match state {
            State::B => {
                flush(&mut words, &mut buf);
                buf.push(ch);
            }
            State::M => buf.push(ch),
            State::E => {
                buf.push(ch);
                flush(&mut words, &mut buf);
            }
            State::S => {
                flush(&mut words, &mut buf);
                words.push(ch.to_string());
            }
        }
    }
    flush(&mut words, &mut buf);

    words
}

fn flush(words: &mut Vec<String>, buf: &mut String) {
    if !buf.is_empty() {
        words.push(std::mem::take(buf));
    }
}

fn re_han() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{Han}+").expect("regex Han válida"))
}

fn re_skip() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-zA-Z0-9]+(?:\.\d+)?%?").expect("regex alfanumérica válida"))
}

/// Divide `text` pelas ocorrências de `re`, mantendo os separadores.
/// Cada pedaço vem acompanhado de `true` quando é uma ocorrência do padrão.
pub(crate) fn split_keep<'t>(re: &Regex, text: &'t str) -> Vec<(&'t str, bool)> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            pieces.push((&text[last..m.start()], false));
        }
        pieces.push((m.as_str(), true));
        last = m.end();
    }
    if last < text.len() {
        pieces.push((&text[last..], false));
    }
    pieces
}

/// Segmenta `sentence` usando apenas o HMM, sem dicionário.
pub fn cut_hmm(params: &HmmParams, sentence: &str) -> Vec<String> {
    let mut words = Vec::new();

    for (block, is_han) in split_keep(re_han(), sentence) {
        if is_han {
            let runes: Vec<char> = block.chars().collect();
            // Blocos Han nunca são vazios, então decode não falha
            match decode(params, &runes) {
                Ok(decoded) => words.extend(extract_words(&runes, &decoded.states)),
                Err(_) => words.push(block.to_string()),
            }
            continue;
        }
        words.extend(split_keep(re_skip(), block).into_iter().map(|(piece, _)| piece.to_string()));
    }

    words
}

impl HmmParams {
    /// Atalho para [`cut_hmm`].
    pub fn cut(&self, sentence: &str) -> Vec<String> {
        cut_hmm(self, sentence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::EmissionTable;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_extract_basic() {
        use State::*;
        let runes = chars("我来到北京清华大学");
        let states = [S, B, E, B, E, B, M, M, E];
        let words = extract_words(&runes, &states);
        assert_eq!(words, vec!["我", "来到", "北京", "清华大学"]);
    }

    #[test]
    fn test_extract_covers_input_even_if_unterminated() {
        use State::*;
        let runes = chars("今天天气好");
        let states = [B, M, S, M, B];
        let words = extract_words(&runes, &states);
        assert_eq!(words.concat(), "今天天气好");
        assert_eq!(words, vec!["今天", "天", "气", "好"]);
    }

    #[test]
    #[should_panic]
    fn test_extract_length_mismatch_panics() {
        extract_words(&chars("北京"), &[State::S]);
    }

    #[test]
    fn test_decoded_partition_reconstructs_input() {
        let mut table = EmissionTable::new();
        for (i, ch) in "小明硕士毕业于中国科学院".chars().enumerate() {
            let state = State::ALL[i % 4];
            table.insert(state, ch, -1.0 - i as f64 * 0.1);
            table.insert(State::S, ch, -3.0);
        }
        let params = HmmParams::new(table);
        let runes = chars("小明硕士毕业于中国科学院");
        let decoded = decode(&params, &runes).unwrap();
        let words = extract_words(&runes, &decoded.states);
        assert_eq!(words.concat(), "小明硕士毕业于中国科学院");
        assert!(words.iter().all(|w| !w.is_empty()));
    }

    #[test]
    fn test_cut_hmm_keeps_non_han_blocks() {
        let mut table = EmissionTable::new();
        table.insert(State::B, '北', -1.0);
        table.insert(State::E, '京', -1.0);
        let params = HmmParams::new(table);

        let words = params.cut("去北京 2.5% abc!");
        assert_eq!(words.concat(), "去北京 2.5% abc!");
        assert!(words.contains(&"2.5%".to_string()));
        assert!(words.contains(&"abc".to_string()));
        assert!(words.contains(&"北京".to_string()));
    }

    #[test]
    fn test_split_keep() {
        let re = Regex::new(r"\d+").unwrap();
        let pieces = split_keep(&re, "a12b3");
        assert_eq!(pieces, vec![("a", false), ("12", true), ("b", false), ("3", true)]);
    }
}
