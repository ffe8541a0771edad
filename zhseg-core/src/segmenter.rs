//! # Segmentador Baseado em Dicionário
//!
//! Consumidor do [`Lexicon`] e do HMM. Para cada bloco de texto:
//!
//! 1. **DAG**: para cada posição `k`, todas as posições `i` tais que
//!    `runes[k..=i]` é uma palavra com frequência positiva. Os prefixos com
//!    frequência 0 permitem continuar a busca sem aceitar o fragmento.
//! 2. **Rota**: programação dinâmica de trás para frente maximizando
//!    `Σ ln(freq) - ln(total)`.
//! 3. **HMM**: sequências de caracteres isolados que o dicionário não
//!    reconhece são entregues ao Viterbi ([`cut_hmm`]).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use zhseg_core::{EmissionTable, HmmParams, Segmenter};
//!
//! let seg = Segmenter::new(HmmParams::new(EmissionTable::new()));
//! seg.load_dictionary("我 100 r\n来到 50 v\n北京 80 ns\n".as_bytes()).unwrap();
//!
//! let words = seg.cut("我来到北京", true);
//! assert_eq!(words, vec!["我", "来到", "北京"]);
//! ```

use std::io::BufRead;
use std::sync::{Arc, OnceLock};

use rayon::prelude::*;
use regex::Regex;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::{CutMode, SegmenterConfig};
use crate::error::Result;
use crate::extract::{cut_hmm, split_keep};
use crate::hmm::HmmParams;
use crate::lexicon::{Lexicon, LexiconView};
use crate::loader::load_reader;
use crate::token::Token;

fn re_han_default() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{Han}a-zA-Z0-9+#&._]+").expect("regex de bloco válida"))
}

fn re_skip_default() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r\n|\s").expect("regex de espaço válida"))
}

fn re_han_cut_all() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{Han}+").expect("regex Han válida"))
}

fn re_skip_cut_all() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9+#\n]").expect("regex de separador válida"))
}

/// `dag[k]` = posições finais das palavras que começam em `k`.
type Dag = Vec<Vec<usize>>;

/// Melhor rota a partir de cada posição: (log-probabilidade, fim da palavra).
type Routes = Vec<(f64, usize)>;

/// Segmentador que combina o léxico compartilhado com o HMM.
pub struct Segmenter {
    lexicon: Arc<Lexicon>,
    hmm: HmmParams,
    config: SegmenterConfig,
}

impl Segmenter {
    /// Segmentador com léxico vazio e configuração padrão.
    pub fn new(hmm: HmmParams) -> Self {
        Self::with_config(hmm, SegmenterConfig::default())
    }

    pub fn with_config(hmm: HmmParams, config: SegmenterConfig) -> Self {
        let lexicon = Arc::new(Lexicon::with_batch_size(config.load_batch_size));
        Self::with_lexicon(lexicon, hmm, config)
    }

    /// Usa um léxico já existente (possivelmente compartilhado com outros
    /// segmentadores).
    pub fn with_lexicon(lexicon: Arc<Lexicon>, hmm: HmmParams, config: SegmenterConfig) -> Self {
        Self { lexicon, hmm, config }
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    pub fn hmm(&self) -> &HmmParams {
        &self.hmm
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Carrega registros `palavra[ freq[ pos]]` de `reader`. Entradas
    /// existentes são sobrescritas; nada é apagado. Para começar de um
    /// léxico vazio, crie outro `Segmenter`.
    pub fn load_dictionary<R: BufRead>(&self, reader: R) -> Result<usize> {
        load_reader(&self.lexicon, reader)
    }

    pub fn frequency(&self, word: &str) -> Option<f64> {
        self.lexicon.frequency(word)
    }

    /// Insere ou sobrescreve uma palavra. Frequências negativas ou não
    /// finitas são recusadas e o léxico fica intacto.
    pub fn add_word(&self, word: &str, frequency: f64) -> Result<()> {
        self.lexicon.add_token(&Token::new(word, frequency, None)?);
        debug!(word, frequency, "palavra adicionada ao léxico");
        Ok(())
    }

    /// "Remove" uma palavra zerando sua frequência: ela continua conhecida
    /// como prefixo, mas deixa de ser aceita pelo DAG.
    pub fn delete_word(&self, word: &str) {
        self.lexicon.add_token(&Token::word(word));
        debug!(word, "palavra zerada no léxico");
    }

    /// Sugere uma frequência para forçar (ou impedir) que uma palavra seja
    /// cortada.
    ///
    /// - Uma palavra (`["石墨烯"]`): frequência mínima para que ela saia
    ///   inteira.
    /// - Várias palavras (`["今天", "天气"]`): frequência máxima da junção
    ///   para que ela seja cortada nessas partes.
    pub fn suggest_frequency(&self, words: &[&str]) -> f64 {
        match words {
            [] => 0.0,
            [word] => {
                let segments = self.cut(word, false);
                let view = self.lexicon.view();
                let total = view.total();
                let mut frequency = 1.0;
                for segment in &segments {
                    if let Some(f) = view.frequency(segment) {
                        frequency *= f;
                    }
                    frequency /= total;
                }
                let frequency = (frequency * total).trunc() + 1.0;
                frequency.max(view.frequency(word).unwrap_or(1.0))
            }
            _ => {
                let view = self.lexicon.view();
                let total = view.total();
                let mut frequency = 1.0;
                for word in words {
                    if let Some(f) = view.frequency(word) {
                        frequency *= f;
                    }
                    frequency /= total;
                }
                let frequency = (frequency * total).trunc();
                frequency.min(view.frequency(&words.concat()).unwrap_or(0.0))
            }
        }
    }

    /// Modo preciso. `hmm` liga o reconhecimento de palavras fora do
    /// dicionário.
    pub fn cut(&self, sentence: &str, hmm: bool) -> Vec<String> {
        let mut words = Vec::new();

        for (block, is_word_block) in split_keep(re_han_default(), sentence) {
            if is_word_block {
                let runes: Vec<char> = block.chars().collect();
                if hmm {
                    self.cut_dag(&runes, &mut words);
                } else {
                    self.cut_dag_no_hmm(&runes, &mut words);
                }
                continue;
            }

            for (piece, is_space) in split_keep(re_skip_default(), block) {
                if is_space {
                    words.push(piece.to_string());
                } else {
                    words.extend(piece.graphemes(true).map(str::to_string));
                }
            }
        }

        words
    }

    /// Modo completo: todas as palavras do dicionário presentes na frase.
    pub fn cut_all(&self, sentence: &str) -> Vec<String> {
        let mut words = Vec::new();

        for (block, is_han) in split_keep(re_han_cut_all(), sentence) {
            if !is_han {
                words.extend(
                    re_skip_cut_all()
                        .split(block)
                        .filter(|piece| !piece.is_empty())
                        .map(str::to_string),
                );
                continue;
            }

            let runes: Vec<char> = block.chars().collect();
            let dag = {
                let view = self.lexicon.view();
                build_dag(&view, &runes)
            };

            let mut last_end: Option<usize> = None;
            for (k, ends) in dag.iter().enumerate() {
                if ends.len() == 1 && last_end.map_or(true, |end| k > end) {
                    words.push(runes[k..=ends[0]].iter().collect());
                    last_end = Some(ends[0]);
                    continue;
                }
                for &end in ends.iter().filter(|&&end| end > k) {
                    words.push(runes[k..=end].iter().collect());
                    last_end = Some(end);
                }
            }
        }

        words
    }

    /// Modo busca: modo preciso mais os bigramas e trigramas conhecidos
    /// contidos em palavras mais longas.
    pub fn cut_for_search(&self, sentence: &str, hmm: bool) -> Vec<String> {
        let words = self.cut(sentence, hmm);
        let view = self.lexicon.view();
        let mut result = Vec::with_capacity(words.len());

        for word in words {
            let runes: Vec<char> = word.chars().collect();
            for n in [2, 3] {
                if runes.len() <= n {
                    continue;
                }
                for gram in runes.windows(n) {
                    let gram: String = gram.iter().collect();
                    if view.frequency(&gram).is_some_and(|f| f > 0.0) {
                        result.push(gram);
                    }
                }
            }
            result.push(word);
        }

        result
    }

    /// Corta segundo `config.mode` e `config.hmm`.
    pub fn cut_with_mode(&self, sentence: &str) -> Vec<String> {
        match self.config.mode {
            CutMode::Accurate => self.cut(sentence, self.config.hmm),
            CutMode::Full => self.cut_all(sentence),
            CutMode::Search => self.cut_for_search(sentence, self.config.hmm),
        }
    }

    /// Segmenta várias frases em paralelo (Rayon). A ordem da saída
    /// acompanha a da entrada.
    pub fn cut_batch(&self, sentences: &[&str]) -> Vec<Vec<String>> {
        sentences
            .par_iter()
            .map(|sentence| self.cut_with_mode(sentence))
            .collect()
    }

    fn cut_dag(&self, runes: &[char], words: &mut Vec<String>) {
        let view = self.lexicon.view();
        let routes = calc_routes(&view, runes);

        let mut buf: Vec<char> = Vec::new();
        let mut x = 0;
        while x < runes.len() {
            let y = routes[x].1 + 1;
            if y - x == 1 {
                buf.push(runes[x]);
            } else {
                self.flush_unknown(&view, &mut buf, words);
                words.push(runes[x..y].iter().collect());
            }
            x = y;
        }
        self.flush_unknown(&view, &mut buf, words);
    }

    /// Esvazia uma sequência de caracteres isolados: se ela não for uma
    /// palavra conhecida, o HMM decide as fronteiras.
    fn flush_unknown(&self, view: &LexiconView<'_>, buf: &mut Vec<char>, words: &mut Vec<String>) {
        match buf.len() {
            0 => return,
            1 => words.push(buf[0].to_string()),
            _ => {
                let text: String = buf.iter().collect();
                if view.frequency(&text).is_some_and(|f| f > 0.0) {
                    words.extend(buf.iter().map(char::to_string));
                } else {
                    words.extend(cut_hmm(&self.hmm, &text));
                }
            }
        }
        buf.clear();
    }

    fn cut_dag_no_hmm(&self, runes: &[char], words: &mut Vec<String>) {
        let routes = {
            let view = self.lexicon.view();
            calc_routes(&view, runes)
        };

        // Letras e dígitos ASCII soltos são reagrupados ("abc", "2024")
        let mut buf = String::new();
        let mut x = 0;
        while x < runes.len() {
            let y = routes[x].1 + 1;
            let frag = &runes[x..y];
            if frag.len() == 1 && frag[0].is_ascii_alphanumeric() {
                buf.push(frag[0]);
            } else {
                if !buf.is_empty() {
                    words.push(std::mem::take(&mut buf));
                }
                words.push(frag.iter().collect());
            }
            x = y;
        }
        if !buf.is_empty() {
            words.push(buf);
        }
    }
}

fn build_dag(view: &LexiconView<'_>, runes: &[char]) -> Dag {
    let n = runes.len();
    let mut dag = Vec::with_capacity(n);

    for k in 0..n {
        let mut ends = Vec::new();
        let mut frag = String::new();
        for (i, &ch) in runes.iter().enumerate().skip(k) {
            frag.push(ch);
            match view.frequency(&frag) {
                None => break,
                Some(f) if f > 0.0 => ends.push(i),
                Some(_) => {}
            }
        }
        if ends.is_empty() {
            ends.push(k);
        }
        dag.push(ends);
    }

    dag
}

/// Programação dinâmica da direita para a esquerda sobre o DAG. Empates
/// ficam com a palavra mais longa.
fn calc_routes(view: &LexiconView<'_>, runes: &[char]) -> Routes {
    let n = runes.len();
    let dag = build_dag(view, runes);
    let log_total = view.log_total();

    let mut routes: Routes = vec![(0.0, 0); n + 1];
    for idx in (0..n).rev() {
        let mut best: Option<(f64, usize)> = None;
        for &end in &dag[idx] {
            let word: String = runes[idx..=end].iter().collect();
            // Palavras ausentes (ou só prefixos) contam como frequência 1
            let freq = view.frequency(&word).filter(|&f| f > 0.0).unwrap_or(1.0);
            let score = freq.ln() - log_total + routes[end + 1].0;
            best = match best {
                Some((s, e)) if s > score || (s == score && e >= end) => Some((s, e)),
                _ => Some((score, end)),
            };
        }
        routes[idx] = best.unwrap_or((f64::NEG_INFINITY, idx));
    }

    routes
}
