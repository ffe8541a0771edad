//! # zhseg-core — Segmentação de Texto Chinês
//!
//! Texto chinês não separa palavras por espaços. Este crate reúne as peças
//! que um segmentador precisa para encontrar essas fronteiras:
//!
//! 1.  **Léxico** ([`lexicon`]): mapa concorrente `palavra → frequência`,
//!     com `total` e `ln(total)` sempre consistentes.
//! 2.  **Carga** ([`loader`]): leitura preguiçosa de registros
//!     `palavra[ freq[ pos]]` a partir de qualquer `BufRead`.
//! 3.  **HMM** ([`hmm`]): quatro estados `B/M/E/S`, probabilidades fixas em
//!     log-space e tabela de emissão injetada.
//! 4.  **Viterbi** ([`viterbi`]): sequência de estados mais provável.
//! 5.  **Extração** ([`extract`]): estados → palavras.
//! 6.  **Segmentador** ([`segmenter`]): DAG sobre o léxico + HMM para o que o
//!     dicionário não cobre.
//!
//! ## Recarregando o dicionário
//!
//! O léxico só cresce. [`Segmenter::load_dictionary`] e [`load_reader`]
//! acrescentam palavras e sobrescrevem as frequências das que já existem;
//! palavras ausentes do novo arquivo continuam lá. Para trocar de dicionário
//! do zero, crie um novo [`Lexicon`] (ou um novo [`Segmenter`]) e carregue o
//! arquivo nele. [`Segmenter::delete_word`] apenas zera a frequência de uma
//! palavra.
//!
//! ```rust
//! use zhseg_core::{load_reader, Lexicon};
//!
//! let lexicon = Lexicon::new();
//! load_reader(&lexicon, "北京 3\n大学 2\n".as_bytes()).unwrap();
//! load_reader(&lexicon, "北京 5\n".as_bytes()).unwrap();
//! assert_eq!(lexicon.frequency("北京"), Some(5.0));
//! assert_eq!(lexicon.frequency("大学"), Some(2.0));
//!
//! let fresh = Lexicon::new();
//! load_reader(&fresh, "北京 5\n".as_bytes()).unwrap();
//! assert_eq!(fresh.frequency("大学"), None);
//! assert_eq!(fresh.total(), 5.0);
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use zhseg_core::{decode, extract_words, EmissionTable, HmmParams, State};
//!
//! let mut table = EmissionTable::new();
//! table.insert(State::B, '北', -1.0);
//! table.insert(State::E, '京', -1.0);
//! let params = HmmParams::new(table);
//!
//! let runes: Vec<char> = "北京".chars().collect();
//! let decoded = decode(&params, &runes).unwrap();
//! assert_eq!(extract_words(&runes, &decoded.states), vec!["北京"]);
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod hmm;
pub mod lexicon;
pub mod loader;
pub mod segmenter;
pub mod token;
pub mod viterbi;

pub use config::{CutMode, SegmenterConfig};
pub use error::{Result, SegError};
pub use extract::{cut_hmm, extract_words};
pub use hmm::{EmissionTable, HmmParams, State, MIN_FLOAT};
pub use lexicon::{Lexicon, LexiconStats, LexiconView};
pub use loader::{load_reader, parse_record, TokenReader};
pub use segmenter::Segmenter;
pub use token::Token;
pub use viterbi::{decode, Decoded};
