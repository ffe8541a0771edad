//! # Léxico de Frequências Concorrente
//!
//! Guarda o mapeamento `palavra → frequência` consultado pelo segmentador
//! baseado em dicionário, junto com duas estatísticas derivadas:
//!
//! - `total`: soma das frequências armazenadas;
//! - `log_total`: `ln(total)`, usado na pontuação `ln(freq) - ln(total)`.
//!
//! ## Prefixos
//!
//! Ao inserir "北京大学", os prefixos "北", "北京" e "北京大" também entram no
//! mapa com frequência 0 (se ainda não existirem). Assim a construção do DAG
//! sabe que vale a pena continuar estendendo o fragmento sem confundir o
//! prefixo com uma palavra real.
//!
//! ## Concorrência
//!
//! Um único `RwLock` protege o mapa e os dois escalares. Leitores concorrentes
//! não se bloqueiam; escritores seguram o lock exclusivo apenas pelo tempo de
//! aplicar um lote e recalcular `log_total`. Nenhum leitor observa uma palavra
//! sem seus prefixos, nem um `total` que não corresponda ao `log_total`.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::token::Token;

/// Quantidade de tokens aplicados por aquisição do lock de escrita durante
/// cargas em lote.
pub const DEFAULT_LOAD_BATCH: usize = 4096;

/// Fotografia consistente do léxico, tirada sob um único lock de leitura.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LexiconStats {
    /// Número de chaves, incluindo prefixos com frequência 0.
    pub words: usize,
    pub total: f64,
    pub log_total: f64,
}

/// Estado protegido pelo lock: o mapa e os derivados que dependem dele.
#[derive(Debug)]
struct Entries {
    freq: HashMap<String, f64>,
    total: f64,
    log_total: f64,
    /// Alguma frequência positiva foi sobrescrita: `total` precisa ser
    /// somado de novo a partir do mapa.
    stale_total: bool,
}

impl Entries {
    fn new() -> Self {
        Self {
            freq: HashMap::new(),
            total: 0.0,
            log_total: f64::NEG_INFINITY,
            stale_total: false,
        }
    }

    /// Insere (ou sobrescreve) a palavra e seus prefixos. Não toca em
    /// `log_total`; quem chama recalcula antes de soltar o lock.
    fn insert(&mut self, token: &Token) {
        let text = token.text();
        if text.is_empty() {
            return;
        }

        // Subtrair a frequência antiga acumula erro de arredondamento e pode
        // levar `total` abaixo de zero; sobrescritas forçam a soma exata.
        match self.freq.insert(text.to_string(), token.frequency()) {
            Some(previous) if previous != 0.0 => self.stale_total = true,
            _ => self.total += token.frequency(),
        }

        // Prefixos próprios: "北", "北京", "北京大" para "北京大学"
        for (idx, _) in text.char_indices().skip(1) {
            let prefix = &text[..idx];
            if !self.freq.contains_key(prefix) {
                self.freq.insert(prefix.to_string(), 0.0);
            }
        }
    }

    /// Fecha uma seção de escrita: refaz `total` se necessário e recalcula
    /// `log_total`.
    fn refresh_log_total(&mut self) {
        if self.stale_total {
            self.total = self.freq.values().sum();
            self.stale_total = false;
        }
        self.log_total = self.total.ln();
    }
}

/// Léxico de frequências seguro para uso entre threads.
///
/// Normalmente compartilhado via `Arc<Lexicon>`; todas as operações recebem
/// `&self`.
#[derive(Debug)]
pub struct Lexicon {
    entries: RwLock<Entries>,
    batch_size: usize,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexicon {
    /// Léxico vazio: `total = 0`, `log_total = -∞`.
    pub fn new() -> Self {
        Self::with_batch_size(DEFAULT_LOAD_BATCH)
    }

    /// Léxico vazio com tamanho de lote próprio para cargas em lote.
    /// Um lote menor libera o lock de escrita com mais frequência.
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::new()),
            batch_size: batch_size.max(1),
        }
    }

    /// Insere ou sobrescreve uma palavra, adicionando os prefixos ausentes
    /// com frequência 0 e atualizando `total`/`log_total` na mesma seção
    /// exclusiva.
    pub fn add_token(&self, token: &Token) {
        let mut entries = self.write();
        entries.insert(token);
        entries.refresh_log_total();
    }

    /// Carrega uma sequência de tokens (possivelmente preguiçosa).
    ///
    /// Equivale a chamar [`Lexicon::add_token`] para cada elemento, mas
    /// recalcula `log_total` uma vez por lote. A sequência nunca é
    /// materializada inteira: no máximo um lote fica em memória.
    ///
    /// Retorna quantos tokens foram aplicados.
    pub fn load_tokens<I>(&self, tokens: I) -> usize
    where
        I: IntoIterator<Item = Token>,
    {
        match self.try_load_tokens(tokens.into_iter().map(Ok::<_, Infallible>)) {
            Ok(n) => n,
            Err(never) => match never {},
        }
    }

    /// Variante de [`Lexicon::load_tokens`] para produtores que podem falhar
    /// (ex: um parser lendo linha a linha).
    ///
    /// Para no primeiro erro e o devolve. Tudo o que veio antes dele já está
    /// visível no léxico; a carga parcial não é desfeita.
    pub fn try_load_tokens<I, E>(&self, tokens: I) -> Result<usize, E>
    where
        I: IntoIterator<Item = Result<Token, E>>,
    {
        let mut batch = Vec::with_capacity(self.batch_size.min(DEFAULT_LOAD_BATCH));
        let mut loaded = 0;

        for item in tokens {
            match item {
                Ok(token) => {
                    batch.push(token);
                    if batch.len() >= self.batch_size {
                        loaded += self.apply_batch(&mut batch);
                    }
                }
                Err(err) => {
                    loaded += self.apply_batch(&mut batch);
                    debug!(loaded, "carga interrompida por erro no produtor");
                    return Err(err);
                }
            }
        }

        loaded += self.apply_batch(&mut batch);
        let stats = self.stats();
        info!(loaded, words = stats.words, total = stats.total, "léxico carregado");
        Ok(loaded)
    }

    /// Frequência armazenada, ou `None` se a palavra não existe.
    ///
    /// `Some(0.0)` indica uma palavra conhecida sem frequência (tipicamente um
    /// prefixo inserido automaticamente).
    pub fn frequency(&self, word: &str) -> Option<f64> {
        self.read().freq.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.read().freq.contains_key(word)
    }

    pub fn total(&self) -> f64 {
        self.read().total
    }

    pub fn log_total(&self) -> f64 {
        self.read().log_total
    }

    pub fn len(&self) -> usize {
        self.read().freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().freq.is_empty()
    }

    pub fn stats(&self) -> LexiconStats {
        let entries = self.read();
        LexiconStats {
            words: entries.freq.len(),
            total: entries.total,
            log_total: entries.log_total,
        }
    }

    /// Abre uma visão de leitura consistente: todas as consultas feitas por
    /// ela enxergam o mesmo estado, com `log_total` coerente com as
    /// frequências. Escritores esperam até a visão ser descartada.
    pub fn view(&self) -> LexiconView<'_> {
        LexiconView { entries: self.read() }
    }

    fn apply_batch(&self, batch: &mut Vec<Token>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        let mut entries = self.write();
        for token in batch.iter() {
            entries.insert(token);
        }
        entries.refresh_log_total();
        let n = batch.len();
        debug!(tokens = n, total = entries.total, "lote aplicado ao léxico");
        batch.clear();
        n
    }

    // Os escritores nunca entram em pânico com o lock tomado, então um lock
    // envenenado ainda guarda um estado coerente.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Visão somente-leitura mantida sob o lock compartilhado.
pub struct LexiconView<'a> {
    entries: RwLockReadGuard<'a, Entries>,
}

impl LexiconView<'_> {
    pub fn frequency(&self, word: &str) -> Option<f64> {
        self.entries.freq.get(word).copied()
    }

    pub fn total(&self) -> f64 {
        self.entries.total
    }

    pub fn log_total(&self) -> f64 {
        self.entries.log_total
    }
}
