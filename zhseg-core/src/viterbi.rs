//! # Algoritmo de Viterbi — Decodificação BMES
//!
//! Encontra a sequência de estados `B/M/E/S` mais provável para uma sequência
//! de caracteres, por **programação dinâmica** em log-space.
//!
//! ```text
//! Inicialização: V[0][y] = start(y) + emit(y, c_0)
//!
//! Recursão:      V[t][y] = max_{y0 ∈ prev(y)} [V[t-1][y0] + trans(y0, y)] + emit(y, c_t)
//!
//! Terminação:    melhor entre V[n-1][E] e V[n-1][S]
//! ```
//!
//! Empates são resolvidos a favor do estado maior na ordem `B < E < M < S`,
//! o que torna a saída reprodutível bit a bit.
//!
//! A treliça é alocada a cada chamada e pertence só a ela; decodificações
//! simultâneas não compartilham nada mutável.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegError};
use crate::hmm::{HmmParams, State};

const N_STATES: usize = State::ALL.len();

/// Resultado de uma decodificação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoded {
    /// Log-probabilidade do melhor caminho.
    pub score: f64,
    /// Um estado por caractere de entrada.
    pub states: Vec<State>,
}

/// Treliça transitória: score acumulado e ponteiro de retorno por
/// (posição, estado).
struct Trellis {
    scores: Vec<[f64; N_STATES]>,
    backptr: Vec<[State; N_STATES]>,
}

impl Trellis {
    fn with_len(n: usize) -> Self {
        Self {
            scores: vec![[0.0; N_STATES]; n],
            backptr: vec![State::ALL; n],
        }
    }

    fn score(&self, t: usize, state: State) -> f64 {
        self.scores[t][state.index()]
    }

    fn set(&mut self, t: usize, state: State, score: f64, prev: State) {
        self.scores[t][state.index()] = score;
        self.backptr[t][state.index()] = prev;
    }

    /// Reconstrói o caminho que termina em `last` na última posição.
    fn backtrack(&self, last: State) -> Vec<State> {
        let n = self.scores.len();
        let mut path = vec![last; n];
        let mut current = last;
        for t in (1..n).rev() {
            current = self.backptr[t][current.index()];
            path[t - 1] = current;
        }
        path
    }
}

/// Escolhe o melhor candidato; em empate de score vence o estado maior.
fn best_of(candidates: impl Iterator<Item = (State, f64)>) -> Option<(State, f64)> {
    candidates.fold(None, |best, (state, score)| match best {
        Some((best_state, best_score))
            if best_score > score || (best_score == score && best_state > state) =>
        {
            Some((best_state, best_score))
        }
        _ => Some((state, score)),
    })
}

/// Decodifica `runes` com os parâmetros dados.
///
/// # Erros
/// [`SegError::EmptySequence`] se `runes` estiver vazio.
///
/// # Complexidade
/// `O(N · |S| · |prev|)`, com `|S| = 4` e `|prev| = 2`.
pub fn decode(params: &HmmParams, runes: &[char]) -> Result<Decoded> {
    let Some(&first) = runes.first() else {
        return Err(SegError::EmptySequence);
    };

    let n = runes.len();
    let mut trellis = Trellis::with_len(n);

    // === Inicialização (t = 0) ===
    for y in State::ALL {
        trellis.set(0, y, params.emit(y, first) + params.start(y), y);
    }

    // === Recursão (t = 1..n-1) ===
    for (t, &ch) in runes.iter().enumerate().skip(1) {
        for y in State::ALL {
            let em_p = params.emit(y, ch);
            let candidates = y
                .prev_states()
                .iter()
                .map(|&y0| (y0, trellis.score(t - 1, y0) + params.trans(y0, y) + em_p));
            if let Some((prev, score)) = best_of(candidates) {
                trellis.set(t, y, score, prev);
            }
        }
    }

    // === Terminação: só E e S podem fechar a sequência ===
    let last = n - 1;
    let (winner, score) = best_of(
        State::TERMINAL
            .iter()
            .map(|&y| (y, trellis.score(last, y))),
    )
    .ok_or(SegError::EmptySequence)?;

    Ok(Decoded {
        score,
        states: trellis.backtrack(winner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::{prob_start, EmissionTable, MIN_FLOAT};

    fn params_for(entries: &[(State, char, f64)]) -> HmmParams {
        let mut table = EmissionTable::new();
        for &(state, ch, p) in entries {
            table.insert(state, ch, p);
        }
        HmmParams::new(table)
    }

    #[test]
    fn test_empty_input_fails_fast() {
        let params = HmmParams::default();
        assert!(matches!(decode(&params, &[]), Err(SegError::EmptySequence)));
    }

    #[test]
    fn test_single_char_tie_goes_to_s() {
        let params = params_for(&[(State::E, '我', -2.0), (State::S, '我', -2.0)]);
        let decoded = decode(&params, &['我']).unwrap();
        assert_eq!(decoded.states, vec![State::S]);
        assert_eq!(decoded.score, -2.0 + prob_start(State::S));
    }

    #[test]
    fn test_single_char_only_terminal_states() {
        // B tem o melhor score inicial, mas não pode encerrar a sequência.
        let params = params_for(&[(State::B, '我', -0.1), (State::S, '我', -5.0)]);
        let decoded = decode(&params, &['我']).unwrap();
        assert_eq!(decoded.states, vec![State::S]);
    }

    #[test]
    fn test_unseen_chars_still_decode() {
        let params = HmmParams::default();
        let runes: Vec<char> = "未知字符".chars().collect();
        let decoded = decode(&params, &runes).unwrap();
        assert_eq!(decoded.states.len(), runes.len());
        assert!(decoded.score.is_finite());
        assert!(decoded.score <= MIN_FLOAT);
    }

    #[test]
    fn test_two_char_word() {
        let params = params_for(&[
            (State::B, '北', -1.0),
            (State::E, '京', -1.0),
            (State::S, '北', -8.0),
            (State::S, '京', -8.0),
        ]);
        let runes: Vec<char> = "北京".chars().collect();
        let decoded = decode(&params, &runes).unwrap();
        assert_eq!(decoded.states, vec![State::B, State::E]);
    }

    #[test]
    fn test_path_respects_transitions() {
        let params = params_for(&[
            (State::B, '中', -1.0),
            (State::M, '华', -1.0),
            (State::E, '人', -1.0),
            (State::S, '好', -1.0),
            (State::B, '好', -9.0),
        ]);
        let runes: Vec<char> = "中华人好".chars().collect();
        let decoded = decode(&params, &runes).unwrap();
        assert_eq!(decoded.states, vec![State::B, State::M, State::E, State::S]);

        for pair in decoded.states.windows(2) {
            assert!(pair[1].prev_states().contains(&pair[0]));
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        let params = params_for(&[(State::B, '今', -2.0), (State::E, '天', -2.0), (State::S, '天', -2.0)]);
        let runes: Vec<char> = "今天天今".chars().collect();
        let a = decode(&params, &runes).unwrap();
        let b = decode(&params, &runes).unwrap();
        assert_eq!(a.score.to_bits(), b.score.to_bits());
        assert_eq!(a.states, b.states);
    }

    #[test]
    fn test_best_of_prefers_larger_state_on_tie() {
        let best = best_of([(State::E, -1.0), (State::S, -1.0)].into_iter());
        assert_eq!(best, Some((State::S, -1.0)));
        let best = best_of([(State::S, -1.0), (State::E, -1.0)].into_iter());
        assert_eq!(best, Some((State::S, -1.0)));
        let best = best_of([(State::S, -2.0), (State::E, -1.0)].into_iter());
        assert_eq!(best, Some((State::E, -1.0)));
    }
}
