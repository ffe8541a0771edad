//! # Parâmetros do HMM de Fronteira de Palavras
//!
//! Modelo de Markov oculto com quatro estados sobre caracteres:
//!
//! | Estado | Significado                        |
//! |--------|------------------------------------|
//! | `B`    | início de uma palavra (Begin)      |
//! | `M`    | meio de uma palavra (Middle)       |
//! | `E`    | fim de uma palavra (End)           |
//! | `S`    | palavra de um caractere (Single)   |
//!
//! As probabilidades iniciais e de transição são constantes pré-treinadas,
//! armazenadas em **log-space**. As de emissão (`P(caractere | estado)`) são
//! treinadas fora deste crate e injetadas via [`EmissionTable`]; pares
//! ausentes valem [`MIN_FLOAT`], o "praticamente impossível".
//!
//! ```text
//! B → M | E      M → M | E      E → B | S      S → B | S
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegError};

/// Piso de log-probabilidade: age como −∞ sem produzir `inf`/`NaN` nas somas.
pub const MIN_FLOAT: f64 = -3.14e100;

/// Estado oculto do HMM.
///
/// A ordem de declaração (`B < E < M < S`) é a ordem usada para desempatar
/// scores iguais no Viterbi: vence o estado maior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    B,
    E,
    M,
    S,
}

impl State {
    pub const ALL: [State; 4] = [State::B, State::E, State::M, State::S];

    /// Estados em que uma sequência pode terminar.
    pub const TERMINAL: [State; 2] = [State::E, State::S];

    /// Estados que podem transicionar para `self`. Restringe a busca do
    /// Viterbi em vez de avaliar as 16 transições.
    pub fn prev_states(self) -> &'static [State] {
        match self {
            State::B => &[State::E, State::S],
            State::M => &[State::M, State::B],
            State::S => &[State::S, State::E],
            State::E => &[State::B, State::M],
        }
    }

    pub fn index(self) -> usize {
        match self {
            State::B => 0,
            State::E => 1,
            State::M => 2,
            State::S => 3,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            State::B => 'B',
            State::E => 'E',
            State::M => 'M',
            State::S => 'S',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'B' => Some(State::B),
            'E' => Some(State::E),
            'M' => Some(State::M),
            'S' => Some(State::S),
            _ => None,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// `ln P(y_0 = state)`. Uma sequência nunca começa em `M` ou `E`.
pub fn prob_start(state: State) -> f64 {
    match state {
        State::B => -0.26268660809250016,
        State::E => MIN_FLOAT,
        State::M => MIN_FLOAT,
        State::S => -1.4652633398537678,
    }
}

/// `ln P(y_t = to | y_{t-1} = from)`. Pares fora do esquema BMES valem
/// [`MIN_FLOAT`].
pub fn prob_trans(from: State, to: State) -> f64 {
    match (from, to) {
        (State::B, State::E) => -0.510825623765990,
        (State::B, State::M) => -0.916290731874155,
        (State::E, State::B) => -0.5897149736854513,
        (State::E, State::S) => -0.8085250474669937,
        (State::M, State::E) => -0.33344856811948514,
        (State::M, State::M) => -1.2603623820268226,
        (State::S, State::B) => -0.7211965654669841,
        (State::S, State::S) => -0.6658631448798212,
        _ => MIN_FLOAT,
    }
}

/// Tabela de emissão `ln P(caractere | estado)`, uma linha por estado.
///
/// Em JSON: `{"B": {"北": -5.1, ...}, "E": {...}, "M": {...}, "S": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionTable {
    #[serde(rename = "B", default)]
    begin: HashMap<char, f64>,
    #[serde(rename = "E", default)]
    end: HashMap<char, f64>,
    #[serde(rename = "M", default)]
    middle: HashMap<char, f64>,
    #[serde(rename = "S", default)]
    single: HashMap<char, f64>,
}

impl EmissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: State, ch: char, log_prob: f64) {
        self.row_mut(state).insert(ch, log_prob);
    }

    /// Log-probabilidade registrada, ou `None` se o par não foi treinado.
    pub fn get(&self, state: State, ch: char) -> Option<f64> {
        self.row(state).get(&ch).copied()
    }

    /// Número total de pares (estado, caractere).
    pub fn len(&self) -> usize {
        State::ALL.iter().map(|&s| self.row(s).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Lê uma tabela no formato `ESTADO<TAB>CARACTERE<TAB>LOGPROB`, uma
    /// entrada por linha. Linhas vazias e iniciadas por `#` são ignoradas.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let malformed = |reason: &str| SegError::MalformedEmission {
                line: line_no,
                reason: reason.to_string(),
            };

            let mut fields = line.split_whitespace();
            let (Some(state), Some(ch), Some(prob), None) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed("esperados 3 campos"));
            };

            let mut state_chars = state.chars();
            let state = match (state_chars.next(), state_chars.next()) {
                (Some(c), None) => State::from_char(c),
                _ => None,
            }
            .ok_or_else(|| malformed("estado deve ser B, E, M ou S"))?;

            let mut chars = ch.chars();
            let ch = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(malformed("esperado um único caractere")),
            };

            let prob: f64 = prob
                .parse()
                .map_err(|_| malformed("log-probabilidade inválida"))?;

            table.insert(state, ch, prob);
        }

        Ok(table)
    }

    fn row(&self, state: State) -> &HashMap<char, f64> {
        match state {
            State::B => &self.begin,
            State::E => &self.end,
            State::M => &self.middle,
            State::S => &self.single,
        }
    }

    fn row_mut(&mut self, state: State) -> &mut HashMap<char, f64> {
        match state {
            State::B => &mut self.begin,
            State::E => &mut self.end,
            State::M => &mut self.middle,
            State::S => &mut self.single,
        }
    }
}

/// Conjunto de parâmetros consultado pelo decodificador.
///
/// Somente leitura depois de construído; compartilhe por referência (ou
/// `Arc`) entre quantas decodificações forem necessárias.
#[derive(Debug, Clone, Default)]
pub struct HmmParams {
    emission: EmissionTable,
}

impl HmmParams {
    pub fn new(emission: EmissionTable) -> Self {
        Self { emission }
    }

    pub fn start(&self, state: State) -> f64 {
        prob_start(state)
    }

    pub fn trans(&self, from: State, to: State) -> f64 {
        prob_trans(from, to)
    }

    /// Emissão com piso: pares ausentes valem [`MIN_FLOAT`].
    pub fn emit(&self, state: State, ch: char) -> f64 {
        self.emission.get(state, ch).unwrap_or(MIN_FLOAT)
    }

    pub fn emission(&self) -> &EmissionTable {
        &self.emission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_ordering_for_tiebreak() {
        assert!(State::S > State::M);
        assert!(State::M > State::E);
        assert!(State::E > State::B);
    }

    #[test]
    fn test_prev_states_match_transitions() {
        // Todo predecessor permitido tem transição finita; os demais não.
        for to in State::ALL {
            for from in State::ALL {
                let allowed = to.prev_states().contains(&from);
                assert_eq!(prob_trans(from, to) > MIN_FLOAT, allowed, "{from}->{to}");
            }
        }
    }

    #[test]
    fn test_start_forbids_middle_and_end() {
        assert_eq!(prob_start(State::M), MIN_FLOAT);
        assert_eq!(prob_start(State::E), MIN_FLOAT);
        assert!(prob_start(State::B) > prob_start(State::S));
    }

    #[test]
    fn test_emit_uses_floor_for_missing() {
        let mut table = EmissionTable::new();
        table.insert(State::S, '的', -2.5);
        let params = HmmParams::new(table);
        assert_eq!(params.emit(State::S, '的'), -2.5);
        assert_eq!(params.emit(State::B, '的'), MIN_FLOAT);
    }

    #[test]
    fn test_emission_from_json() {
        let table = EmissionTable::from_json(r#"{"B": {"北": -3.0}, "S": {"的": -1.5}}"#).unwrap();
        assert_eq!(table.get(State::B, '北'), Some(-3.0));
        assert_eq!(table.get(State::S, '的'), Some(-1.5));
        assert_eq!(table.get(State::M, '北'), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_emission_from_reader() {
        let text = "# estado char logprob\nB\t北\t-3.0\n\nE 京 -2.0\n";
        let table = EmissionTable::from_reader(text.as_bytes()).unwrap();
        assert_eq!(table.get(State::B, '北'), Some(-3.0));
        assert_eq!(table.get(State::E, '京'), Some(-2.0));
    }

    #[test]
    fn test_emission_from_reader_rejects_bad_state() {
        let err = EmissionTable::from_reader("X\t北\t-3.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SegError::MalformedEmission { line: 1, .. }));

        let err = EmissionTable::from_reader("B\t北京\t-3.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SegError::MalformedEmission { line: 1, .. }));
    }
}
