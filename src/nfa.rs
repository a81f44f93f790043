//! The NFA mini-engine (spec.md section 4.6), used by the regex/state-machine
//! handler. Builds a Thompson-style NFA over value-bitmask symbols, from a
//! small regex dialect (literals, `.`, `[...]` classes, `(...)`
//! grouping, `|` alternation, and `*`/`+`/`?`/`{n}`/`{n,}`/`{n,m}`
//! quantifiers), then exposes epsilon-closure, forward/backward reachability
//! simulation, and a couple of post-construction size-reduction passes.
//!
//! Not grounded in the teacher (a plain Sudoku solver has no need for this);
//! built directly off spec.md section 4.6's algorithm description.

use crate::error::EngineError;
use crate::value_set::ValueSet;

pub type StateId = usize;

#[derive(Debug, Clone)]
pub struct State<VS> {
    pub transitions: Vec<(VS, StateId)>,
    pub epsilons: Vec<StateId>,
    pub accept: bool,
}

impl<VS> State<VS> {
    fn new() -> Self {
        State {
            transitions: Vec::new(),
            epsilons: Vec::new(),
            accept: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Nfa<VS> {
    pub states: Vec<State<VS>>,
    pub start: StateId,
}

impl<VS: ValueSet> Nfa<VS> {
    /// Parses `pattern` into an NFA over `num_values` symbols.
    pub fn parse(pattern: &str, num_values: u8) -> Result<Nfa<VS>, EngineError> {
        let mut builder = Builder {
            states: Vec::new(),
            num_values,
        };
        let chars: Vec<char> = pattern.chars().collect();
        let mut pos = 0;
        let (start, end) = builder.parse_alternation(&chars, &mut pos)?;
        if pos != chars.len() {
            return Err(EngineError::MalformedCellList(format!(
                "unexpected trailing input in NFA pattern at position {pos}"
            )));
        }
        builder.states[end].accept = true;
        Ok(Nfa {
            states: builder.states,
            start,
        })
    }

    /// From a directly-specified transition function (e.g. the parity
    /// automaton `(s, v) -> (s + v) mod 2`), rather than a textual pattern.
    pub fn from_transition_fn(
        num_states: usize,
        num_values: u8,
        start: StateId,
        accept: impl Fn(StateId) -> bool,
        transition: impl Fn(StateId, u8) -> StateId,
    ) -> Nfa<VS> {
        let mut states: Vec<State<VS>> = (0..num_states).map(|_| State::new()).collect();
        for s in 0..num_states {
            states[s].accept = accept(s);
            for v in 0..num_values {
                let target = transition(s, v);
                states[s].transitions.push((VS::from_value(v), target));
            }
        }
        Nfa { states, start }
    }

    /// Epsilon-closure of a set of states, represented as a value-set-style
    /// bitset over state ids.
    pub fn epsilon_closure(&self, from: &[StateId]) -> Vec<StateId> {
        let mut seen = vec![false; self.states.len()];
        let mut stack: Vec<StateId> = from.to_vec();
        for &s in from {
            seen[s] = true;
        }
        while let Some(s) = stack.pop() {
            for &e in &self.states[s].epsilons {
                if !seen[e] {
                    seen[e] = true;
                    stack.push(e);
                }
            }
        }
        (0..self.states.len()).filter(|&i| seen[i]).collect()
    }

    fn step(&self, from: &[StateId], symbol: VS) -> Vec<StateId> {
        let mut targets = Vec::new();
        for &s in from {
            for &(label, target) in &self.states[s].transitions {
                if !label.intersection(&symbol).is_empty() {
                    targets.push(target);
                }
            }
        }
        self.epsilon_closure(&targets)
    }

    fn predecessors(&self, to: &[StateId], symbol: VS) -> Vec<StateId> {
        let to_set: std::collections::HashSet<StateId> = to.iter().copied().collect();
        let mut preds = Vec::new();
        for s in 0..self.states.len() {
            for &(label, target) in &self.states[s].transitions {
                if to_set.contains(&target) && !label.intersection(&symbol).is_empty() {
                    preds.push(s);
                }
            }
        }
        self.epsilon_closure(&preds)
    }

    /// Forward/backward reachability pass over a sequence of `k` cell
    /// candidate masks: returns, for each position, the allowed symbol
    /// (narrowed candidate mask), or `None` at the first position that
    /// becomes empty (a contradiction).
    pub fn allowed_symbols(&self, candidates: &[VS]) -> Option<Vec<VS>> {
        let k = candidates.len();
        let accept_states: Vec<StateId> = (0..self.states.len())
            .filter(|&s| self.states[s].accept)
            .collect();

        let mut forward: Vec<Vec<StateId>> = Vec::with_capacity(k + 1);
        forward.push(self.epsilon_closure(&[self.start]));
        for i in 0..k {
            forward.push(self.step(&forward[i], candidates[i]));
        }

        let mut backward: Vec<Vec<StateId>> = vec![Vec::new(); k + 1];
        backward[k] = self.epsilon_closure(&accept_states);
        for i in (0..k).rev() {
            backward[i] = self.predecessors(&backward[i + 1], candidates[i]);
        }

        let mut allowed = Vec::with_capacity(k);
        for i in 0..k {
            let mut symbol = VS::empty();
            // Union the labels of every transition from a live forward
            // state into a live (via backward) target state.
            for &from_state in &forward[i] {
                for &(label, target) in &self.states[from_state].transitions {
                    if backward[i + 1].contains(&target) {
                        symbol.add_set(&label);
                    }
                }
            }
            let narrowed = candidates[i].intersection(&symbol);
            if narrowed.is_empty() {
                return None;
            }
            allowed.push(narrowed);
        }
        Some(allowed)
    }

    /// Removes states unreachable from `start` via any transition or
    /// epsilon, and states that cannot reach an accept state. Renumbers the
    /// remaining states contiguously.
    pub fn prune(&mut self) {
        let n = self.states.len();

        let mut reachable = vec![false; n];
        let mut stack = vec![self.start];
        reachable[self.start] = true;
        while let Some(s) = stack.pop() {
            for &e in &self.states[s].epsilons {
                if !reachable[e] {
                    reachable[e] = true;
                    stack.push(e);
                }
            }
            for &(_, t) in &self.states[s].transitions {
                if !reachable[t] {
                    reachable[t] = true;
                    stack.push(t);
                }
            }
        }

        let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); n];
        for s in 0..n {
            for &e in &self.states[s].epsilons {
                reverse[e].push(s);
            }
            for &(_, t) in &self.states[s].transitions {
                reverse[t].push(s);
            }
        }
        let mut can_reach_accept = vec![false; n];
        let mut stack: Vec<StateId> = (0..n).filter(|&s| self.states[s].accept).collect();
        for &s in &stack {
            can_reach_accept[s] = true;
        }
        while let Some(s) = stack.pop() {
            for &p in &reverse[s] {
                if !can_reach_accept[p] {
                    can_reach_accept[p] = true;
                    stack.push(p);
                }
            }
        }

        let keep: Vec<bool> = (0..n)
            .map(|s| reachable[s] && can_reach_accept[s])
            .collect();
        let mut remap = vec![usize::MAX; n];
        let mut next = 0;
        for s in 0..n {
            if keep[s] {
                remap[s] = next;
                next += 1;
            }
        }

        let mut new_states = Vec::with_capacity(next);
        for s in 0..n {
            if !keep[s] {
                continue;
            }
            let old = &self.states[s];
            new_states.push(State {
                transitions: old
                    .transitions
                    .iter()
                    .filter(|(_, t)| keep[*t])
                    .map(|&(label, t)| (label, remap[t]))
                    .collect(),
                epsilons: old
                    .epsilons
                    .iter()
                    .filter(|e| keep[**e])
                    .map(|&e| remap[e])
                    .collect(),
                accept: old.accept,
            });
        }

        // TODO: simulation-based equivalence merging (merge two states that
        // simulate each other) is not implemented; unreachable/dead-state
        // removal above is the only size-reduction pass run today.
        self.start = remap[self.start];
        self.states = new_states;
    }
}

struct Builder<VS> {
    states: Vec<State<VS>>,
    num_values: u8,
}

impl<VS: ValueSet> Builder<VS> {
    fn new_state(&mut self) -> StateId {
        self.states.push(State::new());
        self.states.len() - 1
    }

    fn parse_alternation(
        &mut self,
        chars: &[char],
        pos: &mut usize,
    ) -> Result<(StateId, StateId), EngineError> {
        let mut branches = vec![self.parse_concat(chars, pos)?];
        while *pos < chars.len() && chars[*pos] == '|' {
            *pos += 1;
            branches.push(self.parse_concat(chars, pos)?);
        }
        if branches.len() == 1 {
            return Ok(branches.remove(0));
        }
        let start = self.new_state();
        let end = self.new_state();
        for (s, e) in branches {
            self.states[start].epsilons.push(s);
            self.states[e].epsilons.push(end);
        }
        Ok((start, end))
    }

    fn parse_concat(
        &mut self,
        chars: &[char],
        pos: &mut usize,
    ) -> Result<(StateId, StateId), EngineError> {
        let start = self.new_state();
        let mut current_end = start;
        while *pos < chars.len() && chars[*pos] != '|' && chars[*pos] != ')' {
            let (s, e) = self.parse_repeat(chars, pos)?;
            self.states[current_end].epsilons.push(s);
            current_end = e;
        }
        Ok((start, current_end))
    }

    fn parse_repeat(
        &mut self,
        chars: &[char],
        pos: &mut usize,
    ) -> Result<(StateId, StateId), EngineError> {
        let (mut start, mut end) = self.parse_atom(chars, pos)?;

        if *pos >= chars.len() {
            return Ok((start, end));
        }

        match chars[*pos] {
            '*' => {
                *pos += 1;
                let (ns, ne) = self.wrap_star(start, end);
                start = ns;
                end = ne;
            }
            '+' => {
                *pos += 1;
                let (ns, ne) = self.wrap_plus(start, end);
                start = ns;
                end = ne;
            }
            '?' => {
                *pos += 1;
                let (ns, ne) = self.wrap_optional(start, end);
                start = ns;
                end = ne;
            }
            '{' => {
                let (min, max) = self.parse_bounds(chars, pos)?;
                let (ns, ne) = self.wrap_bounds(start, end, min, max)?;
                start = ns;
                end = ne;
            }
            _ => {}
        }

        Ok((start, end))
    }

    fn wrap_star(&mut self, s: StateId, e: StateId) -> (StateId, StateId) {
        let start = self.new_state();
        let end = self.new_state();
        self.states[start].epsilons.push(s);
        self.states[start].epsilons.push(end);
        self.states[e].epsilons.push(s);
        self.states[e].epsilons.push(end);
        (start, end)
    }

    fn wrap_plus(&mut self, s: StateId, e: StateId) -> (StateId, StateId) {
        let end = self.new_state();
        self.states[e].epsilons.push(s);
        self.states[e].epsilons.push(end);
        (s, end)
    }

    fn wrap_optional(&mut self, s: StateId, e: StateId) -> (StateId, StateId) {
        let start = self.new_state();
        self.states[start].epsilons.push(s);
        self.states[start].epsilons.push(e);
        (start, e)
    }

    fn parse_bounds(
        &mut self,
        chars: &[char],
        pos: &mut usize,
    ) -> Result<(usize, Option<usize>), EngineError> {
        *pos += 1; // consume '{'
        let start_digits = *pos;
        while *pos < chars.len() && chars[*pos].is_ascii_digit() {
            *pos += 1;
        }
        let min: usize = chars[start_digits..*pos]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| EngineError::MalformedCellList("bad NFA quantifier bound".into()))?;

        let max = if *pos < chars.len() && chars[*pos] == ',' {
            *pos += 1;
            let start_digits = *pos;
            while *pos < chars.len() && chars[*pos].is_ascii_digit() {
                *pos += 1;
            }
            if start_digits == *pos {
                None
            } else {
                Some(
                    chars[start_digits..*pos]
                        .iter()
                        .collect::<String>()
                        .parse()
                        .map_err(|_| {
                            EngineError::MalformedCellList("bad NFA quantifier bound".into())
                        })?,
                )
            }
        } else {
            Some(min)
        };

        if *pos >= chars.len() || chars[*pos] != '}' {
            return Err(EngineError::MalformedCellList("unterminated NFA quantifier".into()));
        }
        *pos += 1;
        Ok((min, max))
    }

    /// Duplicates the `{min}` mandatory copies then appends `*`/`?`-style
    /// repetition for the open/bounded tail.
    fn wrap_bounds(
        &mut self,
        s: StateId,
        e: StateId,
        min: usize,
        max: Option<usize>,
    ) -> Result<(StateId, StateId), EngineError> {
        if min == 0 && max.is_none() {
            return Ok(self.wrap_star(s, e));
        }

        let clone_fragment = |builder: &mut Self, s: StateId, e: StateId| -> (StateId, StateId) {
            let mut remap = std::collections::HashMap::new();
            let mut frontier = vec![s, e];
            remap.insert(s, builder.new_state());
            remap.insert(e, builder.new_state());
            let mut visited = std::collections::HashSet::new();
            visited.insert(s);
            visited.insert(e);
            while let Some(state) = frontier.pop() {
                let transitions = builder.states[state].transitions.clone();
                let epsilons = builder.states[state].epsilons.clone();
                for &(_, t) in &transitions {
                    if visited.insert(t) {
                        remap.entry(t).or_insert_with(|| builder.new_state());
                        frontier.push(t);
                    }
                }
                for &t in &epsilons {
                    if visited.insert(t) {
                        remap.entry(t).or_insert_with(|| builder.new_state());
                        frontier.push(t);
                    }
                }
            }
            for &old in remap.keys().cloned().collect::<Vec<_>>().iter() {
                let new_id = remap[&old];
                let transitions: Vec<_> = builder.states[old]
                    .transitions
                    .iter()
                    .map(|&(label, t)| (label, remap[&t]))
                    .collect();
                let epsilons: Vec<_> = builder.states[old]
                    .epsilons
                    .iter()
                    .map(|&t| remap[&t])
                    .collect();
                builder.states[new_id].transitions = transitions;
                builder.states[new_id].epsilons = epsilons;
            }
            (remap[&s], remap[&e])
        };

        let mut chain_start: Option<StateId> = None;
        let mut chain_end = s;

        let mandatory = min.max(if max.is_none() { 0 } else { min });
        for i in 0..mandatory {
            let (cs, ce) = if i == 0 { (s, e) } else { clone_fragment(self, s, e) };
            match chain_start {
                None => {
                    chain_start = Some(cs);
                    chain_end = ce;
                }
                Some(_) => {
                    self.states[chain_end].epsilons.push(cs);
                    chain_end = ce;
                }
            }
        }

        if let Some(max) = max {
            let optional_count = max.saturating_sub(min);
            for _ in 0..optional_count {
                let (cs, ce) = clone_fragment(self, s, e);
                let (os, oe) = self.wrap_optional(cs, ce);
                if chain_start.is_none() {
                    chain_start = Some(os);
                } else {
                    self.states[chain_end].epsilons.push(os);
                }
                chain_end = oe;
            }
        } else {
            // min..unbounded: the last mandatory copy becomes a `+`.
            let (ls, le) = self.wrap_plus(s, e);
            let _ = ls;
            chain_end = le;
        }

        Ok((chain_start.unwrap_or(s), chain_end))
    }

    fn parse_atom(
        &mut self,
        chars: &[char],
        pos: &mut usize,
    ) -> Result<(StateId, StateId), EngineError> {
        if *pos >= chars.len() {
            return Err(EngineError::MalformedCellList("unexpected end of NFA pattern".into()));
        }

        match chars[*pos] {
            '(' => {
                *pos += 1;
                let frag = self.parse_alternation(chars, pos)?;
                if *pos >= chars.len() || chars[*pos] != ')' {
                    return Err(EngineError::MalformedCellList("unmatched '(' in NFA pattern".into()));
                }
                *pos += 1;
                Ok(frag)
            }
            '.' => {
                *pos += 1;
                let symbol = VS::full(self.num_values);
                Ok(self.literal_fragment(symbol))
            }
            '[' => {
                *pos += 1;
                let symbol = self.parse_class(chars, pos)?;
                Ok(self.literal_fragment(symbol))
            }
            c => {
                *pos += 1;
                let value = char_to_value(c).ok_or_else(|| {
                    EngineError::MalformedCellList(format!("unrecognized NFA symbol '{c}'"))
                })?;
                Ok(self.literal_fragment(VS::from_value(value)))
            }
        }
    }

    fn literal_fragment(&mut self, symbol: VS) -> (StateId, StateId) {
        let s = self.new_state();
        let e = self.new_state();
        self.states[s].transitions.push((symbol, e));
        (s, e)
    }

    fn parse_class(&mut self, chars: &[char], pos: &mut usize) -> Result<VS, EngineError> {
        let negate = *pos < chars.len() && chars[*pos] == '^';
        if negate {
            *pos += 1;
        }
        let mut mask = VS::empty();
        while *pos < chars.len() && chars[*pos] != ']' {
            let lo = char_to_value(chars[*pos]).ok_or_else(|| {
                EngineError::MalformedCellList("bad NFA character class member".into())
            })?;
            *pos += 1;
            if *pos < chars.len() && chars[*pos] == '-' && *pos + 1 < chars.len() && chars[*pos + 1] != ']' {
                *pos += 1;
                let hi = char_to_value(chars[*pos]).ok_or_else(|| {
                    EngineError::MalformedCellList("bad NFA character class range".into())
                })?;
                *pos += 1;
                for v in lo..=hi {
                    mask.add_set(&VS::from_value(v));
                }
            } else {
                mask.add_set(&VS::from_value(lo));
            }
        }
        if *pos >= chars.len() {
            return Err(EngineError::MalformedCellList("unterminated NFA character class".into()));
        }
        *pos += 1; // consume ']'
        if negate {
            mask = VS::full(self.num_values).intersection(&mask.invert());
        }
        Ok(mask)
    }
}

/// Maps a symbol character to a 0-based value index: `1..9` then `A..G`.
fn char_to_value(c: char) -> Option<u8> {
    match c {
        '1'..='9' => Some(c as u8 - b'1'),
        'A'..='G' => Some(c as u8 - b'A' + 9),
        _ => None,
    }
}
