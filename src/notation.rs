//! Dice notation parsing and result formatting
//!
//! Notation looks like `2d6+1d4+3@2 5 1`: `+`-joined `[count]d<faces>` terms,
//! each optionally followed by a signed modifier, and an optional `@` segment
//! of desired face values. Parsing is forgiving: a malformed term sets the
//! request's `error` flag and is skipped, every valid term still counts.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, digit1, one_of, space0},
    combinator::{eof, map_res, opt, peek},
    sequence::{preceded, terminated},
};
use serde::{Deserialize, Serialize};

use crate::consts::MAX_TERM_COUNT;
use crate::dice::DiceType;

/// Errors raised when notation is accepted by a dice box
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("too many dice: {count} requested, limit is {limit}")]
    TooManyDice { count: usize, limit: usize },
}

/// A parsed roll request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRequest {
    /// One entry per die, in parse order
    pub dice: Vec<DiceType>,
    /// Sum of all modifier terms
    pub constant: i32,
    /// Desired face values from the `@` segment, aligned with `dice`
    pub desired: Vec<i32>,
    /// True if any term was rejected
    pub error: bool,
}

/// One `[count]<command><faces>[(+|-)<n>]` term as written
#[derive(Debug, Clone, Copy)]
struct Term<'a> {
    count: Option<u32>,
    command: &'a str,
    faces: &'a str,
    modifier: Option<(char, i32)>,
}

fn term_end(input: &str) -> IResult<&str, &str> {
    preceded(space0, alt((tag("+"), eof))).parse(input)
}

/// A signed modifier only counts if a term boundary follows it, so `1d6+1d4`
/// does not read `+1` as a modifier
fn modifier(input: &str) -> IResult<&str, (char, i32)> {
    terminated(
        (
            preceded(space0, one_of("+-")),
            preceded(space0, map_res(digit1, |s: &str| s.parse::<i32>())),
        ),
        peek(term_end),
    )
    .parse(input)
}

fn term(input: &str) -> IResult<&str, Term<'_>> {
    let (input, (count, command, faces, modifier)) = (
        preceded(space0, opt(map_res(digit1, |s: &str| s.parse::<u32>()))),
        alpha1,
        digit1,
        opt(modifier),
    )
        .parse(input)?;
    let (input, _) = term_end(input)?;

    Ok((
        input,
        Term {
            count,
            command,
            faces,
            modifier,
        },
    ))
}

impl RollRequest {
    /// Parse notation text. Never fails; see [`RollRequest::error`].
    pub fn parse(text: &str) -> Self {
        let mut segments = text.split('@');
        let dice_segment = segments.next().unwrap_or_default();
        let results_segment = segments.next().unwrap_or_default();

        let mut request = RollRequest::default();
        let mut rest = dice_segment;

        while !rest.trim().is_empty() {
            match term(rest) {
                Ok((next, t)) => {
                    request.apply_term(&t);
                    rest = next;
                }
                Err(_) => {
                    log::warn!("Skipping malformed dice term in {:?}", rest);
                    request.error = true;
                    // Resync at the next term boundary
                    rest = rest.find('+').map(|i| &rest[i + 1..]).unwrap_or_default();
                }
            }
        }

        request.desired = results_segment
            .split(|c: char| !c.is_ascii_digit())
            .filter(|run| !run.is_empty())
            // Digit runs only fail on overflow; keep the slot so later values stay aligned
            .map(|run| run.parse::<i32>().unwrap_or(i32::MAX))
            .collect();

        request
    }

    fn apply_term(&mut self, term: &Term<'_>) {
        if term.command != "d" {
            log::warn!("Unknown dice command {:?}", term.command);
            self.error = true;
            return;
        }

        let Ok(dice_type) = format!("d{}", term.faces).parse::<DiceType>() else {
            log::warn!("Unknown dice type d{}", term.faces);
            self.error = true;
            return;
        };

        let count = term.count.unwrap_or(1);
        if count > MAX_TERM_COUNT {
            log::warn!("Dice term asks for {} dice, ignoring", count);
            self.error = true;
            return;
        }

        self.dice
            .extend(std::iter::repeat_n(dice_type, count as usize));

        if let Some((sign, n)) = term.modifier {
            self.constant = match sign {
                '-' => self.constant.saturating_sub(n),
                _ => self.constant.saturating_add(n),
            };
        }
    }

    /// True when there is nothing to roll
    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Canonical notation: dice grouped by type in first-seen order,
    /// e.g. `2d6 + d4 + 3`
    pub fn stringify(&self) -> String {
        let mut groups: Vec<(DiceType, usize)> = Vec::new();
        for &dice_type in &self.dice {
            match groups.iter_mut().find(|(t, _)| *t == dice_type) {
                Some((_, count)) => *count += 1,
                None => groups.push((dice_type, 1)),
            }
        }

        let mut notation = groups
            .iter()
            .map(|(t, count)| {
                if *count > 1 {
                    format!("{count}{t}")
                } else {
                    t.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" + ");

        if self.constant > 0 {
            notation.push_str(&format!(" + {}", self.constant));
        } else if self.constant < 0 {
            notation.push_str(&format!(" - {}", self.constant.unsigned_abs()));
        }
        notation
    }
}

impl std::fmt::Display for RollRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.stringify())
    }
}

/// Format resolved values: `"3 5 +2 = 10"`. The total is only shown when
/// there is more than one die or a nonzero constant.
pub fn format_result(values: &[i32], constant: i32) -> String {
    let mut res = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    if constant > 0 {
        res.push_str(&format!(" +{constant}"));
    } else if constant < 0 {
        res.push_str(&format!(" -{}", constant.unsigned_abs()));
    }

    if values.len() > 1 || constant != 0 {
        let total = values.iter().sum::<i32>() + constant;
        res.push_str(&format!(" = {total}"));
    }
    res
}

/// The resolved result of one completed throw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    /// Face values, one per die in request order
    pub values: Vec<i32>,
    pub constant: i32,
    /// Sum of values plus constant
    pub total: i32,
    /// Printable result, see [`format_result`]
    pub display: String,
    /// The throw hit the iteration budget before every die came to rest
    pub timed_out: bool,
}

impl RollOutcome {
    pub fn new(values: Vec<i32>, constant: i32, timed_out: bool) -> Self {
        let total = values.iter().sum::<i32>() + constant;
        let display = format_result(&values, constant);
        Self {
            values,
            constant,
            total,
            display,
            timed_out,
        }
    }

    /// True if any die could not be read (e.g. it left the table). Callers
    /// should ask for a re-roll instead of showing the total.
    pub fn is_fault(&self) -> bool {
        self.values.iter().any(|v| *v < 0)
    }
}

/// Add one `+d9` tens die per d100, counting the d100s of the first d100 term
pub fn add_percentile_companions(text: &str) -> String {
    let Some(idx) = text.find("d100") else {
        return text.to_string();
    };

    let digits: String = text[..idx]
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let count = if digits.is_empty() {
        1
    } else {
        digits.parse::<usize>().unwrap_or(1).min(MAX_TERM_COUNT as usize)
    };

    // Companions go before any `@` results segment
    let (dice, results) = text.split_at(text.find('@').unwrap_or(text.len()));
    let mut expanded = dice.to_string();
    for _ in 0..count {
        expanded.push_str("+d9");
    }
    expanded.push_str(results);
    expanded
}
