//! Formula adapter.
//!
//! Derived stats carry a textual arithmetic formula such as
//! `"Strength * 2 + Agility"`. Parsing and evaluation are delegated to
//! `evalexpr`; this module compiles the text once, extracts the stat
//! names it references, and evaluates it against a caller-supplied
//! resolver that maps each referenced `StatId` to a number.
//!
//! Stat arithmetic is floating point throughout. Integer literals in the
//! text are compiled as floats, so `7 / 2` is `3.5` and never truncates.

use crate::error::StatError;
use crate::stat_id::StatId;
use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A compiled stat formula.
///
/// Construction never fails: a formula that does not parse is kept with
/// its parse error and fails at evaluation time, where the caller decides
/// on a fallback. Use [`Formula::parse`] to reject bad text up front.
///
/// # Examples
///
/// ```rust
/// use statforge::{Formula, StatId};
///
/// let formula = Formula::new("Strength * 2 + Agility");
/// let names: Vec<&str> = formula.variables().iter().map(|v| v.as_str()).collect();
/// assert_eq!(names, ["Strength", "Agility"]);
///
/// let value = formula
///     .evaluate(|id| if id.as_str() == "Strength" { 10.0 } else { 3.0 })
///     .unwrap();
/// assert_eq!(value, 23.0);
/// ```
#[derive(Debug, Clone)]
pub struct Formula {
    text: String,
    compiled: Result<Node, String>,
    variables: Vec<StatId>,
}

impl Formula {
    /// Compile `text`, keeping any parse error for evaluation time.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        match build_operator_tree(&float_literals(&text)) {
            Ok(node) => {
                let mut variables: Vec<StatId> = Vec::new();
                for name in node.iter_variable_identifiers() {
                    if !variables.iter().any(|v| v.as_str() == name) {
                        variables.push(StatId::from_str(name));
                    }
                }
                Self {
                    text,
                    compiled: Ok(node),
                    variables,
                }
            }
            Err(err) => Self {
                text,
                compiled: Err(err.to_string()),
                variables: Vec::new(),
            },
        }
    }

    /// Compile `text`, failing on a parse error.
    pub fn parse(text: impl Into<String>) -> Result<Self, StatError> {
        let formula = Self::new(text);
        if let Err(message) = &formula.compiled {
            return Err(StatError::Formula {
                formula: formula.text.clone(),
                message: message.clone(),
            });
        }
        Ok(formula)
    }

    /// The source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the text parsed.
    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    /// Distinct variable names referenced by the formula, in order of
    /// first appearance. Empty when the formula failed to parse.
    pub fn variables(&self) -> &[StatId] {
        &self.variables
    }

    /// Whether the formula mentions `stat`.
    pub fn references(&self, stat: &StatId) -> bool {
        self.variables.contains(stat)
    }

    /// Evaluate the formula, resolving each referenced variable through
    /// `resolve`. Integer results are widened to `f64`.
    pub fn evaluate(&self, mut resolve: impl FnMut(&StatId) -> f64) -> Result<f64, StatError> {
        let node = self.compiled.as_ref().map_err(|message| self.error(message))?;

        let mut context = HashMapContext::new();
        for variable in &self.variables {
            let value = resolve(variable);
            context
                .set_value(variable.as_str().to_string(), Value::Float(value))
                .map_err(|err| self.error(err))?;
        }

        node.eval_number_with_context(&context)
            .map_err(|err| self.error(err))
    }

    fn error(&self, message: impl ToString) -> StatError {
        StatError::Formula {
            formula: self.text.clone(),
            message: message.to_string(),
        }
    }
}

/// Rewrite every integer literal in `text` as a float literal.
///
/// Identifiers containing digits, decimals, exponents and string literals
/// are copied unchanged.
fn float_literals(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '.';
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            out.push(c);
            i += 1;
            while i < chars.len() {
                let s = chars[i];
                out.push(s);
                i += 1;
                if s == '\\' && i < chars.len() {
                    out.push(chars[i]);
                    i += 1;
                } else if s == '"' {
                    break;
                }
            }
        } else if is_word(c) {
            let start = i;
            while i < chars.len() && is_word(chars[i]) {
                i += 1;
            }
            // 1e-3: the exponent sign splits the word
            if chars[start].is_ascii_digit()
                && matches!(chars[i - 1], 'e' | 'E')
                && i + 1 < chars.len()
                && matches!(chars[i], '+' | '-')
                && chars[i + 1].is_ascii_digit()
            {
                i += 1;
                while i < chars.len() && is_word(chars[i]) {
                    i += 1;
                }
            }
            let word: String = chars[start..i].iter().collect();
            let integer = word.chars().all(|d| d.is_ascii_digit());
            out.push_str(&word);
            if integer {
                out.push_str(".0");
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl From<&str> for Formula {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Formula {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl Serialize for Formula {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.text.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(Formula::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_are_deduplicated() {
        let formula = Formula::new("Strength + Strength * Level");
        assert_eq!(
            formula.variables(),
            &[StatId::from_str("Strength"), StatId::from_str("Level")]
        );
        assert!(formula.references(&StatId::from_str("Level")));
        assert!(!formula.references(&StatId::from_str("Luck")));
    }

    #[test]
    fn test_evaluate_with_resolver() {
        let formula = Formula::new("Strength * 2");
        let value = formula.evaluate(|_| 15.0).unwrap();
        assert_eq!(value, 30.0);
    }

    #[test]
    fn test_constant_formula() {
        let formula = Formula::new("100 + 25");
        assert!(formula.variables().is_empty());
        assert_eq!(formula.evaluate(|_| 0.0).unwrap(), 125.0);
    }

    #[test]
    fn test_integer_division_is_fractional() {
        assert_eq!(Formula::new("7 / 2").evaluate(|_| 0.0).unwrap(), 3.5);

        let half = Formula::new("Strength * (1 / 2)");
        assert_eq!(half.evaluate(|_| 10.0).unwrap(), 5.0);

        let balance = Formula::new("100 * (3 / 4) + Vitality");
        assert_eq!(balance.evaluate(|_| 12.0).unwrap(), 87.0);
    }

    #[test]
    fn test_float_literals_leave_other_tokens_alone() {
        assert_eq!(float_literals("Stat2 + 10"), "Stat2 + 10.0");
        assert_eq!(float_literals("1.5*(2+x_3)"), "1.5*(2.0+x_3)");
        assert_eq!(float_literals("1e-3 + 4"), "1e-3 + 4.0");
        assert_eq!(float_literals("\"a 1\" + 1"), "\"a 1\" + 1.0");
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let formula = Formula::new("Level * 100");
        assert_eq!(formula.text(), "Level * 100");
        assert_eq!(formula.variables(), &[StatId::from_str("Level")]);
    }

    #[test]
    fn test_parse_error_is_deferred() {
        let formula = Formula::new("Strength * (");
        assert!(!formula.is_valid());
        assert!(formula.variables().is_empty());
        let err = formula.evaluate(|_| 1.0).unwrap_err();
        assert!(matches!(err, StatError::Formula { .. }));
    }

    #[test]
    fn test_parse_rejects_bad_text() {
        assert!(Formula::parse("Strength * (").is_err());
        assert!(Formula::parse("Strength * 2").is_ok());
    }

    #[test]
    fn test_evaluation_error() {
        // Boolean result is not a number.
        let formula = Formula::new("Strength > 2");
        assert!(formula.evaluate(|_| 5.0).is_err());
    }

    #[test]
    fn test_serde_as_text() {
        let formula: Formula = serde_json::from_str("\"Level * 100\"").unwrap();
        assert_eq!(formula.text(), "Level * 100");
        assert_eq!(serde_json::to_string(&formula).unwrap(), "\"Level * 100\"");
    }
}
