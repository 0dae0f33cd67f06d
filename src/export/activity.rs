//! Economic-activity lists (`[{"code": "62.01-5-01", "text": "..."}]`).
//!
//! Older API clients stored these fields as the *text* of the list, sometimes
//! in Python literal syntax (`[{'code': '...'}]`). Both forms are accepted;
//! anything that does not parse is an empty list.

use serde_json::{Map, Number, Value};

/// Deepest list/dict nesting accepted in literal text, same bound as serde_json.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activity {
    pub code: Option<String>,
    pub text: Option<String>,
}

pub fn parse_activities(value: &Value) -> Vec<Activity> {
    let parsed;
    let items = match value {
        Value::Array(items) => items,
        Value::String(text) => {
            parsed = serde_json::from_str::<Value>(text)
                .ok()
                .or_else(|| parse_literal(text));
            match &parsed {
                Some(Value::Array(items)) => items,
                _ => return Vec::new(),
            }
        }
        _ => return Vec::new(),
    };
    items.iter().map(activity_from).collect()
}

fn activity_from(item: &Value) -> Activity {
    let field = |name: &str| match item.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };
    Activity {
        code: field("code"),
        text: field("text"),
    }
}

/// Parse a Python literal (lists, tuples, dicts, strings, numbers,
/// `None`/`True`/`False`) into JSON. `None` if the whole text is not one value.
pub fn parse_literal(text: &str) -> Option<Value> {
    let mut p = Literal {
        chars: text.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let v = p.value()?;
    p.skip_ws();
    (p.pos == p.chars.len()).then_some(v)
}

struct Literal {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Literal {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek()? {
            '[' => self.nested(|p| p.sequence('[', ']')),
            '(' => self.nested(|p| p.sequence('(', ')')),
            '{' => self.nested(Self::dict),
            '\'' | '"' => self.string().map(Value::String),
            c if c == '-' || c == '+' || c.is_ascii_digit() => self.number(),
            _ => self.word(),
        }
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Option<Value>) -> Option<Value> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let v = parse(self);
        self.depth -= 1;
        v
    }

    fn sequence(&mut self, open: char, close: char) -> Option<Value> {
        self.eat(open).then_some(())?;
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Some(Value::Array(items));
            }
            items.push(self.value()?);
            if !self.eat(',') {
                return self.eat(close).then_some(Value::Array(items));
            }
        }
    }

    fn dict(&mut self) -> Option<Value> {
        self.eat('{').then_some(())?;
        let mut map = Map::new();
        loop {
            if self.eat('}') {
                return Some(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.eat(':').then_some(())?;
            let v = self.value()?;
            map.insert(key, v);
            if !self.eat(',') {
                return self.eat('}').then_some(Value::Object(map));
            }
        }
    }

    fn string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            match self.bump()? {
                c if c == quote => return Some(out),
                '\\' => match self.bump()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'x' => out.push(self.hex_escape(2)?),
                    'u' => out.push(self.hex_escape(4)?),
                    'U' => out.push(self.hex_escape(8)?),
                    other => out.push(other),
                },
                c => out.push(c),
            }
        }
    }

    fn hex_escape(&mut self, len: usize) -> Option<char> {
        let end = self.pos.checked_add(len)?;
        let digits: String = self.chars.get(self.pos..end)?.iter().collect();
        self.pos = end;
        char::from_u32(u32::from_str_radix(&digits, 16).ok()?)
    }

    fn number(&mut self) -> Option<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        if let Ok(i) = raw.parse::<i64>() {
            return Some(Value::Number(i.into()));
        }
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    }

    fn word(&mut self) -> Option<Value> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let w: String = self.chars[start..self.pos].iter().collect();
        match w.as_str() {
            "None" => Some(Value::Null),
            "True" => Some(Value::Bool(true)),
            "False" => Some(Value::Bool(false)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn act(code: &str, text: &str) -> Activity {
        Activity {
            code: Some(code.to_string()),
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn test_structured_list() {
        let v = json!([{"code": "62.01-5-01", "text": "Desenvolvimento"}, {"code": "1"}]);
        let acts = parse_activities(&v);
        assert_eq!(acts.len(), 2);
        assert_eq!(acts[0], act("62.01-5-01", "Desenvolvimento"));
        assert_eq!(acts[1].text, None);
    }

    #[test]
    fn test_json_text() {
        let v = json!(r#"[{"code":"12.3-4","text":"X"}]"#);
        assert_eq!(parse_activities(&v), vec![act("12.3-4", "X")]);
    }

    #[test]
    fn test_python_literal_text() {
        let v = json!(r#"[{'code': '47.11-3-02', 'text': "Comércio d'água"}]"#);
        assert_eq!(
            parse_activities(&v),
            vec![act("47.11-3-02", "Comércio d'água")]
        );
    }

    #[test]
    fn test_unparsable_or_other_shapes_are_empty() {
        for v in [
            json!("[{'code': '1'"),
            json!("garbage"),
            json!(null),
            json!(42),
            json!({"code": "1"}),
            json!("{'code': '1'}"),
        ] {
            assert!(parse_activities(&v).is_empty(), "{v}");
        }
    }

    #[test]
    fn test_literal_scalars_and_nesting() {
        assert_eq!(
            parse_literal("[1, -2.5, None, True, ('a', \"b\"), {'k': [False]},]"),
            Some(json!([1, -2.5, null, true, ["a", "b"], {"k": [false]}]))
        );
        assert_eq!(parse_literal(r"'tab\thereé'"), Some(json!("tab\there\u{e9}")));
        assert_eq!(parse_literal("[1] trailing"), None);
    }

    #[test]
    fn test_deep_nesting_is_empty_not_a_crash() {
        let deep = "[".repeat(500_000);
        assert!(parse_activities(&json!(deep)).is_empty());

        let closed = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert_eq!(parse_literal(&closed), None);

        let ok = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_literal(&ok).is_some());
    }
}
