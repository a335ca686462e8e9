/// Best-effort decoding of truncated JSON object text.
///
/// Tool arguments and results stream in as text deltas, so at any render
/// tick the payload may be cut mid-token: `{"file": "src/ma`. The renderer
/// still wants to show the fields that have fully arrived. `decode` takes
/// any prefix of a JSON object literal and returns the most complete
/// mapping derivable from it — without ever returning an error.
///
/// Rules, in order:
/// - empty/blank input, or input not starting with `{` after trimming,
///   decodes to an empty map
/// - text that parses as strict JSON is returned verbatim (fast path)
/// - otherwise a single left-to-right scan reads `"key": value` pairs,
///   salvaging whatever is complete: an unterminated string keeps its
///   partial content, an unterminated array/object keeps the elements read
///   so far, and a truncated bare token (`tru`, `3.`) is dropped
///
/// One asymmetry is kept on purpose because downstream rendering relies on
/// it: a key immediately followed by end-of-input (`{"na`) comes back as
/// `null`, while a key whose `:` arrived but whose value did not (`{"a": `)
/// is omitted entirely. An unterminated string with no content yet
/// (`{"a": "`) is likewise omitted rather than decoded as `""`.
use serde_json::{Map, Value};

/// Decode a (possibly truncated) JSON object literal. Total: never panics,
/// never errors — worst case is an empty map.
pub fn decode(input: &str) -> Map<String, Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.starts_with('{') {
        return Map::new();
    }

    // Fast path: fully-transmitted payloads are the common case once a
    // stream settles.
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return map;
    }

    let mut scanner = Scanner::new(trimmed);
    scanner.bump(); // consume the opening '{'
    scanner.read_object()
}

// ── Scanner ───────────────────────────────────────────────────────────────────

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) {
        // Advance past one char (not one byte) so multi-byte sequences
        // stay intact when we skip stray characters.
        if let Some(c) = self.src[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Read key/value pairs until `}` or end of input. Assumes the opening
    /// `{` has been consumed.
    fn read_object(&mut self) -> Map<String, Value> {
        let mut map = Map::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(b'}') => {
                    self.bump();
                    break;
                }
                Some(b',') => {
                    self.bump();
                }
                Some(b'"') => {
                    self.bump();
                    let (raw_key, terminated) = self.read_string_raw();
                    let key = unescape(raw_key);
                    if !terminated {
                        // Key cut off by end of input: `{"na` → {na: null}.
                        // An empty partial key carries no information.
                        if !key.is_empty() {
                            map.insert(key, Value::Null);
                        }
                        break;
                    }
                    self.skip_ws();
                    if self.at_end() {
                        // Complete key, then end of input: `{"name"` → null
                        map.insert(key, Value::Null);
                        break;
                    }
                    if self.peek() == Some(b':') {
                        self.bump();
                    }
                    self.skip_ws();
                    if self.at_end() {
                        // `:` arrived but no value did — omit the key
                        break;
                    }
                    if let Some(value) = self.read_value() {
                        map.insert(key, value);
                    }
                }
                Some(_) => {
                    // Stray character between pairs — skip it
                    self.bump();
                }
            }
        }
        map
    }

    /// Read one value at the current position. `None` means the value is
    /// absent: nothing readable, or a bare token that classifies as garbage.
    fn read_value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek()? {
            b'"' => {
                self.bump();
                let (raw, terminated) = self.read_string_raw();
                if !terminated && raw.is_empty() {
                    // `{"a": "` — no content yet, absent rather than ""
                    return None;
                }
                Some(Value::String(unescape(raw)))
            }
            b'[' => {
                self.bump();
                Some(Value::Array(self.read_array()))
            }
            b'{' => {
                self.bump();
                Some(Value::Object(self.read_object()))
            }
            b',' | b'}' | b']' => None,
            _ => classify_token(self.read_token()),
        }
    }

    /// Read elements until `]` or end of input. Assumes `[` consumed.
    fn read_array(&mut self) -> Vec<Value> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(b']') => {
                    self.bump();
                    break;
                }
                Some(b',') => {
                    self.bump();
                }
                Some(b'}') => {
                    // Malformed close in array position — skip it
                    self.bump();
                }
                Some(_) => {
                    if let Some(value) = self.read_value() {
                        items.push(value);
                    }
                }
            }
        }
        items
    }

    /// Scan string content up to the next unescaped quote. Returns the raw
    /// (still-escaped) slice and whether the closing quote was found.
    /// Assumes the opening quote has been consumed.
    fn read_string_raw(&mut self) -> (&'a str, bool) {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut escaped = false;
        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            if escaped {
                escaped = false;
                self.pos += 1;
                continue;
            }
            match b {
                b'\\' => {
                    escaped = true;
                    self.pos += 1;
                }
                b'"' => {
                    let raw = &self.src[start..self.pos];
                    self.pos += 1;
                    return (raw, true);
                }
                _ => self.pos += 1,
            }
        }
        (&self.src[start..], false)
    }

    /// Capture a bare token up to the next `,`, `}`, `]`, or end of input.
    fn read_token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b',' | b'}' | b']') {
                break;
            }
            self.pos += 1;
        }
        self.src[start..self.pos].trim()
    }
}

// ── Token classification ──────────────────────────────────────────────────────

/// Classify a bare token: number, `true`, `false`, `null`, `undefined` —
/// anything else (including truncated literals like `tru`) is absent.
/// `undefined` maps to `null`, the closest value this side of the wire.
fn classify_token(token: &str) -> Option<Value> {
    match token {
        "" => None,
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" | "undefined" => Some(Value::Null),
        _ => parse_number(token),
    }
}

/// Accept exactly `-?digits(.digits)?`. Truncated forms (`-`, `3.`) are
/// rejected so a half-arrived number never shows up with the wrong value.
fn parse_number(token: &str) -> Option<Value> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        return token
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number);
    }
    match token.parse::<i64>() {
        Ok(n) => Some(Value::Number(n.into())),
        // Wider than i64 — fall back to the float representation
        Err(_) => token
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
    }
}

// ── Unescaping ────────────────────────────────────────────────────────────────

/// Apply JSON string escapes uniformly, whether the segment is complete or
/// truncated. Unknown escapes are kept verbatim; a lone trailing backslash
/// (the escape itself was cut off) is dropped.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => {} // truncated mid-escape
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
