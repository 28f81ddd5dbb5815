//! Scanner for `key=value(&key=value)*` text
//!
//! Used for both URL query strings and form-encoded bodies. Matching is
//! leftmost-first over the remaining input: `&` and `=` never start a key,
//! a key runs up to the next delimiter, and only a key terminated by `=`
//! produces a pair. The value runs to the next `&` and may be empty or
//! contain `=`. Tokens are raw slices of the input; nothing is decoded.

#[derive(Debug, Clone, Copy)]
enum State {
    /// Skipping delimiters before a key
    Seeking,
    /// Inside a key that started at the given offset
    Key(usize),
    /// Inside a value; holds the key span and the value start
    Value { key: (usize, usize), start: usize },
}

/// Iterator over the `(key, value)` pairs of a form/query string
#[derive(Debug, Clone)]
pub struct PairScanner<'a> {
    input: &'a str,
    pos: usize,
    state: State,
}

impl<'a> PairScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            state: State::Seeking,
        }
    }

    fn pair(&self, key: (usize, usize), start: usize, end: usize) -> (&'a str, &'a str) {
        (&self.input[key.0..key.1], &self.input[start..end])
    }
}

impl<'a> Iterator for PairScanner<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.input.as_bytes();

        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            match self.state {
                State::Seeking => {
                    if b != b'&' && b != b'=' {
                        self.state = State::Key(self.pos);
                    }
                }
                State::Key(start) => match b {
                    b'=' => {
                        self.state = State::Value {
                            key: (start, self.pos),
                            start: self.pos + 1,
                        }
                    }
                    // key without `=`: malformed fragment
                    b'&' => self.state = State::Seeking,
                    _ => {}
                },
                State::Value { key, start } => {
                    if b == b'&' {
                        self.state = State::Seeking;
                        self.pos += 1;
                        return Some(self.pair(key, start, self.pos - 1));
                    }
                }
            }
            self.pos += 1;
        }

        // End of input closes an open value; an open key is dropped.
        match std::mem::replace(&mut self.state, State::Seeking) {
            State::Value { key, start } => Some(self.pair(key, start, bytes.len())),
            _ => None,
        }
    }
}

/// Collect every pair in `input`
pub fn scan_pairs(input: &str) -> Vec<(&str, &str)> {
    PairScanner::new(input).collect()
}

/// The part of `url` after the first `?`, if any
pub fn query_component(url: &str) -> Option<&str> {
    url.find('?').map(|pos| &url[pos + 1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_pairs() {
        assert_eq!(scan_pairs("a=1&b=2"), vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_empty_value_allowed() {
        assert_eq!(scan_pairs("k=&j=v"), vec![("k", ""), ("j", "v")]);
        assert_eq!(scan_pairs("k="), vec![("k", "")]);
    }

    #[test]
    fn test_malformed_fragments_skipped() {
        assert_eq!(scan_pairs("flag&k=v&other"), vec![("k", "v")]);
        assert!(scan_pairs("no pairs here").is_empty());
        assert!(scan_pairs("").is_empty());
        assert!(scan_pairs("&&&").is_empty());
    }

    #[test]
    fn test_value_keeps_equals_sign() {
        assert_eq!(scan_pairs("a=b=c&d=e"), vec![("a", "b=c"), ("d", "e")]);
    }

    #[test]
    fn test_leading_equals_is_not_a_key() {
        assert_eq!(scan_pairs("=x=y"), vec![("x", "y")]);
        assert_eq!(scan_pairs("==&=v"), Vec::<(&str, &str)>::new());
    }

    #[test]
    fn test_no_decoding() {
        assert_eq!(
            scan_pairs("q=hello%20world+x&ü=ö"),
            vec![("q", "hello%20world+x"), ("ü", "ö")]
        );
    }

    #[test]
    fn test_multiline_blob() {
        let blob = "token=abc\nHost:example.com\n";
        assert_eq!(scan_pairs(blob), vec![("token", "abc\nHost:example.com\n")]);
    }

    #[test]
    fn test_query_component() {
        assert_eq!(query_component("https://x.test/p?a=1?b=2"), Some("a=1?b=2"));
        assert_eq!(query_component("https://x.test/p"), None);
        assert_eq!(query_component("https://x.test/p?"), Some(""));
    }
}
