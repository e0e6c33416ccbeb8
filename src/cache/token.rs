use chrono::{DateTime, Utc};

/// A token value together with the instant it stops being valid.
///
/// Tokens are never updated in place: a refresh replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expiry: DateTime<Utc>,
}

impl Token {
    pub fn new(value: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        Self { value: value.into(), expiry }
    }

    /// A token is valid only while its expiry lies strictly after `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn expiry_is_checked_against_given_instant() {
        let fixed = Utc.timestamp_opt(10_000, 0).unwrap();

        let cases = [
            ("future expiry", fixed + Duration::minutes(1), false),
            ("past expiry", fixed - Duration::minutes(1), true),
            ("expiry equals now", fixed, true),
        ];

        for (name, expiry, expected) in cases {
            let token = Token::new("tok", expiry);
            assert_eq!(token.is_expired(fixed), expected, "case: {}", name);
        }
    }
}
