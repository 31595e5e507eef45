//! The signature line records who authored or committed a change and when.
//! Wire form inside a commit payload: `Name <email> <unix-seconds> <tz>`,
//! e.g. `Test <test@example.com> 1757467768 +0000`.

use std::fmt::Display;

use bstr::ByteSlice;
use chrono::{DateTime, TimeZone, Utc};

use crate::versioning::errors::VersioningError;

/// A name/email pair with the moment the signature was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Timezone suffix as written, e.g. `+0000`.
    pub timezone: String,
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name, self.email, self.timestamp, self.timezone
        )
    }
}

impl Signature {
    /// Signature for the given identity at the current system clock, in UTC.
    pub fn now(name: &str, email: &str) -> Signature {
        Signature {
            name: name.to_string(),
            email: email.to_string(),
            timestamp: Utc::now().timestamp(),
            timezone: "+0000".to_string(),
        }
    }

    /// The signature instant as a UTC timestamp.
    pub fn when(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.timestamp, 0)
            .single()
            .unwrap_or_default()
    }

    /// Parse a signature line (without any leading `author `/`committer ` tag).
    pub fn from_line(line: &[u8]) -> Result<Signature, VersioningError> {
        let corrupt = |reason: &str| {
            VersioningError::corrupt("decode", String::from_utf8_lossy(line), reason)
        };

        let email_start = line.find_byte(b'<').ok_or_else(|| corrupt("missing `<`"))?;
        let email_end = line.find_byte(b'>').ok_or_else(|| corrupt("missing `>`"))?;
        if email_end < email_start {
            return Err(corrupt("malformed email brackets"));
        }

        let name = line[..email_start].trim_with(|c| c == ' ');
        let email = &line[email_start + 1..email_end];
        let rest = line[email_end + 1..].trim_with(|c| c == ' ');

        let mut parts = rest.splitn_str(2, " ");
        let timestamp = parts
            .next()
            .and_then(|p| p.to_str().ok())
            .and_then(|p| p.parse::<i64>().ok())
            .ok_or_else(|| corrupt("missing or malformed timestamp"))?;
        let timezone = parts
            .next()
            .and_then(|p| p.to_str().ok())
            .unwrap_or("+0000")
            .to_string();

        Ok(Signature {
            name: String::from_utf8_lossy(name).to_string(),
            email: String::from_utf8_lossy(email).to_string(),
            timestamp,
            timezone,
        })
    }

    /// Encode the signature back to its wire line.
    pub fn to_data(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}
