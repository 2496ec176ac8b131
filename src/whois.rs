use std::io::{Read, Write};
use std::net::TcpStream;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use url::Url;

/// Classifies how much registration time a URL's domain has left.
///
/// Codes: `1` more than a year remaining, `0` a year or less (including
/// already expired), `-1` no expiration date found or the lookup failed.
pub trait RegistrationProber: Send + Sync {
    fn check_domain_registration_length(&self, url: &str) -> i64;
}

/// Live WHOIS lookup: asks the referral server for the TLD's registry,
/// then queries that registry for the domain record. Registry lookups have
/// no response-time guarantee and no timeout is imposed here.
pub struct WhoisProber {
    referral_server: String,
}

// Field names registries use for the expiration date, lowercased.
const EXPIRY_FIELDS: [&str; 5] = [
    "registry expiry date",
    "expiration date",
    "expiry date",
    "expires",
    "paid-till",
];

impl WhoisProber {
    pub fn new(referral_server: String) -> Self {
        Self { referral_server }
    }

    fn lookup(&self, url: &str) -> Result<Option<DateTime<Utc>>> {
        let parsed = Url::parse(url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| anyhow!("URL has no host"))?;

        let tld = host
            .rsplit('.')
            .next()
            .filter(|tld| !tld.is_empty())
            .ok_or_else(|| anyhow!("no TLD in {host}"))?;

        let referral = query(&self.referral_server, tld)?;
        let registry = field_value(&referral, &["refer", "whois"])
            .ok_or_else(|| anyhow!("no registry WHOIS server for .{tld}"))?;

        let record = query(&format!("{registry}:43"), host)?;
        Ok(parse_expiration(&record))
    }
}

impl RegistrationProber for WhoisProber {
    fn check_domain_registration_length(&self, url: &str) -> i64 {
        match self.lookup(url) {
            Ok(Some(expiry)) => classify_remaining(expiry, Utc::now()),
            Ok(None) => -1,
            Err(err) => {
                tracing::debug!("WHOIS probe failed for {url}: {err}");
                -1
            }
        }
    }
}

fn query(server: &str, request: &str) -> Result<String> {
    let mut stream = TcpStream::connect(server)?;
    stream.write_all(request.as_bytes())?;
    stream.write_all(b"\r\n")?;

    // WHOIS servers close the connection after the response.
    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

/// Value of the first line whose key matches one of `keys`, case-insensitive.
fn field_value<'a>(response: &'a str, keys: &[&str]) -> Option<&'a str> {
    response.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let value = value.trim();
        if !value.is_empty() && keys.contains(&key.trim().to_lowercase().as_str()) {
            Some(value)
        } else {
            None
        }
    })
}

/// First expiration date in the record that parses; registries may list the
/// field more than once.
pub(crate) fn parse_expiration(record: &str) -> Option<DateTime<Utc>> {
    record.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if EXPIRY_FIELDS.contains(&key.trim().to_lowercase().as_str()) {
            parse_date(value.trim())
        } else {
            None
        }
    })
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

pub(crate) fn classify_remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    if (expiry - now).num_days() > 365 {
        1
    } else {
        0
    }
}
