use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::errors::ArgError;

const TAG_NAME_MAX_LEN: usize = 100;
const USERNAME_MAX_LEN: usize = 150;

static POSITIVE_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").unwrap());
static USERNAME_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]$").unwrap());
static RATING_LABEL_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]$").unwrap());
static MIMETYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]+/[a-z0-9.\-]+(\+[a-z0-9.\-]+)?$").unwrap());
static URL_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-._~:/?#\[\]@!$&'()+,;%]$").unwrap());

fn non_empty(arg: &str) -> Result<(), ArgError> {
    if arg.is_empty() {
        return Err(ArgError::Empty);
    }
    Ok(())
}

fn first_invalid_char(arg: &str, allowed: &Regex) -> Result<(), ArgError> {
    let mut buf = [0u8; 4];
    match arg.chars().find(|c| !allowed.is_match(c.encode_utf8(&mut buf))) {
        Some(c) => Err(ArgError::InvalidChar(c)),
        None => Ok(()),
    }
}

fn max_len(arg: &str, max: usize) -> Result<(), ArgError> {
    if arg.chars().count() > max {
        return Err(ArgError::TooLong(max));
    }
    Ok(())
}

/// Tag and tag alias names
pub fn tag_name(arg: &str) -> Result<(), ArgError> {
    non_empty(arg)?;
    max_len(arg, TAG_NAME_MAX_LEN)?;

    if let Some(c) = arg
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '*' | '=' | '<' | '>'))
    {
        return Err(ArgError::InvalidChar(c));
    }
    Ok(())
}

pub fn positive_int(arg: &str) -> Result<(), ArgError> {
    if !POSITIVE_INT.is_match(arg) || arg.parse::<u64>().is_err() {
        return Err(ArgError::NotPositiveInt);
    }
    Ok(())
}

pub fn integer(arg: &str) -> Result<(), ArgError> {
    if !INTEGER.is_match(arg) || arg.parse::<i64>().is_err() {
        return Err(ArgError::NotInt);
    }
    Ok(())
}

pub fn username(arg: &str) -> Result<(), ArgError> {
    non_empty(arg)?;
    max_len(arg, USERNAME_MAX_LEN)?;

    first_invalid_char(arg, &USERNAME_CHAR)
}

/// Only the charset is checked here, the label itself is resolved when compiling.
pub fn rating_label(arg: &str) -> Result<(), ArgError> {
    non_empty(arg)?;
    first_invalid_char(arg, &RATING_LABEL_CHAR)
}

pub fn url(arg: &str) -> Result<(), ArgError> {
    non_empty(arg)?;
    let parsed = Url::parse(arg).map_err(|err| ArgError::InvalidUrl(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ArgError::InvalidUrl(format!("unsupported scheme {scheme}"))),
    }
}

/// Accepts url fragments, e.g. `example.com` out of `source=*example.com*`.
pub fn wildcard_url(arg: &str) -> Result<(), ArgError> {
    non_empty(arg)?;
    first_invalid_char(arg, &URL_CHAR)
}

/// Only the `type/subtype[+suffix]` shape is checked here; support for the
/// mimetype is resolved when compiling.
pub fn mimetype(arg: &str) -> Result<(), ArgError> {
    if !MIMETYPE.is_match(arg) {
        return Err(ArgError::InvalidMimetype);
    }
    Ok(())
}
