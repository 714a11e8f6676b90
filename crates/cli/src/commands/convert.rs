// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use rq_core::markup::{self, exchange, remote};

use crate::error::{Error, Result};

/// Rich-text markup dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Ticket-system wiki markup.
    Remote,
    Canonical,
    /// Exchange-document XHTML fragments.
    Exchange,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Remote => "remote",
            Dialect::Canonical => "canonical",
            Dialect::Exchange => "exchange",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "remote" => Ok(Dialect::Remote),
            "canonical" => Ok(Dialect::Canonical),
            "exchange" => Ok(Dialect::Exchange),
            _ => Err(Error::UnknownDialect(s.to_string())),
        }
    }
}

pub fn run(from: Dialect, to: Dialect, file: Option<PathBuf>) -> Result<()> {
    let input = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    println!("{}", convert(input.trim_end_matches('\n'), from, to));
    Ok(())
}

/// Translate `text` through the canonical form.
///
/// Exchange image references keep their data path as the image name, and
/// every image is treated as already attached.
pub(crate) fn convert(text: &str, from: Dialect, to: Dialect) -> String {
    let canonical = match from {
        Dialect::Remote => remote::to_canonical(text),
        Dialect::Canonical => text.to_string(),
        Dialect::Exchange => exchange::to_canonical(text, |data| Some(data.to_string())),
    };

    let attachments: BTreeMap<String, String> = markup::image_names(&canonical)
        .into_iter()
        .map(|name| (name.clone(), name))
        .collect();
    match to {
        Dialect::Remote => remote::to_remote(&canonical, &attachments),
        Dialect::Canonical => canonical,
        Dialect::Exchange => exchange::to_exchange(&canonical, &attachments),
    }
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
