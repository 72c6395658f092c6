// src/zipcode.rs
//! Japanese postal code ↔ address consistency check against ZipCloud
//! (Japan Post data).

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const ZIPCLOUD_API_BASE: &str = "https://zipcloud.ibsnet.co.jp";
/// Official town value meaning "any town not listed elsewhere".
pub const UNLISTED_TOWN: &str = "以下に掲載がない場合";
pub const DEFAULT_LOOKUP_DELAY: Duration = Duration::from_millis(100);

static PREFECTURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(北海道|東京都|大阪府|京都府|.{2,3}県)").unwrap());
static MUNICIPALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?[市区町村]|.+?郡.+?[町村])").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialAddress {
    pub prefecture: String,
    pub city: String,
    pub town: String,
}

impl OfficialAddress {
    pub fn full(&self) -> String {
        format!("{}{}{}", self.prefecture, self.city, self.town)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressParts {
    pub prefecture: String,
    pub city: String,
    pub town: String,
}

/// Full-width digits to ASCII, hyphen variants removed.
pub fn normalize_zipcode(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | '−' | '‐'))
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            c => c,
        })
        .collect()
}

/// Split an address into prefecture, municipality and the rest. ASCII and
/// ideographic spaces are removed first.
pub fn split_address(address: &str) -> AddressParts {
    let a: String = address.chars().filter(|&c| c != ' ' && c != '　').collect();
    let Some(pref) = PREFECTURE.find(&a) else {
        return AddressParts {
            town: a,
            ..AddressParts::default()
        };
    };
    let rest = &a[pref.end()..];
    match MUNICIPALITY.find(rest) {
        Some(city) => AddressParts {
            prefecture: pref.as_str().to_string(),
            city: city.as_str().to_string(),
            town: rest[city.end()..].to_string(),
        },
        None => AddressParts {
            prefecture: pref.as_str().to_string(),
            city: String::new(),
            town: rest.to_string(),
        },
    }
}

/// Prefecture and municipality must be equal; the town matches when either
/// side contains the other, the input town is empty, or the official entry
/// is the "unlisted" catch-all.
pub fn matches_official(input: &AddressParts, official: &OfficialAddress) -> bool {
    input.prefecture == official.prefecture
        && input.city == official.city
        && (input.town.is_empty()
            || official.town == UNLISTED_TOWN
            || official.town.contains(&input.town)
            || input.town.contains(&official.town))
}

/// Resolves a normalized 7-digit code to its official addresses.
#[async_trait::async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, zipcode: &str) -> Result<Vec<OfficialAddress>>;
}

#[derive(Debug, Deserialize)]
struct ZipCloudResponse {
    status: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Option<Vec<ZipCloudResult>>,
}

#[derive(Debug, Deserialize)]
struct ZipCloudResult {
    address1: String,
    address2: String,
    address3: String,
}

#[derive(Clone)]
pub struct ZipCloudClient {
    base: String,
    client: Client,
    timeout: Duration,
}

impl Default for ZipCloudClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipCloudClient {
    pub fn new() -> Self {
        Self {
            base: ZIPCLOUD_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl AddressLookup for ZipCloudClient {
    async fn lookup(&self, zipcode: &str) -> Result<Vec<OfficialAddress>> {
        let body: ZipCloudResponse = self
            .client
            .get(format!("{}/api/search", self.base))
            .query(&[("zipcode", zipcode)])
            .timeout(self.timeout)
            .send()
            .await
            .context("zipcloud request")?
            .error_for_status()
            .context("zipcloud status")?
            .json()
            .await
            .context("zipcloud json")?;

        if body.status != 200 {
            return Err(anyhow!(
                "zipcloud status {}: {}",
                body.status,
                body.message.unwrap_or_default()
            ));
        }
        Ok(body
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|r| OfficialAddress {
                prefecture: r.address1,
                city: r.address2,
                town: r.address3,
            })
            .collect())
    }
}

/// Per-run lookup cache. Only successful lookups are stored.
#[derive(Debug, Default)]
pub struct ZipCache {
    entries: HashMap<String, Vec<OfficialAddress>>,
}

impl ZipCache {
    pub fn get(&self, zipcode: &str) -> Option<&Vec<OfficialAddress>> {
        self.entries.get(zipcode)
    }

    pub fn insert(&mut self, zipcode: String, addresses: Vec<OfficialAddress>) {
        self.entries.insert(zipcode, addresses);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ZipcodeCheck {
    Match { official_address: String },
    InvalidZipcode,
    NotFound,
    Mismatch {
        expected_addresses: Vec<String>,
        parsed_input: AddressParts,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub zipcode: String,
    pub address: String,
    #[serde(flatten)]
    pub check: ZipcodeCheck,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self.check, ZipcodeCheck::Match { .. })
    }

    pub fn message(&self) -> String {
        match &self.check {
            ZipcodeCheck::Match { .. } => "一致しました".to_string(),
            ZipcodeCheck::InvalidZipcode => format!("郵便番号が7桁ではありません: {}", self.zipcode),
            ZipcodeCheck::NotFound => format!("郵便番号が見つかりません: {}", self.zipcode),
            ZipcodeCheck::Mismatch { .. } => "郵便番号と住所が一致しません".to_string(),
        }
    }
}

/// One row of a batch input file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZipcodeRecord {
    #[serde(default)]
    pub name: Option<String>,
    pub zipcode: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl BatchSummary {
    pub fn of(results: &[ValidationResult]) -> Self {
        let valid = results.iter().filter(|r| r.is_valid()).count();
        Self {
            total: results.len(),
            valid,
            invalid: results.len() - valid,
        }
    }
}

pub struct ZipcodeValidator<L: AddressLookup> {
    lookup: L,
    cache: ZipCache,
    delay: Duration,
}

impl<L: AddressLookup> ZipcodeValidator<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            cache: ZipCache::default(),
            delay: DEFAULT_LOOKUP_DELAY,
        }
    }

    /// Pause after every uncached lookup.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn cache(&self) -> &ZipCache {
        &self.cache
    }

    async fn addresses(&mut self, zipcode: &str) -> Vec<OfficialAddress> {
        if let Some(hit) = self.cache.get(zipcode) {
            return hit.clone();
        }
        let res = self.lookup.lookup(zipcode).await;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match res {
            Ok(found) => {
                self.cache.insert(zipcode.to_string(), found.clone());
                found
            }
            Err(e) => {
                tracing::warn!(error = ?e, zipcode, "zipcode lookup failed");
                Vec::new()
            }
        }
    }

    pub async fn validate(&mut self, zipcode: &str, address: &str) -> ValidationResult {
        let check = self.check(zipcode, address).await;
        ValidationResult {
            name: None,
            zipcode: zipcode.to_string(),
            address: address.to_string(),
            check,
        }
    }

    async fn check(&mut self, zipcode: &str, address: &str) -> ZipcodeCheck {
        let clean = normalize_zipcode(zipcode);
        if clean.chars().count() != 7 {
            return ZipcodeCheck::InvalidZipcode;
        }
        let official = self.addresses(&clean).await;
        if official.is_empty() {
            return ZipcodeCheck::NotFound;
        }
        let parts = split_address(address);
        if let Some(hit) = official.iter().find(|o| matches_official(&parts, o)) {
            return ZipcodeCheck::Match {
                official_address: hit.full(),
            };
        }
        ZipcodeCheck::Mismatch {
            expected_addresses: official.iter().map(OfficialAddress::full).collect(),
            parsed_input: parts,
        }
    }

    /// Validate rows in order.
    pub async fn validate_batch(&mut self, records: Vec<ZipcodeRecord>) -> Vec<ValidationResult> {
        let mut out = Vec::with_capacity(records.len());
        for r in records {
            let mut res = self.validate(&r.zipcode, &r.address).await;
            res.name = r.name;
            if res.is_valid() {
                tracing::debug!(zipcode = %res.zipcode, "zipcode matched");
            } else {
                tracing::info!(zipcode = %res.zipcode, message = %res.message(), "zipcode check failed");
            }
            out.push(res);
        }
        out
    }
}
