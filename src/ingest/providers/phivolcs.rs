use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use scraper::{Html, Selector};
use std::time::Duration;

use crate::config::SourceConfig;
use crate::ingest::types::QuakeSource;
use crate::ingest::{datetime_from_bulletin, normalize_cell, normalize_table_datetime};
use crate::quake::QuakeRecord;

/// PHIVOLCS "Latest Earthquake Information" table.
pub struct PhivolcsProvider {
    mode: Mode,
    base_url: String,
    parse_limit: usize,
    row_selector: String,
    utc_offset_hours: i32,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl PhivolcsProvider {
    /// Serve a fixed page; bulletin links resolve against `cfg.base_url`.
    pub fn from_fixture(html: &str, cfg: &SourceConfig) -> Self {
        Self::with_mode(Mode::Fixture(html.to_string()), cfg)
    }

    pub fn from_config(cfg: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building http client")?;
        let url = cfg.base_url.clone();
        Ok(Self::with_mode(Mode::Http { url, client }, cfg))
    }

    fn with_mode(mode: Mode, cfg: &SourceConfig) -> Self {
        Self {
            mode,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            parse_limit: cfg.parse_limit,
            row_selector: cfg.row_selector.clone(),
            utc_offset_hours: cfg.utc_offset_hours,
        }
    }

    pub fn parse_page(&self, html: &str) -> Result<Vec<QuakeRecord>> {
        let t0 = std::time::Instant::now();
        let rows_sel = Selector::parse(&self.row_selector)
            .map_err(|e| anyhow!("invalid row selector {:?}: {e:?}", self.row_selector))?;
        let td_sel = Selector::parse("td").map_err(|e| anyhow!("td selector: {e:?}"))?;
        let a_sel = Selector::parse("a[href]").map_err(|e| anyhow!("link selector: {e:?}"))?;

        let doc = Html::parse_document(html);
        let mut matched = 0usize;
        let mut out = Vec::new();

        for tr in doc.select(&rows_sel).take(self.parse_limit) {
            matched += 1;
            let tds: Vec<_> = tr.select(&td_sel).collect();
            if tds.len() < 6 {
                continue;
            }
            let cell = |i: usize| normalize_cell(&tds[i].text().collect::<String>());

            let link = tds[0]
                .select(&a_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|h| h.trim().replace('\\', "/"))
                .unwrap_or_default();
            let bulletin = if link.is_empty() {
                String::new()
            } else {
                format!("{}/{}", self.base_url, link.trim_start_matches('/'))
            };

            // The bulletin URL has second precision; the table text only minutes.
            let timestamp = datetime_from_bulletin(&bulletin, self.utc_offset_hours)
                .unwrap_or_else(|| normalize_table_datetime(&cell(0)));

            out.push(QuakeRecord::new(
                timestamp,
                cell(1),
                cell(2),
                cell(3),
                cell(4),
                cell(5),
                bulletin,
            ));
        }

        if matched == 0 {
            return Err(anyhow!(
                "no rows matched selector {:?}; page layout changed?",
                self.row_selector
            ));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("quake_parse_ms").record(ms);
        counter!("quake_scraped_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl QuakeSource for PhivolcsProvider {
    async fn fetch_latest(&self) -> Result<Vec<QuakeRecord>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_page(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url.as_str())
                    .send()
                    .await
                    .context("phivolcs http get()")?
                    .error_for_status()
                    .context("phivolcs non-2xx")?
                    .text()
                    .await
                    .context("phivolcs http .text()")?;
                self.parse_page(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "phivolcs"
    }
}
