// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use bulkgrid_app::{FieldId, Record, RecordId, Schema, SchemaId};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE as CONTENT_TYPE_HEADER;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::RecordStore;
use crate::wire::{
    CONTENT_TYPE, Collection, ContentTypeDto, EntryDto, ErrorEnvelope, VERSION_HEADER,
    encode_fields,
};

const SCHEMA_PAGE_LIMIT: &str = "1000";

/// Blocking client for one space environment of the Content Management API.
#[derive(Clone)]
pub struct Client {
    base_url: String,
    space_id: String,
    environment: String,
    token: String,
    timeout: Duration,
    http: HttpClient,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("space_id", &self.space_id)
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(
        base_url: &str,
        space_id: &str,
        environment: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("store.base_url must not be empty");
        }
        if space_id.trim().is_empty() {
            bail!("store.space_id must not be empty");
        }
        if environment.trim().is_empty() {
            bail!("store.environment must not be empty");
        }
        if token.trim().is_empty() {
            bail!("store access token is empty -- export the variable named by store.token_env");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            space_id: space_id.to_owned(),
            environment: environment.to_owned(),
            token: token.to_owned(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn space_id(&self) -> &str {
        &self.space_id
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Checks credentials and the space/environment pair with one cheap call.
    pub fn ping(&self) -> Result<()> {
        let url = self.endpoint(&["content_types"], &[("limit", "1")])?;
        self.send(self.http.get(url))?;
        Ok(())
    }

    /// `{base}/spaces/{space}/environments/{env}/{segments..}`, each segment
    /// percent-encoded. A query string is added only when `query` has pairs.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("store.base_url {:?} is not a valid URL", self.base_url))?;
        url.path_segments_mut()
            .map_err(|()| anyhow!("store.base_url {:?} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend([
                "spaces",
                self.space_id.as_str(),
                "environments",
                self.environment.as_str(),
            ])
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }
}

impl RecordStore for Client {
    fn list_schemas(&self) -> Result<Vec<Schema>> {
        let url = self.endpoint(&["content_types"], &[("limit", SCHEMA_PAGE_LIMIT)])?;
        let parsed: Collection<ContentTypeDto> = self
            .send(self.http.get(url))?
            .json()
            .context("decode content type list")?;
        debug!(count = parsed.items.len(), "listed content types");
        parsed
            .items
            .into_iter()
            .map(ContentTypeDto::into_schema)
            .collect()
    }

    fn get_schema(&self, id: &SchemaId) -> Result<Schema> {
        let url = self.endpoint(&["content_types", id.as_str()], &[])?;
        let parsed: ContentTypeDto = self
            .send(self.http.get(url))?
            .json()
            .with_context(|| format!("decode content type {id}"))?;
        parsed.into_schema()
    }

    fn get_records(
        &self,
        schema_id: &SchemaId,
        order_field: Option<&FieldId>,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let limit = limit.to_string();
        let order = order_field.map(|field| format!("fields.{field}"));
        let mut query = vec![("content_type", schema_id.as_str()), ("limit", limit.as_str())];
        if let Some(order) = order.as_deref() {
            query.push(("order", order));
        }

        let url = self.endpoint(&["entries"], &query)?;
        let parsed: Collection<EntryDto> = self
            .send(self.http.get(url))?
            .json()
            .with_context(|| format!("decode entries of {schema_id}"))?;
        debug!(schema = %schema_id, count = parsed.items.len(), "fetched entries");
        parsed.items.into_iter().map(EntryDto::into_record).collect()
    }

    fn get_record(&self, id: &RecordId) -> Result<Record> {
        let url = self.endpoint(&["entries", id.as_str()], &[])?;
        let parsed: EntryDto = self
            .send(self.http.get(url))?
            .json()
            .with_context(|| format!("decode entry {id}"))?;
        parsed.into_record()
    }

    fn update_record(&self, id: &RecordId, record: &Record) -> Result<Record> {
        let url = self.endpoint(&["entries", id.as_str()], &[])?;
        let request = self
            .http
            .put(url)
            .header(CONTENT_TYPE_HEADER, CONTENT_TYPE)
            .header(VERSION_HEADER, record.version.to_string())
            .json(&encode_fields(record));
        let parsed: EntryDto = self
            .send(request)?
            .json()
            .with_context(|| format!("decode updated entry {id}"))?;
        parsed.into_record()
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check store.base_url and your network ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return match parsed.sys.and_then(|sys| sys.id) {
            Some(code) => anyhow!("server error ({}, {}): {}", status.as_u16(), code, message),
            None => anyhow!("server error ({}): {}", status.as_u16(), message),
        };
    }

    if status == StatusCode::UNAUTHORIZED {
        return anyhow!("server rejected the access token (401) -- check store.token_env");
    }

    if body.len() < 100 && !body.contains('{') && !body.is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}
