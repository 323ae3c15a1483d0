use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_http::{ApiClient, ApiError};
use shared_models::Credential;

use crate::models::{
    AvailabilitySlot, CatalogError, Practitioner, PractitionerFilters, SlotRecord, Specialty,
};

/// Read-only view of the practitioner directory.
#[async_trait]
pub trait PractitionerCatalog: Send + Sync {
    async fn list_practitioners(
        &self,
        filters: &PractitionerFilters,
        credential: &Credential,
    ) -> Result<Vec<Practitioner>, CatalogError>;

    async fn list_slots(
        &self,
        practitioner_id: i64,
        credential: &Credential,
    ) -> Result<Vec<AvailabilitySlot>, CatalogError>;

    async fn list_specialties(&self, credential: &Credential) -> Result<Vec<Specialty>, CatalogError> {
        let practitioners = self
            .list_practitioners(&PractitionerFilters::default(), credential)
            .await?;
        Ok(distinct_specialties(&practitioners))
    }

    async fn find_practitioner(
        &self,
        practitioner_id: i64,
        credential: &Credential,
    ) -> Result<Practitioner, CatalogError> {
        self.list_practitioners(&PractitionerFilters::default(), credential)
            .await?
            .into_iter()
            .find(|practitioner| practitioner.id == practitioner_id)
            .ok_or(CatalogError::PractitionerNotFound(practitioner_id))
    }
}

/// Specialties offered by at least one practitioner, compared
/// case-insensitively and sorted by name. The first spelling seen wins.
pub fn distinct_specialties(practitioners: &[Practitioner]) -> Vec<Specialty> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();

    for name in practitioners
        .iter()
        .filter_map(|practitioner| practitioner.specialty.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        seen.entry(name.to_lowercase()).or_insert_with(|| name.to_string());
    }

    seen.into_values().map(|name| Specialty { name }).collect()
}

/// Listings come either as a bare array or as a page with a `next` link.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Plain(Vec<T>),
    Paged {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
}

impl<T> Listing<T> {
    fn into_parts(self) -> (Vec<T>, Option<String>) {
        match self {
            Listing::Plain(items) => (items, None),
            Listing::Paged { results, next } => (results, next.filter(|url| !url.trim().is_empty())),
        }
    }
}

/// Upper bound on followed `next` links, in case a collaborator loops.
const MAX_PAGES: usize = 50;

fn map_api_error(error: ApiError) -> CatalogError {
    match error {
        ApiError::Decode(message) => CatalogError::InvalidResponse(message),
        ApiError::Status { status, message } if status.is_client_error() => {
            CatalogError::InvalidResponse(format!("{}: {}", status, message))
        }
        other => CatalogError::Network(other.to_string()),
    }
}

pub struct HttpPractitionerCatalog {
    client: ApiClient,
}

impl HttpPractitionerCatalog {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ApiClient::with_timeout(config.catalog_base_url.clone(), config.request_timeout()),
        }
    }

    /// Fetch a listing and every page after it. Filters only go on the first
    /// request; `next` links already carry them.
    async fn fetch_all<T>(
        &self,
        path: &str,
        credential: &Credential,
        query: &[(String, String)],
    ) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let first: Listing<T> = self
            .client
            .request(Method::GET, path, credential, query, None)
            .await?;
        let (mut items, mut next) = first.into_parts();

        let mut pages = 1;
        while let Some(url) = next.take() {
            if pages >= MAX_PAGES {
                warn!("Stopped following {} after {} pages", path, pages);
                break;
            }

            debug!("Following page link {}", url);
            let page: Listing<T> = self
                .client
                .request(Method::GET, &url, credential, &[], None)
                .await?;
            let (page_items, page_next) = page.into_parts();
            items.extend(page_items);
            next = page_next;
            pages += 1;
        }

        Ok(items)
    }
}

#[async_trait]
impl PractitionerCatalog for HttpPractitionerCatalog {
    async fn list_practitioners(
        &self,
        filters: &PractitionerFilters,
        credential: &Credential,
    ) -> Result<Vec<Practitioner>, CatalogError> {
        debug!("Listing practitioners with filters: {:?}", filters);

        let practitioners: Vec<Practitioner> = self
            .fetch_all("/public/kinesiologos/", credential, &filters.to_query())
            .await
            .map_err(map_api_error)?;

        debug!("Catalog returned {} practitioners", practitioners.len());
        Ok(practitioners)
    }

    async fn list_slots(
        &self,
        practitioner_id: i64,
        credential: &Credential,
    ) -> Result<Vec<AvailabilitySlot>, CatalogError> {
        debug!("Fetching slots for practitioner {}", practitioner_id);

        let path = format!("/public/kinesiologos/{}/horas/", practitioner_id);
        let records: Vec<SlotRecord> = self
            .fetch_all(&path, credential, &[])
            .await
            .map_err(|e| match e.status() {
                Some(StatusCode::NOT_FOUND) => CatalogError::PractitionerNotFound(practitioner_id),
                _ => map_api_error(e),
            })?;

        let mut slots = Vec::new();
        for record in records {
            if record.practitioner.is_some_and(|owner| owner != practitioner_id) {
                warn!(
                    "Dropping slot {} owned by practitioner {:?}, expected {}",
                    record.id, record.practitioner, practitioner_id
                );
                continue;
            }

            match record.into_slot(practitioner_id) {
                Ok(slot) => slots.push(slot),
                Err(e) => warn!("Dropping malformed slot: {}", e),
            }
        }

        debug!("Practitioner {} has {} slots", practitioner_id, slots.len());
        Ok(slots)
    }
}
