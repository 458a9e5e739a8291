use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::MarketplaceConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::gate;
use crate::features::auth::model::{Caller, CallerAccount};
use crate::features::internships::dtos::{
    BrowseQuery, CatalogFacetsDto, InternshipDetailDto, InternshipFormDto, InternshipListingDto,
    InternshipResponseDto, OwnedQuery,
};
use crate::features::internships::repositories::InternshipRepository;
use crate::shared::types::Meta;

/// Posting catalog: company-side editing and the public browse listing
pub struct InternshipService {
    internships: Arc<dyn InternshipRepository>,
    config: MarketplaceConfig,
}

impl InternshipService {
    pub fn new(internships: Arc<dyn InternshipRepository>, config: MarketplaceConfig) -> Self {
        Self {
            internships,
            config,
        }
    }

    /// Create a posting owned by the calling company
    pub async fn create(
        &self,
        owner: &CallerAccount,
        dto: InternshipFormDto,
    ) -> Result<InternshipResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let internship = self.internships.insert(owner.user_id, dto.into()).await?;

        info!(
            internship_id = %internship.id,
            owner_id = %owner.user_id,
            "Internship created"
        );

        Ok(internship.into())
    }

    /// Replace a posting's fields. Postings owned by someone else are reported
    /// as missing.
    pub async fn update(
        &self,
        owner: &CallerAccount,
        id: Uuid,
        dto: InternshipFormDto,
    ) -> Result<InternshipResponseDto> {
        let existing = self
            .internships
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Internship not found".to_string()))?;
        gate::ensure_owner(existing.owner_id, owner, "Internship")?;

        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let internship = self
            .internships
            .update(id, owner.user_id, dto.into())
            .await?
            .ok_or_else(|| AppError::NotFound("Internship not found".to_string()))?;

        info!(internship_id = %id, "Internship updated");

        Ok(internship.into())
    }

    /// Active postings for anyone; students also see which ones they applied to
    pub async fn browse(
        &self,
        caller: Option<&Caller>,
        query: BrowseQuery,
    ) -> Result<(Vec<InternshipListingDto>, Meta)> {
        let page = query.page().with_size(self.config.browse_page_size);
        let viewer = caller.and_then(Caller::student_id);

        let (rows, total) = self
            .internships
            .browse(&query.filter(), viewer, page)
            .await?;

        Ok((
            rows.into_iter().map(Into::into).collect(),
            Meta::paginated(page, total),
        ))
    }

    /// All postings of the calling company, active or not
    pub async fn list_owned(
        &self,
        owner: &CallerAccount,
        query: OwnedQuery,
    ) -> Result<(Vec<InternshipListingDto>, Meta)> {
        let page = query.page().with_size(self.config.owned_page_size);

        let (rows, total) = self
            .internships
            .list_owned(owner.user_id, &query.filter(), page)
            .await?;

        Ok((
            rows.into_iter().map(Into::into).collect(),
            Meta::paginated(page, total),
        ))
    }

    /// Posting detail. Inactive postings are only visible to their owner.
    pub async fn detail(&self, caller: Option<&Caller>, id: Uuid) -> Result<InternshipDetailDto> {
        let viewer = caller.and_then(Caller::student_id);
        let listing = self
            .internships
            .listing(id, viewer)
            .await?
            .ok_or_else(|| AppError::NotFound("Internship not found".to_string()))?;

        let is_owner = caller.and_then(Caller::user_id) == Some(listing.internship.owner_id);
        if !listing.internship.is_active && !is_owner {
            return Err(AppError::NotFound("Internship not found".to_string()));
        }

        Ok(listing.into())
    }

    pub async fn facets(&self) -> Result<CatalogFacetsDto> {
        Ok(self.internships.facets().await?.into())
    }
}
