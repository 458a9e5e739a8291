use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::accounts::{
    dtos as accounts_dtos, handlers as accounts_handlers, models as accounts_models,
};
use crate::features::applications::{
    dtos as applications_dtos, handlers as applications_handlers, models as applications_models,
};
use crate::features::internships::{dtos as internships_dtos, handlers as internships_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Accounts
        accounts_handlers::register,
        accounts_handlers::get_my_profile,
        accounts_handlers::update_my_profile,
        accounts_handlers::upload_avatar,
        accounts_handlers::upload_cv,
        accounts_handlers::upload_cover_letter,
        accounts_handlers::get_public_profile,
        // Internships (public)
        internships_handlers::browse_internships,
        internships_handlers::get_facets,
        internships_handlers::get_internship,
        // Company
        internships_handlers::create_internship,
        internships_handlers::list_my_internships,
        internships_handlers::update_internship,
        applications_handlers::list_company_applications,
        applications_handlers::list_internship_applications,
        applications_handlers::export_company_applications,
        applications_handlers::export_internship_applications,
        applications_handlers::update_application_status,
        // Student
        applications_handlers::apply,
        applications_handlers::list_my_applications,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Accounts
            accounts_models::Role,
            accounts_models::Gender,
            accounts_dtos::RegisterAccountDto,
            accounts_dtos::UpdateProfileDto,
            accounts_dtos::EducationDto,
            accounts_dtos::ExperienceDto,
            accounts_dtos::ProfileCommonDto,
            accounts_dtos::StudentProfileDto,
            accounts_dtos::CompanyProfileDto,
            accounts_dtos::ProfileResponseDto,
            accounts_dtos::PublicProfileDto,
            accounts_dtos::FileUploadDto,
            ApiResponse<accounts_dtos::ProfileResponseDto>,
            ApiResponse<accounts_dtos::PublicProfileDto>,
            // Internships
            internships_dtos::InternshipFormDto,
            internships_dtos::InternshipResponseDto,
            internships_dtos::InternshipListingDto,
            internships_dtos::InternshipDetailDto,
            internships_dtos::CatalogFacetsDto,
            ApiResponse<internships_dtos::InternshipResponseDto>,
            ApiResponse<Vec<internships_dtos::InternshipListingDto>>,
            ApiResponse<internships_dtos::InternshipDetailDto>,
            ApiResponse<internships_dtos::CatalogFacetsDto>,
            // Applications
            applications_models::ApplicationStatus,
            applications_dtos::ApplyFormDto,
            applications_dtos::UpdateStatusDto,
            applications_dtos::StatusDto,
            applications_dtos::StudentApplicationDto,
            applications_dtos::ApplicantDto,
            applications_dtos::CompanyApplicationDto,
            ApiResponse<applications_dtos::StudentApplicationDto>,
            ApiResponse<Vec<applications_dtos::StudentApplicationDto>>,
            ApiResponse<applications_dtos::CompanyApplicationDto>,
            ApiResponse<Vec<applications_dtos::CompanyApplicationDto>>,
        )
    ),
    tags(
        (name = "accounts", description = "Registration and profiles"),
        (name = "internships", description = "Public internship catalog"),
        (name = "company", description = "Posting management and application review (company only)"),
        (name = "student", description = "Applying and tracking applications (student only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Elevate API",
        version = "0.1.0",
        description = "API documentation for the Elevate internship marketplace",
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` JWT scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/accounts/register",
            "/api/profile/me",
            "/api/internships",
            "/api/internships/{id}",
            "/api/company/internships/{id}",
            "/api/company/applications/export",
            "/api/company/applications/{id}/status",
            "/api/company/internships/{id}/applications/export",
            "/api/student/internships/{id}/apply",
            "/api/student/applications",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
