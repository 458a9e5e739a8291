use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::accounts::dtos::{
    CompanyProfileDto, ProfileCommonDto, ProfileResponseDto, PublicProfileDto, RegisterAccountDto,
    StudentProfileDto, UpdateProfileDto,
};
use crate::features::accounts::models::{
    Account, NewAccount, ProfileFile, ProfileKind, ProfileUpdate, Role,
};
use crate::features::accounts::repositories::AccountRepository;
use crate::features::auth::model::{Caller, CallerAccount};
use crate::modules::storage::{paths, FileStorage, FileVisibility};
use crate::shared::uploads::{UploadedFile, AVATAR_RULE, COVER_LETTER_RULE, CV_RULE};

/// Registration and profile management
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    storage: Arc<dyn FileStorage>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepository>, storage: Arc<dyn FileStorage>) -> Self {
        Self { accounts, storage }
    }

    /// Create the account for a freshly authenticated identity
    pub async fn register(
        &self,
        caller: &Caller,
        dto: RegisterAccountDto,
    ) -> Result<ProfileResponseDto> {
        if caller.account.is_some() {
            return Err(AppError::Conflict(
                "Account is already registered".to_string(),
            ));
        }

        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let account = self
            .accounts
            .create(NewAccount {
                subject: caller.identity.sub.clone(),
                username: dto.username.trim().to_string(),
                email: dto.email.trim().to_string(),
                role: dto.role,
                full_name: dto.full_name.trim().to_string(),
            })
            .await?;

        info!(
            user_id = %account.user.id,
            role = %account.profile.role(),
            "Account registered"
        );

        self.profile_response(account).await
    }

    pub async fn me(&self, caller: &CallerAccount) -> Result<ProfileResponseDto> {
        let account = self.load(caller.user_id).await?;
        self.profile_response(account).await
    }

    pub async fn update_me(
        &self,
        caller: &CallerAccount,
        dto: UpdateProfileDto,
    ) -> Result<ProfileResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let current = self.load(caller.user_id).await?;
        if current.profile.role() == Role::Company && dto.has_student_fields() {
            return Err(AppError::Validation(
                "Company profiles do not have gender, education or experience".to_string(),
            ));
        }

        let update = ProfileUpdate {
            full_name: dto.full_name.trim().to_string(),
            bio: dto.bio,
            language: dto.language.trim().to_string(),
            linkedin_url: dto.linkedin_url.trim().to_string(),
            twitter_url: dto.twitter_url.trim().to_string(),
            website_url: dto.website_url.trim().to_string(),
            gender: dto.gender,
            education: dto
                .education
                .map(|list| list.into_iter().map(Into::into).collect()),
            experience: dto
                .experience
                .map(|list| list.into_iter().map(Into::into).collect()),
        };

        let account = self.accounts.update_profile(caller.user_id, update).await?;

        info!(user_id = %caller.user_id, "Profile updated");

        self.profile_response(account).await
    }

    /// Store an avatar, CV or cover letter and attach it to the caller's profile.
    /// The replaced object is removed afterwards when its key differs.
    pub async fn upload_profile_file(
        &self,
        caller: &CallerAccount,
        kind: ProfileFile,
        file: Option<UploadedFile>,
    ) -> Result<ProfileResponseDto> {
        let current = self.load(caller.user_id).await?;
        if kind.student_only() && current.profile.role() != Role::Student {
            return Err(AppError::Forbidden(
                "Only student profiles hold a CV or cover letter".to_string(),
            ));
        }

        let (rule, visibility) = match kind {
            ProfileFile::Avatar => (AVATAR_RULE, FileVisibility::Public),
            ProfileFile::Cv => (CV_RULE, FileVisibility::Private),
            ProfileFile::CoverLetter => (COVER_LETTER_RULE, FileVisibility::Private),
        };
        let file = rule.require(file.as_ref())?;

        let path = match kind {
            ProfileFile::Avatar => paths::avatar(caller.user_id, file),
            ProfileFile::Cv => paths::profile_cv(caller.user_id, file),
            ProfileFile::CoverLetter => paths::profile_cover_letter(caller.user_id, file),
        };
        let key = self.storage.object_key(visibility, &path);

        self.storage
            .store(&key, file.data.clone(), &file.content_type)
            .await?;

        let previous = self
            .accounts
            .set_profile_file(caller.user_id, kind, &key)
            .await?;

        if let Some(old) = previous.filter(|old| *old != key) {
            if let Err(e) = self.storage.remove(&old).await {
                warn!("Failed to remove replaced file '{}': {}", old, e);
            }
        }

        info!(user_id = %caller.user_id, file = ?kind, "Profile file stored");

        self.me(caller).await
    }

    /// Profile of another user as any registered user sees it
    pub async fn public_profile(&self, user_id: Uuid) -> Result<PublicProfileDto> {
        let account = self.load(user_id).await?;
        let role = account.profile.role();
        let common = self.common(&account).await?;

        Ok(PublicProfileDto { common, role })
    }

    async fn load(&self, user_id: Uuid) -> Result<Account> {
        self.accounts
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    async fn file_url(&self, key: Option<&str>) -> Result<Option<String>> {
        match key {
            Some(key) => Ok(Some(self.storage.file_url(key).await?)),
            None => Ok(None),
        }
    }

    async fn common(&self, account: &Account) -> Result<ProfileCommonDto> {
        let details = &account.profile.details;

        Ok(ProfileCommonDto {
            user_id: account.user.id,
            username: account.user.username.clone(),
            full_name: details.full_name.clone(),
            bio: details.bio.clone(),
            language: details.language.clone(),
            avatar_url: self.file_url(details.avatar_key.as_deref()).await?,
            linkedin_url: details.linkedin_url.clone(),
            twitter_url: details.twitter_url.clone(),
            website_url: details.website_url.clone(),
            updated_at: account.profile.updated_at,
        })
    }

    async fn profile_response(&self, account: Account) -> Result<ProfileResponseDto> {
        let common = self.common(&account).await?;
        let email = account.user.email.clone();

        match &account.profile.kind {
            ProfileKind::Company => {
                Ok(ProfileResponseDto::Company(CompanyProfileDto { common, email }))
            }
            ProfileKind::Student(student) => {
                let education = self.accounts.list_education(account.user.id).await?;
                let experience = self.accounts.list_experience(account.user.id).await?;

                Ok(ProfileResponseDto::Student(StudentProfileDto {
                    common,
                    email,
                    gender: student.gender,
                    cv_url: self.file_url(student.cv_key.as_deref()).await?,
                    cover_letter_url: self
                        .file_url(student.cover_letter_key.as_deref())
                        .await?,
                    education: education.into_iter().map(Into::into).collect(),
                    experience: experience.into_iter().map(Into::into).collect(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::accounts::dtos::{EducationDto, ExperienceDto};
    use crate::features::accounts::models::Gender;
    use crate::shared::test_helpers::{
        anonymous_identity, fake_email, fake_username, MemoryAccounts, MemoryStorage,
    };

    struct Fixture {
        service: AccountService,
        accounts: Arc<MemoryAccounts>,
        storage: Arc<MemoryStorage>,
    }

    fn fixture() -> Fixture {
        let accounts = Arc::new(MemoryAccounts::default());
        let storage = Arc::new(MemoryStorage::default());
        Fixture {
            service: AccountService::new(accounts.clone(), storage.clone()),
            accounts,
            storage,
        }
    }

    fn register_dto(role: Role) -> RegisterAccountDto {
        RegisterAccountDto {
            username: fake_username(),
            email: fake_email(),
            role,
            full_name: "Test Person".to_string(),
        }
    }

    async fn registered(f: &Fixture, role: Role) -> CallerAccount {
        let caller = anonymous_identity();
        let response = f.service.register(&caller, register_dto(role)).await.unwrap();
        let user_id = match response {
            ProfileResponseDto::Student(s) => s.common.user_id,
            ProfileResponseDto::Company(c) => c.common.user_id,
        };
        f.accounts.caller_account(user_id)
    }

    #[tokio::test]
    async fn test_register_creates_profile_with_role() {
        let f = fixture();
        let response = f
            .service
            .register(&anonymous_identity(), register_dto(Role::Company))
            .await
            .unwrap();

        assert!(matches!(response, ProfileResponseDto::Company(_)));
    }

    #[tokio::test]
    async fn test_register_twice_is_conflict() {
        let f = fixture();
        let account = registered(&f, Role::Student).await;

        let mut caller = anonymous_identity();
        caller.account = Some(account);

        let err = f
            .service
            .register(&caller, register_dto(Role::Company))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let f = fixture();
        let mut dto = register_dto(Role::Student);
        dto.username = "taken_name".to_string();
        f.service
            .register(&anonymous_identity(), dto.clone())
            .await
            .unwrap();

        let err = f
            .service
            .register(&anonymous_identity(), dto)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_student_profile_embeds_education_and_experience() {
        let f = fixture();
        let student = registered(&f, Role::Student).await;

        let dto = UpdateProfileDto {
            full_name: "Ada Lovelace".to_string(),
            gender: Some(Gender::Female),
            education: Some(vec![EducationDto {
                school_name: "University of London".to_string(),
                degree: "Mathematics".to_string(),
                start_date: None,
                end_date: None,
            }]),
            experience: Some(vec![ExperienceDto {
                company_name: "Analytical Engines".to_string(),
                role: "Programmer".to_string(),
                start_date: None,
                end_date: None,
                description: String::new(),
            }]),
            ..Default::default()
        };

        let response = f.service.update_me(&student, dto).await.unwrap();
        match response {
            ProfileResponseDto::Student(s) => {
                assert_eq!(s.common.full_name, "Ada Lovelace");
                assert_eq!(s.gender, Some(Gender::Female));
                assert_eq!(s.education.len(), 1);
                assert_eq!(s.experience.len(), 1);
            }
            other => panic!("expected student profile, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_omitted_lists_keep_existing_entries() {
        let f = fixture();
        let student = registered(&f, Role::Student).await;

        let with_school = UpdateProfileDto {
            education: Some(vec![EducationDto {
                school_name: "MIT".to_string(),
                degree: String::new(),
                start_date: None,
                end_date: None,
            }]),
            ..Default::default()
        };
        f.service.update_me(&student, with_school).await.unwrap();

        let bio_only = UpdateProfileDto {
            bio: "Hello".to_string(),
            ..Default::default()
        };
        let response = f.service.update_me(&student, bio_only).await.unwrap();
        match response {
            ProfileResponseDto::Student(s) => assert_eq!(s.education.len(), 1),
            other => panic!("expected student profile, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_company_cannot_set_student_fields() {
        let f = fixture();
        let company = registered(&f, Role::Company).await;

        let dto = UpdateProfileDto {
            gender: Some(Gender::Male),
            ..Default::default()
        };
        let err = f.service.update_me(&company, dto).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cv_upload_is_private_and_keyed_by_user() {
        let f = fixture();
        let student = registered(&f, Role::Student).await;

        let file = UploadedFile::new("resume.pdf", "application/pdf", vec![1u8; 1024]);
        let response = f
            .service
            .upload_profile_file(&student, ProfileFile::Cv, Some(file))
            .await
            .unwrap();

        let key = format!("private/cvs/{}/resume.pdf", student.user_id);
        assert!(f.storage.contains(&key));
        match response {
            ProfileResponseDto::Student(s) => {
                assert!(s.cv_url.unwrap().contains("presigned"));
            }
            other => panic!("expected student profile, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_replacing_avatar_removes_previous_object() {
        let f = fixture();
        let company = registered(&f, Role::Company).await;

        let first = UploadedFile::new("logo.png", "image/png", vec![1]);
        f.service
            .upload_profile_file(&company, ProfileFile::Avatar, Some(first))
            .await
            .unwrap();

        let second = UploadedFile::new("logo-v2.png", "image/png", vec![2]);
        f.service
            .upload_profile_file(&company, ProfileFile::Avatar, Some(second))
            .await
            .unwrap();

        assert!(!f
            .storage
            .contains(&format!("public/avatars/{}/logo.png", company.user_id)));
        assert!(f
            .storage
            .contains(&format!("public/avatars/{}/logo-v2.png", company.user_id)));
    }

    #[tokio::test]
    async fn test_company_cannot_store_cv() {
        let f = fixture();
        let company = registered(&f, Role::Company).await;

        let file = UploadedFile::new("resume.pdf", "application/pdf", vec![1]);
        let err = f
            .service
            .upload_profile_file(&company, ProfileFile::Cv, Some(file))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(f.storage.len(), 0);
    }

    #[tokio::test]
    async fn test_public_profile_of_unknown_user_is_not_found() {
        let f = fixture();
        let err = f.service.public_profile(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
