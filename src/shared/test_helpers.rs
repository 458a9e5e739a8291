//! In-memory repositories, storage and callers for service and router tests

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::Utc;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::Fake;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::accounts::models::{
    Account, AccountSummary, Education, Experience, NewAccount, Profile, ProfileDetails,
    ProfileFile, ProfileKind, ProfileUpdate, Role, StudentDetails, User,
};
use crate::features::accounts::repositories::AccountRepository;
use crate::features::applications::models::{
    Application, ApplicationFilter, ApplicationRecord, ApplicationStatus, CompanyScope,
    NewApplication,
};
use crate::features::applications::repositories::ApplicationRepository;
use crate::features::auth::model::{AuthenticatedUser, Caller, CallerAccount};
use crate::features::internships::models::{
    BrowseFilter, CatalogFacets, Internship, InternshipFields, InternshipListing, OwnedFilter,
};
use crate::features::internships::repositories::InternshipRepository;
use crate::modules::storage::{FileStorage, FileVisibility};
use crate::shared::constants::ROLE_SUPER_ADMIN;
use crate::shared::types::PageRequest;

// =============================================================================
// CALLERS
// =============================================================================

/// A validated identity that has not registered an account
pub fn anonymous_identity() -> Caller {
    Caller {
        identity: AuthenticatedUser {
            sub: Uuid::new_v4().to_string(),
            roles: vec![],
        },
        account: None,
    }
}

pub fn caller_for(account: &CallerAccount) -> Caller {
    Caller {
        identity: AuthenticatedUser {
            sub: format!("sub-{}", account.user_id),
            roles: vec![],
        },
        account: Some(account.clone()),
    }
}

pub fn super_admin(account: Option<&CallerAccount>) -> Caller {
    Caller {
        identity: AuthenticatedUser {
            sub: Uuid::new_v4().to_string(),
            roles: vec![ROLE_SUPER_ADMIN.to_string()],
        },
        account: account.cloned(),
    }
}

/// Username accepted by registration and unique per call
pub fn fake_username() -> String {
    let base: String = Username().fake();
    let base: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", base, &suffix[..8])
}

pub fn fake_email() -> String {
    SafeEmail().fake()
}

/// Make every request through `router` arrive as `caller`
pub fn with_caller(router: Router, caller: Caller) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let caller = caller.clone();
            async move {
                request.extensions_mut().insert(caller);
                next.run(request).await
            }
        },
    ))
}

// =============================================================================
// SHARED STATE
// =============================================================================

/// Rows shared by the in-memory repositories. Every insert takes the next
/// sequence number, which stands in for insertion time when ordering.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    seq: u64,
    users: Vec<User>,
    profiles: HashMap<Uuid, Profile>,
    education: Vec<Education>,
    experience: Vec<Experience>,
    internships: Vec<(u64, Internship)>,
    applications: Vec<(u64, Application)>,
}

impl StoreState {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn username(&self, id: Uuid) -> String {
        self.user(id).map(|u| u.username.clone()).unwrap_or_default()
    }

    fn account(&self, id: Uuid) -> Option<Account> {
        let user = self.user(id)?.clone();
        let profile = self.profiles.get(&id)?.clone();
        Some(Account { user, profile })
    }

    fn internship(&self, id: Uuid) -> Option<&Internship> {
        self.internships
            .iter()
            .map(|(_, i)| i)
            .find(|i| i.id == id)
    }

    fn insert_account(&mut self, new: NewAccount) -> Result<Account> {
        if self.users.iter().any(|u| u.subject == new.subject) {
            return Err(AppError::Conflict(
                "Account is already registered".to_string(),
            ));
        }
        if self.users.iter().any(|u| u.username == new.username) {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            subject: new.subject,
            username: new.username,
            email: new.email,
            created_at: now,
        };
        let profile = Profile {
            user_id: user.id,
            details: ProfileDetails {
                full_name: new.full_name,
                ..Default::default()
            },
            kind: match new.role {
                Role::Student => ProfileKind::Student(StudentDetails::default()),
                Role::Company => ProfileKind::Company,
            },
            updated_at: now,
        };

        self.profiles.insert(user.id, profile.clone());
        self.users.push(user.clone());

        Ok(Account { user, profile })
    }

    fn listing(&self, internship: &Internship, viewer: Option<Uuid>) -> InternshipListing {
        let on_posting = || {
            self.applications
                .iter()
                .map(|(_, a)| a)
                .filter(move |a| a.internship_id == internship.id)
        };

        InternshipListing {
            internship: internship.clone(),
            owner_username: self.username(internship.owner_id),
            applicant_count: on_posting().count() as i64,
            applied_at: viewer.and_then(|student| {
                on_posting()
                    .find(|a| a.student_id == student)
                    .map(|a| a.submitted_at)
            }),
        }
    }

    fn record(&self, application: &Application) -> Option<ApplicationRecord> {
        let internship = self.internship(application.internship_id)?;
        let student = self.user(application.student_id)?;
        let full_name = self
            .profiles
            .get(&student.id)
            .map(|p| p.details.full_name.clone())
            .unwrap_or_default();

        Some(ApplicationRecord {
            application: application.clone(),
            internship_title: internship.title.clone(),
            internship_owner_id: internship.owner_id,
            company_username: self.username(internship.owner_id),
            student_username: student.username.clone(),
            student_email: student.email.clone(),
            student_full_name: full_name,
        })
    }

    /// Internships newest first
    fn internships_desc(&self) -> Vec<&Internship> {
        let mut rows: Vec<_> = self.internships.iter().collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter().map(|(_, i)| i).collect()
    }

    /// Application records newest first
    fn records_desc(&self) -> Vec<ApplicationRecord> {
        let mut rows: Vec<_> = self.applications.iter().collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter().filter_map(|(_, a)| self.record(a)).collect()
    }
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("memory store poisoned")
    }

    /// Register a user with a profile of `role`
    pub fn add_user(&self, username: &str, role: Role) -> CallerAccount {
        let account = self
            .lock()
            .insert_account(NewAccount {
                subject: Uuid::new_v4().to_string(),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                role,
                full_name: username.to_string(),
            })
            .expect("add_user");

        CallerAccount {
            user_id: account.user.id,
            username: account.user.username,
            role,
        }
    }

    pub fn add_internship(&self, owner_id: Uuid, fields: InternshipFields) -> Internship {
        let mut state = self.lock();
        let seq = state.next_seq();
        let internship = Internship {
            id: Uuid::now_v7(),
            owner_id,
            title: fields.title,
            location: fields.location,
            is_remote: fields.is_remote,
            description: fields.description,
            requirements: fields.requirements,
            posted_at: Utc::now(),
            deadline: fields.deadline,
            is_active: fields.is_active,
        };
        state.internships.push((seq, internship.clone()));
        internship
    }

    pub fn internship(&self, id: Uuid) -> Option<Internship> {
        self.lock().internship(id).cloned()
    }

    /// Insert an application directly, bypassing file handling
    pub fn add_application(&self, internship_id: Uuid, student_id: Uuid) -> Application {
        self.insert_application(NewApplication {
            internship_id,
            student_id,
            cv_key: format!(
                "private/applications/internship_{}/student_{}/cv.pdf",
                internship_id, student_id
            ),
            cover_letter_key: None,
        })
        .expect("student already applied")
    }

    pub fn set_status(&self, id: Uuid, status: ApplicationStatus) {
        if let Some((_, a)) = self.lock().applications.iter_mut().find(|(_, a)| a.id == id) {
            a.status = status;
        }
    }

    pub fn application_count(&self, internship_id: Uuid, student_id: Uuid) -> usize {
        self.lock()
            .applications
            .iter()
            .filter(|(_, a)| a.internship_id == internship_id && a.student_id == student_id)
            .count()
    }

    fn insert_application(&self, new: NewApplication) -> Option<Application> {
        let mut state = self.lock();
        let exists = state
            .applications
            .iter()
            .any(|(_, a)| a.internship_id == new.internship_id && a.student_id == new.student_id);
        if exists {
            return None;
        }

        let seq = state.next_seq();
        let application = Application {
            id: Uuid::now_v7(),
            internship_id: new.internship_id,
            student_id: new.student_id,
            status: ApplicationStatus::New,
            submitted_at: Utc::now(),
            cv_key: new.cv_key,
            cover_letter_key: new.cover_letter_key,
        };
        state.applications.push((seq, application.clone()));
        Some(application)
    }
}

fn contains(haystack: &str, needle: &Option<String>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

fn page_of<T>(rows: Vec<T>, page: PageRequest) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let rows = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (rows, total)
}

// =============================================================================
// REPOSITORIES
// =============================================================================

#[derive(Default)]
pub struct MemoryAccounts {
    store: Arc<MemoryStore>,
}

impl MemoryAccounts {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Resolve a registered user the way the auth middleware would
    pub fn caller_account(&self, user_id: Uuid) -> CallerAccount {
        let state = self.store.lock();
        let user = state.user(user_id).expect("unknown user");
        let profile = state.profiles.get(&user_id).expect("missing profile");
        CallerAccount {
            user_id,
            username: user.username.clone(),
            role: profile.role(),
        }
    }
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<AccountSummary>> {
        let state = self.store.lock();
        Ok(state
            .users
            .iter()
            .find(|u| u.subject == subject)
            .and_then(|u| {
                state.profiles.get(&u.id).map(|p| AccountSummary {
                    user_id: u.id,
                    username: u.username.clone(),
                    role: p.role(),
                })
            }))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<Account>> {
        Ok(self.store.lock().account(user_id))
    }

    async fn create(&self, account: NewAccount) -> Result<Account> {
        self.store.lock().insert_account(account)
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Account> {
        let mut state = self.store.lock();
        let profile = state
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        profile.details.full_name = update.full_name;
        profile.details.bio = update.bio;
        profile.details.language = update.language;
        profile.details.linkedin_url = update.linkedin_url;
        profile.details.twitter_url = update.twitter_url;
        profile.details.website_url = update.website_url;
        if let ProfileKind::Student(student) = &mut profile.kind {
            student.gender = update.gender;
        }
        profile.updated_at = Utc::now();

        if let Some(entries) = update.education {
            state.education.retain(|e| e.profile_id != user_id);
            state
                .education
                .extend(entries.into_iter().map(|e| Education {
                    id: Uuid::now_v7(),
                    profile_id: user_id,
                    school_name: e.school_name,
                    degree: e.degree,
                    start_date: e.start_date,
                    end_date: e.end_date,
                }));
        }

        if let Some(entries) = update.experience {
            state.experience.retain(|e| e.profile_id != user_id);
            state
                .experience
                .extend(entries.into_iter().map(|e| Experience {
                    id: Uuid::now_v7(),
                    profile_id: user_id,
                    company_name: e.company_name,
                    role: e.role,
                    start_date: e.start_date,
                    end_date: e.end_date,
                    description: e.description,
                }));
        }

        state
            .account(user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn set_profile_file(
        &self,
        user_id: Uuid,
        file: ProfileFile,
        key: &str,
    ) -> Result<Option<String>> {
        let mut state = self.store.lock();
        let profile = state
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let slot = match (file, &mut profile.kind) {
            (ProfileFile::Avatar, _) => &mut profile.details.avatar_key,
            (ProfileFile::Cv, ProfileKind::Student(s)) => &mut s.cv_key,
            (ProfileFile::CoverLetter, ProfileKind::Student(s)) => &mut s.cover_letter_key,
            (_, ProfileKind::Company) => {
                return Err(AppError::Internal(
                    "Company profiles cannot hold student files".to_string(),
                ))
            }
        };

        let previous = slot.replace(key.to_string());
        profile.updated_at = Utc::now();
        Ok(previous)
    }

    async fn list_education(&self, user_id: Uuid) -> Result<Vec<Education>> {
        Ok(self
            .store
            .lock()
            .education
            .iter()
            .filter(|e| e.profile_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_experience(&self, user_id: Uuid) -> Result<Vec<Experience>> {
        Ok(self
            .store
            .lock()
            .experience
            .iter()
            .filter(|e| e.profile_id == user_id)
            .cloned()
            .collect())
    }
}

pub struct MemoryInternships {
    store: Arc<MemoryStore>,
}

impl MemoryInternships {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InternshipRepository for MemoryInternships {
    async fn insert(&self, owner_id: Uuid, fields: InternshipFields) -> Result<Internship> {
        Ok(self.store.add_internship(owner_id, fields))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Internship>> {
        Ok(self.store.internship(id))
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        fields: InternshipFields,
    ) -> Result<Option<Internship>> {
        let mut state = self.store.lock();
        let Some((_, internship)) = state
            .internships
            .iter_mut()
            .find(|(_, i)| i.id == id && i.owner_id == owner_id)
        else {
            return Ok(None);
        };

        internship.title = fields.title;
        internship.location = fields.location;
        internship.is_remote = fields.is_remote;
        internship.description = fields.description;
        internship.requirements = fields.requirements;
        internship.deadline = fields.deadline;
        internship.is_active = fields.is_active;

        Ok(Some(internship.clone()))
    }

    async fn browse(
        &self,
        filter: &BrowseFilter,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> Result<(Vec<InternshipListing>, i64)> {
        let state = self.store.lock();
        let rows: Vec<_> = state
            .internships_desc()
            .into_iter()
            .filter(|i| i.is_active)
            .filter(|i| {
                contains(&i.title, &filter.search) || contains(&i.description, &filter.search)
            })
            .filter(|i| contains(&i.location, &filter.location))
            .filter(|i| contains(&state.username(i.owner_id), &filter.company))
            .filter(|i| filter.remote.map_or(true, |remote| i.is_remote == remote))
            .map(|i| state.listing(i, viewer))
            .collect();

        Ok(page_of(rows, page))
    }

    async fn list_owned(
        &self,
        owner_id: Uuid,
        filter: &OwnedFilter,
        page: PageRequest,
    ) -> Result<(Vec<InternshipListing>, i64)> {
        let state = self.store.lock();
        let rows: Vec<_> = state
            .internships_desc()
            .into_iter()
            .filter(|i| i.owner_id == owner_id)
            .filter(|i| contains(&i.title, &filter.search))
            .filter(|i| filter.remote.map_or(true, |remote| i.is_remote == remote))
            .map(|i| state.listing(i, None))
            .collect();

        Ok(page_of(rows, page))
    }

    async fn listing(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Option<InternshipListing>> {
        let state = self.store.lock();
        Ok(state.internship(id).map(|i| state.listing(i, viewer)))
    }

    async fn facets(&self) -> Result<CatalogFacets> {
        let state = self.store.lock();
        let active: Vec<_> = state
            .internships
            .iter()
            .map(|(_, i)| i)
            .filter(|i| i.is_active)
            .collect();

        let titles: BTreeSet<_> = active.iter().map(|i| i.title.clone()).collect();
        let locations: BTreeSet<_> = active
            .iter()
            .filter(|i| !i.location.is_empty())
            .map(|i| i.location.clone())
            .collect();
        let companies: BTreeSet<_> = active.iter().map(|i| state.username(i.owner_id)).collect();

        Ok(CatalogFacets {
            titles: titles.into_iter().collect(),
            locations: locations.into_iter().collect(),
            companies: companies.into_iter().collect(),
        })
    }
}

pub struct MemoryApplications {
    store: Arc<MemoryStore>,
}

impl MemoryApplications {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ApplicationRepository for MemoryApplications {
    async fn exists(&self, internship_id: Uuid, student_id: Uuid) -> Result<bool> {
        Ok(self.store.application_count(internship_id, student_id) > 0)
    }

    async fn insert(&self, application: NewApplication) -> Result<Option<Application>> {
        Ok(self.store.insert_application(application))
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        self.store.lock().applications.retain(|(_, a)| a.id != id);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<ApplicationRecord>> {
        let state = self.store.lock();
        Ok(state
            .applications
            .iter()
            .find(|(_, a)| a.id == id)
            .and_then(|(_, a)| state.record(a)))
    }

    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> Result<Option<Application>> {
        let mut state = self.store.lock();
        Ok(state
            .applications
            .iter_mut()
            .find(|(_, a)| a.id == id)
            .map(|(_, a)| {
                a.status = status;
                a.clone()
            }))
    }

    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<ApplicationRecord>> {
        Ok(self
            .store
            .lock()
            .records_desc()
            .into_iter()
            .filter(|r| r.application.student_id == student_id)
            .collect())
    }

    async fn list_for_company(
        &self,
        owner_id: Uuid,
        scope: CompanyScope,
        filter: &ApplicationFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<ApplicationRecord>, i64)> {
        let rows: Vec<_> = self
            .store
            .lock()
            .records_desc()
            .into_iter()
            .filter(|r| r.internship_owner_id == owner_id)
            .filter(|r| match scope {
                CompanyScope::AllPostings => true,
                CompanyScope::Posting(id) => r.application.internship_id == id,
            })
            .filter(|r| {
                contains(&r.student_username, &filter.search)
                    || contains(&r.student_email, &filter.search)
                    || contains(&r.student_full_name, &filter.search)
            })
            .filter(|r| filter.status.map_or(true, |s| r.application.status == s))
            .collect();

        match page {
            Some(page) => Ok(page_of(rows, page)),
            None => {
                let total = rows.len() as i64;
                Ok((rows, total))
            }
        }
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Object storage backed by a map. A failing instance rejects every write.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().expect("storage poisoned").contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().expect("storage poisoned").len()
    }
}

#[async_trait]
impl FileStorage for MemoryStorage {
    fn object_key(&self, visibility: FileVisibility, path: &str) -> String {
        match visibility {
            FileVisibility::Public => format!("public/{}", path),
            FileVisibility::Private => format!("private/{}", path),
        }
    }

    async fn store(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        if self.fail_writes {
            return Err(AppError::Storage(format!("Failed to upload '{}'", key)));
        }
        self.objects
            .lock()
            .expect("storage poisoned")
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.objects.lock().expect("storage poisoned").remove(key);
        Ok(())
    }

    async fn file_url(&self, key: &str) -> Result<String> {
        if key.starts_with("public/") {
            Ok(format!("memory://{}", key))
        } else {
            Ok(format!("memory://presigned/{}", key))
        }
    }
}
