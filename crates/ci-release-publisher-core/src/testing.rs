//! In-memory provider fakes for unit tests

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use ci_release_publisher_providers::error::Result as ProviderResult;
use ci_release_publisher_providers::{
    Asset, CiStatusClient, HostingClient, NewRelease, ProviderError, Release, ReleaseUpdate,
    TravisEndpoint,
};
use tempfile::TempDir;

use crate::artifacts::ArtifactDir;
use crate::build_ref::BuildRef;
use crate::context::ReleaseContext;
use crate::tags::TagCodec;

/// A mutating hosting call, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create(String),
    Upload(String, String),
    /// Tag before the update, new tag if renamed
    Update(String, Option<String>),
    Delete(String),
    DeleteTag(String),
    Download(String),
}

#[derive(Default)]
struct HostingState {
    releases: Vec<Release>,
    tags: Vec<String>,
    calls: Vec<Call>,
    blobs: HashMap<u64, Vec<u8>>,
    next_id: u64,
    fail_uploads: HashSet<String>,
    fail_deletes: HashSet<String>,
}

impl HostingState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn api_error(status: u16, message: &str) -> ProviderError {
    ProviderError::Api {
        status,
        message: message.to_string(),
    }
}

/// Hosting provider keeping releases in memory
#[derive(Default)]
pub(crate) struct FakeHosting {
    state: Mutex<HostingState>,
}

impl FakeHosting {
    /// Insert a release directly, without recording a call
    pub fn seed(&self, tag: &str, draft: bool) -> Release {
        self.seed_at(tag, draft, Utc::now())
    }

    pub fn seed_at(&self, tag: &str, draft: bool, created_at: DateTime<Utc>) -> Release {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let release = Release {
            id,
            tag_name: tag.to_string(),
            name: Some(format!("Release {}", tag)),
            body: Some(String::new()),
            draft,
            prerelease: false,
            target_commitish: None,
            created_at,
            url: format!("fake://releases/{}", id),
            upload_url: format!("fake://uploads/{}", id),
            assets: Vec::new(),
        };
        if !draft {
            state.tags.push(tag.to_string());
        }
        state.releases.push(release.clone());
        release
    }

    /// Attach an asset with the given content to a seeded release
    pub fn seed_asset(&self, tag: &str, name: &str, content: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.blobs.insert(id, content.to_vec());
        let release = state
            .releases
            .iter_mut()
            .find(|r| r.tag_name == tag)
            .unwrap();
        release.assets.push(Asset {
            id,
            name: name.to_string(),
            size: content.len() as u64,
            url: format!("fake://assets/{}", id),
        });
    }

    pub fn release(&self, tag: &str) -> Option<Release> {
        let state = self.state.lock().unwrap();
        state.releases.iter().find(|r| r.tag_name == tag).cloned()
    }

    pub fn release_tags(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut tags: Vec<_> = state.releases.iter().map(|r| r.tag_name.clone()).collect();
        tags.sort();
        tags
    }

    /// Git tags currently present
    pub fn tags(&self) -> Vec<String> {
        let mut tags = self.state.lock().unwrap().tags.clone();
        tags.sort();
        tags
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(tag) => Some(tag),
                _ => None,
            })
            .collect()
    }

    pub fn fail_uploads_of(&self, file_name: &str) {
        let mut state = self.state.lock().unwrap();
        state.fail_uploads.insert(file_name.to_string());
    }

    pub fn fail_deletes_of(&self, tag: &str) {
        let mut state = self.state.lock().unwrap();
        state.fail_deletes.insert(tag.to_string());
    }
}

#[async_trait::async_trait]
impl HostingClient for FakeHosting {
    async fn list_releases(&self, _repo: &str) -> ProviderResult<Vec<Release>> {
        Ok(self.state.lock().unwrap().releases.clone())
    }

    async fn create_release(&self, _repo: &str, new: &NewRelease) -> ProviderResult<Release> {
        let mut state = self.state.lock().unwrap();
        if state.releases.iter().any(|r| r.tag_name == new.tag_name) {
            return Err(api_error(422, "already_exists"));
        }

        let id = state.next_id();
        let release = Release {
            id,
            tag_name: new.tag_name.clone(),
            name: Some(new.name.clone()),
            body: Some(new.body.clone()),
            draft: new.draft,
            prerelease: new.prerelease,
            target_commitish: new.target_commitish.clone(),
            created_at: Utc::now(),
            url: format!("fake://releases/{}", id),
            upload_url: format!("fake://uploads/{}", id),
            assets: Vec::new(),
        };
        if !new.draft {
            state.tags.push(new.tag_name.clone());
        }
        state.calls.push(Call::Create(new.tag_name.clone()));
        state.releases.push(release.clone());
        Ok(release)
    }

    async fn update_release(
        &self,
        release: &Release,
        update: &ReleaseUpdate,
    ) -> ProviderResult<Release> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Update(release.tag_name.clone(), update.tag_name.clone()));

        let stored = state
            .releases
            .iter_mut()
            .find(|r| r.id == release.id)
            .ok_or_else(|| api_error(404, "Not Found"))?;
        stored.name = Some(update.name.clone());
        stored.body = Some(update.body.clone());
        stored.draft = update.draft;
        stored.prerelease = update.prerelease;
        if let Some(tag) = &update.tag_name {
            stored.tag_name = tag.clone();
        }

        let updated = stored.clone();
        if !updated.draft && !state.tags.contains(&updated.tag_name) {
            state.tags.push(updated.tag_name.clone());
        }
        Ok(updated)
    }

    async fn delete_release(&self, release: &Release) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(release.tag_name.clone()));
        if state.fail_deletes.contains(&release.tag_name) {
            return Err(api_error(500, "Server Error"));
        }

        let before = state.releases.len();
        state.releases.retain(|r| r.id != release.id);
        if state.releases.len() == before {
            return Err(api_error(404, "Not Found"));
        }
        Ok(())
    }

    async fn delete_tag_ref(&self, _repo: &str, tag: &str) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteTag(tag.to_string()));

        let before = state.tags.len();
        state.tags.retain(|t| t != tag);
        if state.tags.len() == before {
            return Err(api_error(422, "Reference does not exist"));
        }
        Ok(())
    }

    async fn upload_asset(&self, release: &Release, path: &Path) -> ProviderResult<Asset> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = std::fs::read(path)?;

        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Upload(release.tag_name.clone(), name.clone()));
        if state.fail_uploads.contains(&name) {
            return Err(api_error(502, "Bad Gateway"));
        }

        let id = state.next_id();
        let asset = Asset {
            id,
            name,
            size: content.len() as u64,
            url: format!("fake://assets/{}", id),
        };
        state.blobs.insert(id, content);
        let stored = state
            .releases
            .iter_mut()
            .find(|r| r.id == release.id)
            .ok_or_else(|| api_error(404, "Not Found"))?;
        stored.assets.push(asset.clone());
        Ok(asset)
    }

    async fn list_assets(&self, release: &Release) -> ProviderResult<Vec<Asset>> {
        let state = self.state.lock().unwrap();
        state
            .releases
            .iter()
            .find(|r| r.id == release.id)
            .map(|r| r.assets.clone())
            .ok_or_else(|| api_error(404, "Not Found"))
    }

    async fn download_asset(&self, asset: &Asset, dest_dir: &Path) -> ProviderResult<PathBuf> {
        let content = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Download(asset.name.clone()));
            state
                .blobs
                .get(&asset.id)
                .cloned()
                .ok_or_else(|| api_error(404, "Not Found"))?
        };

        let path = dest_dir.join(&asset.name);
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

/// CI provider with scripted answers
#[derive(Default)]
pub(crate) struct FakeCi {
    last_builds: Mutex<HashMap<String, VecDeque<u64>>>,
    unfinished: Mutex<HashMap<String, BTreeSet<u64>>>,
    failing_builds: Mutex<HashSet<String>>,
}

impl FakeCi {
    pub fn set_last_build(&self, branch: &str, number: u64) {
        self.set_last_builds(branch, &[number]);
    }

    /// Answers returned in turn; the last one repeats
    pub fn set_last_builds(&self, branch: &str, numbers: &[u64]) {
        self.last_builds
            .lock()
            .unwrap()
            .insert(branch.to_string(), numbers.iter().copied().collect());
    }

    pub fn set_unfinished(&self, branch: &str, numbers: &[u64]) {
        self.unfinished
            .lock()
            .unwrap()
            .insert(branch.to_string(), numbers.iter().copied().collect());
    }

    pub fn set_failing(&self, build_id: &str) {
        self.failing_builds
            .lock()
            .unwrap()
            .insert(build_id.to_string());
    }
}

#[async_trait::async_trait]
impl CiStatusClient for FakeCi {
    async fn last_build_number(&self, _repo_slug: &str, branch: &str) -> ProviderResult<u64> {
        let mut builds = self.last_builds.lock().unwrap();
        let queue = builds
            .get_mut(branch)
            .ok_or_else(|| ProviderError::InvalidResponse(format!("unknown branch {}", branch)))?;
        let number = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().copied()
        };
        number.ok_or_else(|| ProviderError::InvalidResponse("no builds".to_string()))
    }

    async fn unfinished_build_numbers(
        &self,
        _repo_slug: &str,
        branch: &str,
    ) -> ProviderResult<BTreeSet<u64>> {
        Ok(self
            .unfinished
            .lock()
            .unwrap()
            .get(branch)
            .cloned()
            .unwrap_or_default())
    }

    async fn build_has_non_allowed_failing_job(&self, build_id: &str) -> ProviderResult<bool> {
        Ok(self.failing_builds.lock().unwrap().contains(build_id))
    }
}

/// Fakes plus a build on `master`, build 42, job 1, whose last build is itself
pub(crate) struct Fixture {
    pub hosting: FakeHosting,
    pub ci: FakeCi,
    pub codec: TagCodec,
    pub build: BuildRef,
    pub travis: TravisEndpoint,
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let ci = FakeCi::default();
        ci.set_last_build("master", 42);

        Self {
            hosting: FakeHosting::default(),
            ci,
            codec: TagCodec::new("ci", "_").unwrap(),
            build: BuildRef {
                repo_slug: "owner/repo".to_string(),
                hosting_repo: "owner/repo".to_string(),
                branch: "master".to_string(),
                tag: None,
                commit: "abc123".to_string(),
                build_number: 42,
                build_id: "9000".to_string(),
                job_number: 1,
                job_id: "9001".to_string(),
                job_failed: false,
                allow_failure: false,
            },
            travis: TravisEndpoint::Public,
            dir: TempDir::new().unwrap(),
        }
    }

    /// Write files named `names` into the artifact directory, each containing its own name
    pub fn with_artifacts(self, names: &[&str]) -> Self {
        for name in names {
            std::fs::write(self.dir.path().join(name), name).unwrap();
        }
        self
    }

    pub fn with_build(mut self, edit: impl FnOnce(&mut BuildRef)) -> Self {
        edit(&mut self.build);
        self
    }

    pub fn ctx(&self) -> ReleaseContext<'_> {
        ReleaseContext {
            hosting: &self.hosting,
            ci: &self.ci,
            codec: &self.codec,
            build: &self.build,
            travis: &self.travis,
        }
    }

    pub fn artifacts(&self) -> ArtifactDir {
        ArtifactDir::open_existing(self.dir.path()).unwrap()
    }

    /// Hours in the past, for seeding aged releases
    pub fn hours_ago(hours: i64) -> DateTime<Utc> {
        Utc::now() - Duration::hours(hours)
    }
}
