//! Model source resolution: local path, or hub repo id (with a cached snapshot if present).

use std::fmt;
use std::path::{Path, PathBuf};

use hf_hub::{Cache, Repo};

/// Every transformers checkpoint carries one; its parent is the snapshot dir.
const SNAPSHOT_MARKER_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A path on disk. May not exist; the provider reports that.
    Local(PathBuf),
    /// `owner/name` on the model hub, with the local snapshot dir if already cached.
    Hub {
        repo_id: String,
        snapshot: Option<PathBuf>,
    },
}

impl ModelSource {
    pub fn resolve(id: &str) -> Self {
        Self::resolve_with_cache(id, &hub_cache())
    }

    pub fn resolve_with_cache(id: &str, cache: &Cache) -> Self {
        let path = Path::new(id);
        if path.exists() || !is_hub_repo_id(id) {
            return ModelSource::Local(path.to_path_buf());
        }
        ModelSource::Hub {
            repo_id: id.to_string(),
            snapshot: cached_snapshot(cache, id),
        }
    }

    /// What the backend is asked to load: a path when we have one, else the repo id.
    pub fn locator(&self) -> String {
        match self {
            ModelSource::Local(p) => p.display().to_string(),
            ModelSource::Hub {
                snapshot: Some(p), ..
            } => p.display().to_string(),
            ModelSource::Hub { repo_id, .. } => repo_id.clone(),
        }
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Local(p) => write!(f, "local:{}", p.display()),
            ModelSource::Hub {
                repo_id,
                snapshot: Some(_),
            } => write!(f, "hub:{repo_id} (cached)"),
            ModelSource::Hub { repo_id, .. } => write!(f, "hub:{repo_id}"),
        }
    }
}

/// `HF_HUB_CACHE` when set, otherwise the hub's own `HF_HOME` lookup.
pub fn hub_cache() -> Cache {
    match std::env::var_os("HF_HUB_CACHE") {
        Some(dir) => Cache::new(PathBuf::from(dir)),
        None => Cache::from_env(),
    }
}

/// `owner/name`, both parts non-empty, hub-safe characters only.
pub fn is_hub_repo_id(id: &str) -> bool {
    let Some((owner, name)) = id.split_once('/') else {
        return false;
    };
    let part_ok = |s: &str| {
        !s.is_empty()
            && !s.starts_with(['.', '-'])
            && !s.contains("..")
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    part_ok(owner) && part_ok(name)
}

/// Snapshot dir that `refs/main` points at, if it has been downloaded.
fn cached_snapshot(cache: &Cache, repo_id: &str) -> Option<PathBuf> {
    let file = cache
        .repo(Repo::model(repo_id.to_string()))
        .get(SNAPSHOT_MARKER_FILE)?;
    file.parent().map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const REPO: &str = "mlabonne/phixtral-4x2_8";

    fn repo_dir(root: &Path) -> PathBuf {
        root.join("models--mlabonne--phixtral-4x2_8")
    }

    fn seed_ref(root: &Path, rev: &str) {
        let refs = repo_dir(root).join("refs");
        fs::create_dir_all(&refs).unwrap();
        fs::write(refs.join("main"), rev).unwrap();
    }

    fn seed_snapshot(root: &Path, rev: &str) -> PathBuf {
        seed_ref(root, rev);
        let snap = repo_dir(root).join("snapshots").join(rev);
        fs::create_dir_all(&snap).unwrap();
        fs::write(snap.join("config.json"), "{}").unwrap();
        snap
    }

    fn cache_at(dir: &Path) -> Cache {
        Cache::new(dir.to_path_buf())
    }

    #[test]
    fn repo_id_shape() {
        assert!(is_hub_repo_id("mlabonne/phixtral-4x2_8"));
        assert!(is_hub_repo_id("microsoft/phi-1_5"));
        assert!(!is_hub_repo_id("phixtral"));
        assert!(!is_hub_repo_id("/abs/path"));
        assert!(!is_hub_repo_id("a/b/c"));
        assert!(!is_hub_repo_id("../weights"));
        assert!(!is_hub_repo_id("./model"));
    }

    #[test]
    fn existing_path_wins_over_repo_shape() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("owner").join("name");
        fs::create_dir_all(&model).unwrap();
        let id = model.display().to_string();

        let src = ModelSource::resolve_with_cache(&id, &cache_at(dir.path()));
        assert_eq!(src, ModelSource::Local(model.clone()));
        assert_eq!(src.locator(), id);
    }

    #[test]
    fn hub_id_uses_cached_snapshot() {
        let cache = tempfile::tempdir().unwrap();
        let snap = seed_snapshot(cache.path(), "abc123");

        let src = ModelSource::resolve_with_cache(REPO, &cache_at(cache.path()));
        assert_eq!(
            src,
            ModelSource::Hub {
                repo_id: REPO.into(),
                snapshot: Some(snap.clone()),
            }
        );
        assert_eq!(src.locator(), snap.display().to_string());
        assert_eq!(src.to_string(), "hub:mlabonne/phixtral-4x2_8 (cached)");
    }

    #[test]
    fn hub_id_without_snapshot_passes_repo_id() {
        let cache = tempfile::tempdir().unwrap();
        // refs/main names a revision that was never downloaded
        seed_ref(cache.path(), "deadbeef");

        let src = ModelSource::resolve_with_cache(REPO, &cache_at(cache.path()));
        assert_eq!(src.locator(), REPO);
        assert_eq!(src.to_string(), "hub:mlabonne/phixtral-4x2_8");
    }

    #[test]
    fn empty_cache_passes_repo_id() {
        let cache = tempfile::tempdir().unwrap();
        let src = ModelSource::resolve_with_cache(REPO, &cache_at(cache.path()));
        assert_eq!(
            src,
            ModelSource::Hub {
                repo_id: REPO.into(),
                snapshot: None,
            }
        );
    }

    #[test]
    fn non_repo_missing_path_stays_local() {
        let cache = tempfile::tempdir().unwrap();
        let src = ModelSource::resolve_with_cache("./no/such/model", &cache_at(cache.path()));
        assert!(matches!(src, ModelSource::Local(_)));
    }
}
