use std::path::PathBuf;

/// URL prefix under which downloaded assets are served.
pub const DEFAULT_PUBLIC_PREFIX: &str = "/data/images/lol";

/// Make a provider-supplied string safe to use as a single path component:
/// separators and characters invalid on common filesystems are removed and
/// leading/trailing dots are trimmed, so `..` can never escape the tree.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| {
            !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// On-disk and public locations of every champion asset.
///
/// Disk: `{root}/{locale}/champions/{remote_id}/...`; public URL: the same
/// relative path under `public_prefix`.
#[derive(Debug, Clone)]
pub struct AssetLayout {
    root: PathBuf,
    public_prefix: String,
    locale: String,
}

impl AssetLayout {
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str, locale: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            locale: sanitize_component(locale),
        }
    }

    pub fn champion_dir(&self, remote_id: &str) -> PathBuf {
        self.root
            .join(&self.locale)
            .join("champions")
            .join(sanitize_component(remote_id))
    }

    /// Public URL of the champion's asset directory, without trailing slash.
    pub fn public_base(&self, remote_id: &str) -> String {
        format!(
            "{}/{}/champions/{}",
            self.public_prefix,
            self.locale,
            sanitize_component(remote_id)
        )
    }

    pub fn icon_path(&self, remote_id: &str) -> PathBuf {
        self.champion_dir(remote_id).join("icon").join("icon.png")
    }

    pub fn icon_url(&self, remote_id: &str) -> String {
        format!("{}/icon/icon.png", self.public_base(remote_id))
    }

    pub fn passive_path(&self, remote_id: &str) -> PathBuf {
        self.champion_dir(remote_id).join("passive").join("icon.png")
    }

    pub fn passive_url(&self, remote_id: &str) -> String {
        format!("{}/passive/icon.png", self.public_base(remote_id))
    }

    pub fn spell_path(&self, remote_id: &str, image_file: &str) -> PathBuf {
        self.champion_dir(remote_id)
            .join("spells")
            .join(sanitize_component(image_file))
    }

    pub fn splash_path(&self, remote_id: &str, num: u32) -> PathBuf {
        self.champion_dir(remote_id)
            .join("skins")
            .join(format!("splash_{num}.jpg"))
    }

    pub fn loading_path(&self, remote_id: &str, num: u32) -> PathBuf {
        self.champion_dir(remote_id)
            .join("skins")
            .join(format!("loading_{num}.jpg"))
    }
}
