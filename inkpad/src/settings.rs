use inkpad_core::config::EditorConfig;

const DOCUMENTATION: &str = r#"# Inkpad settings. You may edit this file, but be aware that formatting and comments will not
# be preserved. Any missing field takes its default value.

# spatial_cell_size: side length of a spatial index cell, in canvas units.
# load_chunk_size: components added per step when loading.
#
# [cache]
# block_resolution: side length of a cached block, in output pixels.
# cache_size_bytes: most memory all cached blocks together may use.
# max_scale_drift: how far the zoom may change before a cached block is redrawn, as a ratio.
# min_cost_to_cache: how much drawing a block must have cost before it is cached.
# min_frame_savings: how much cached blocks must save in a frame before the cache is used at all.
# eviction: "cost_weighted" or "least_recently_used".

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

pub struct Settings {
    failed_to_load: bool,
    pub config: EditorConfig,
}
impl Settings {
    const FILENAME: &'static str = "inkpad.toml";
    /// Settings from the user's preferences, or defaulted if unavailable for some reason.
    #[must_use]
    pub fn from_preferences() -> Self {
        let mut dir = preferences_dir();
        match dir.as_mut() {
            None => Self::no_path(),
            Some(dir) => {
                dir.push(Self::FILENAME);
                Self::load_or_default(dir)
            }
        }
    }
    #[must_use]
    pub fn no_path() -> Self {
        log::warn!("Settings weren't available, defaulting.");
        Self {
            failed_to_load: true,
            config: EditorConfig::default(),
        }
    }
    #[must_use]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        let config: anyhow::Result<EditorConfig> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let config : EditorConfig = toml::from_str(&string)?;
            config.validate()?;

            Ok(config)
        };

        match config {
            Ok(config) => Self {
                failed_to_load: false,
                config,
            },
            Err(e) => {
                log::debug!("couldn't load {}: {e:#}", path.display());
                Self::no_path()
            }
        }
    }
    /// Return true if loading user's settings failed.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    /// Write the defaults, with documentation, into the user's preferences.
    pub fn save_default() -> anyhow::Result<std::path::PathBuf> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        let mut string = toml::ser::to_string_pretty(&EditorConfig::default())?;
        // Prefix some documentation.
        string = DOCUMENTATION.to_owned() + &string;
        std::fs::write(&preferences, string)?;
        Ok(preferences)
    }
}
