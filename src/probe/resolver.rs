use std::collections::HashMap;

use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ContentItem, MediaType, Platform};

pub const DEFAULT_LANGUAGE: &str = "eu";
pub const DEFAULT_DRM: &str = "widevine";
const DEFAULT_MANIFEST_TEMPLATE: &str = "/manifests/{slug}/{lang}/{drm}/dash.mpd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    MetadataApi,
    Manifest,
    AudioFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub kind: ProbeKind,
    pub url: String,
}

impl ProbeTarget {
    fn new(kind: ProbeKind, url: String) -> Self {
        Self { kind, url }
    }
}

/// Builds the ordered list of URLs worth probing for an item, cheapest first.
pub trait ProbeTargetResolver: Send + Sync {
    fn resolve(&self, item: &ContentItem) -> Result<Vec<ProbeTarget>>;
}

/// URL layout of one platform. All three EITB platforms share the same API
/// shape; ETB On adds live channels and relative manifest URLs.
#[derive(Debug, Clone)]
pub struct PlatformResolver {
    platform: Platform,
    origin: String,
    default_language: String,
}

impl PlatformResolver {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            origin: platform.origin(),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    fn api_target(&self, item: &ContentItem) -> ProbeTarget {
        let endpoint = match item.media_type {
            MediaType::Live => "stream",
            _ => "media",
        };
        ProbeTarget::new(
            ProbeKind::MetadataApi,
            format!(
                "{}/api/v1/{}/{}",
                self.origin,
                endpoint,
                urlencoding::encode(&item.slug)
            ),
        )
    }

    fn manifest_targets(&self, item: &ContentItem) -> Result<Vec<ProbeTarget>> {
        let template = item
            .manifest_template
            .as_deref()
            .unwrap_or(DEFAULT_MANIFEST_TEMPLATE);

        let languages: Vec<&str> = if item.languages.is_empty() {
            vec![self.default_language.as_str()]
        } else {
            item.languages.iter().map(String::as_str).collect()
        };
        let drm_schemes: Vec<&str> = if item.drm_schemes.is_empty() {
            vec![DEFAULT_DRM]
        } else {
            item.drm_schemes.iter().map(String::as_str).collect()
        };

        let mut targets = Vec::new();
        for lang in &languages {
            for drm in &drm_schemes {
                let url = self.expand(template, &item.slug, lang, drm)?;
                let target = ProbeTarget::new(ProbeKind::Manifest, url);
                // templates without {lang}/{drm} collapse to one URL
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        Ok(targets)
    }

    fn expand(&self, template: &str, slug: &str, lang: &str, drm: &str) -> Result<String> {
        let filled = template
            .replace("{slug}", &urlencoding::encode(slug))
            .replace("{lang}", &urlencoding::encode(lang))
            .replace("{drm}", &urlencoding::encode(drm));

        let invalid = |reason: String| AppError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let url = if filled.starts_with('/') {
            Url::parse(&self.origin)
                .and_then(|base| base.join(&filled))
                .map_err(|e| invalid(e.to_string()))?
        } else {
            Url::parse(&filled).map_err(|e| invalid(e.to_string()))?
        };
        Ok(url.to_string())
    }
}

impl ProbeTargetResolver for PlatformResolver {
    fn resolve(&self, item: &ContentItem) -> Result<Vec<ProbeTarget>> {
        let mut targets = vec![self.api_target(item)];

        match item.media_type {
            MediaType::Audio => {
                if let Some(audio_url) = &item.audio_url {
                    let url = self.expand(audio_url, &item.slug, &self.default_language, DEFAULT_DRM)?;
                    targets.push(ProbeTarget::new(ProbeKind::AudioFile, url));
                }
            }
            MediaType::Live => {
                // channels only expose a direct manifest when the catalog lists one
                if let Some(template) = &item.manifest_template {
                    let url = self.expand(template, &item.slug, &self.default_language, DEFAULT_DRM)?;
                    targets.push(ProbeTarget::new(ProbeKind::Manifest, url));
                }
            }
            MediaType::Movie | MediaType::Episode => {
                targets.extend(self.manifest_targets(item)?);
            }
            MediaType::Series => {
                return Err(AppError::NotProbableKind {
                    slug: item.slug.clone(),
                    kind: item.media_type.to_string(),
                });
            }
        }

        tracing::debug!(
            "Resolved {} probe targets for {} on {}",
            targets.len(),
            item.slug,
            self.platform
        );
        Ok(targets)
    }
}

/// Dispatches to the resolver of the item's platform.
pub struct PlatformResolvers {
    resolvers: HashMap<Platform, PlatformResolver>,
}

impl PlatformResolvers {
    pub fn new(default_language: &str) -> Self {
        let resolvers = Platform::ALL
            .into_iter()
            .map(|platform| {
                (
                    platform,
                    PlatformResolver::new(platform).with_default_language(default_language),
                )
            })
            .collect();
        Self { resolvers }
    }
}

impl ProbeTargetResolver for PlatformResolvers {
    fn resolve(&self, item: &ContentItem) -> Result<Vec<ProbeTarget>> {
        match self.resolvers.get(&item.platform) {
            Some(resolver) => resolver.resolve(item),
            None => PlatformResolver::new(item.platform).resolve(item),
        }
    }
}
