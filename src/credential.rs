// Copyright 2026 xfercore contributors.

//! Credential kinds and the resolver that picks between them per
//! endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::location::Location;
use crate::locator::ResourceLocator;

/// Access-token material obtained from an external token manager.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenInfo {
    pub access_token: String,
    pub expiry: OffsetDateTime,
    pub tenant: Option<String>,
    pub authority: Option<String>,
}

/// Credential kind attached to a [`crate::locator::ResourceLocator`].
#[derive(Clone, Debug)]
pub enum CredentialInfo {
    Anonymous,
    Sas(String),
    OAuth(TokenInfo),
    SharedKey { account: String, key: String },
    S3AccessKey {
        access_key_id: String,
        secret_access_key: String,
        endpoint: Option<String>,
        region: Option<String>,
    },
    GcsServiceAccount {
        key_path: String,
        project_id: String,
    },
}

/// External collaborator that refreshes and caches OAuth tokens; refresh
/// itself is the collaborator's job, not the resolver's.
pub trait TokenManager: Send + Sync {
    fn get_token(&self) -> Result<TokenInfo>;
    fn has_cached_token(&self) -> bool;
}

/// A fixed-token test double, useful wherever a real interactive or
/// managed-identity token source isn't available.
pub struct StaticTokenManager {
    token: Option<TokenInfo>,
}

impl StaticTokenManager {
    pub fn with_token(token: TokenInfo) -> Self {
        StaticTokenManager { token: Some(token) }
    }

    pub fn empty() -> Self {
        StaticTokenManager { token: None }
    }
}

impl TokenManager for StaticTokenManager {
    fn get_token(&self) -> Result<TokenInfo> {
        self.token.clone().ok_or_else(|| Error::NoCredential {
            endpoint: "static token manager has no cached token".to_string(),
        })
    }

    fn has_cached_token(&self) -> bool {
        self.token.is_some()
    }
}

/// Reads environment variables; abstracted so tests can supply a fixed
/// map instead of touching the real process environment.
pub trait EnvSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from `std::env`, clearing `AZCOPY_CRED_TYPE` after the first
/// read as the override is meant to be consulted once per process.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        let value = std::env::var(key).ok();
        if key == "AZCOPY_CRED_TYPE" && value.is_some() {
            std::env::remove_var(key);
        }
        value
    }
}

/// A fixed map, for deterministic tests.
pub struct MapEnv(pub HashMap<String, String>);

impl EnvSource for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Best-effort "is this resource publicly readable" probe: an anonymous
/// `GetProperties`-style call against the endpoint. Real backends
/// implement this against their SDK client; the default resolver accepts
/// any implementation.
pub trait PublicProber: Send + Sync {
    fn is_public(&self, locator: &ResourceLocator) -> bool;
}

/// Assumes nothing is public; used when no network probe is available
/// (e.g. offline planning, unit tests).
pub struct NeverPublic;

impl PublicProber for NeverPublic {
    fn is_public(&self, _locator: &ResourceLocator) -> bool {
        false
    }
}

/// Resolves a [`CredentialInfo`] for an endpoint, per the decision
/// procedure for its [`Location`].
pub struct CredentialResolver {
    env: Arc<dyn EnvSource>,
    token_manager: Arc<dyn TokenManager>,
    public_prober: Arc<dyn PublicProber>,
    /// Per-URL cache of the public-readability probe outcome.
    public_cache: Mutex<HashMap<String, bool>>,
}

impl CredentialResolver {
    pub fn new(
        env: Arc<dyn EnvSource>,
        token_manager: Arc<dyn TokenManager>,
        public_prober: Arc<dyn PublicProber>,
    ) -> Self {
        CredentialResolver {
            env,
            token_manager,
            public_prober,
            public_cache: Mutex::new(HashMap::new()),
        }
    }

    fn is_public_cached(&self, locator: &ResourceLocator) -> bool {
        if let Some(&cached) = self.public_cache.lock().unwrap().get(&locator.raw_url) {
            return cached;
        }
        let result = self.public_prober.is_public(locator);
        self.public_cache
            .lock()
            .unwrap()
            .insert(locator.raw_url.clone(), result);
        result
    }

    /// Resolve credentials for `locator`. `is_source` distinguishes the
    /// source from the destination endpoint in a two-sided job, since
    /// S2S credential rules differ by role.
    pub fn resolve(
        &self,
        location: Location,
        locator: &ResourceLocator,
        is_source: bool,
    ) -> Result<(CredentialInfo, bool)> {
        match location {
            Location::Local | Location::Pipe | Location::Benchmark | Location::None => {
                Ok((CredentialInfo::Anonymous, false))
            }
            Location::Blob => self.resolve_blob(locator, is_source),
            Location::File => self.resolve_file(locator),
            Location::BlobFS => self.resolve_blobfs(locator),
            Location::S3 => self.resolve_s3(locator),
            Location::GCS => self.resolve_gcs(locator),
        }
    }

    fn resolve_blob(&self, locator: &ResourceLocator, is_source: bool) -> Result<(CredentialInfo, bool)> {
        if let Some(sas) = &locator.sas_signature {
            return Ok((CredentialInfo::Sas(sas.clone()), false));
        }
        if let Some(cred_type) = self.env.get("AZCOPY_CRED_TYPE") {
            return Ok((self.credential_for_override(&cred_type)?, false));
        }
        let is_public = self.is_public_cached(locator);
        if !is_public {
            if let Some(token) = self.oauth_from_env_or_cache()? {
                return Ok((CredentialInfo::OAuth(token), false));
            }
        }
        if is_public {
            return Ok((CredentialInfo::Anonymous, true));
        }
        let _ = is_source;
        Err(Error::NoCredential {
            endpoint: locator.raw_url.clone(),
        })
    }

    fn resolve_file(&self, locator: &ResourceLocator) -> Result<(CredentialInfo, bool)> {
        if let Some(sas) = &locator.sas_signature {
            return Ok((CredentialInfo::Sas(sas.clone()), false));
        }
        // Azure Files has no anonymous-public read; an unauthenticated
        // request to a share is always rejected by the service, but the
        // core still allows `Anonymous` to flow through so the engine
        // produces a clear per-object auth error rather than failing at
        // plan time for every possible share configuration.
        Ok((CredentialInfo::Anonymous, false))
    }

    fn resolve_blobfs(&self, locator: &ResourceLocator) -> Result<(CredentialInfo, bool)> {
        if let Some(sas) = &locator.sas_signature {
            return Ok((CredentialInfo::Sas(sas.clone()), false));
        }
        if let Some(token) = self.oauth_from_env_or_cache()? {
            return Ok((CredentialInfo::OAuth(token), false));
        }
        if let (Some(account), Some(key)) = (self.env.get("ACCOUNT_NAME"), self.env.get("ACCOUNT_KEY")) {
            return Ok((CredentialInfo::SharedKey { account, key }, false));
        }
        Err(Error::NoCredential {
            endpoint: locator.raw_url.clone(),
        })
    }

    fn resolve_s3(&self, locator: &ResourceLocator) -> Result<(CredentialInfo, bool)> {
        match (
            self.env.get("AWS_ACCESS_KEY_ID"),
            self.env.get("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Ok((
                CredentialInfo::S3AccessKey {
                    access_key_id,
                    secret_access_key,
                    endpoint: locator.endpoint.clone(),
                    region: locator.region.clone(),
                },
                false,
            )),
            _ => Err(Error::NoCredential {
                endpoint: locator.raw_url.clone(),
            }),
        }
    }

    fn resolve_gcs(&self, locator: &ResourceLocator) -> Result<(CredentialInfo, bool)> {
        match (
            self.env.get("GOOGLE_APPLICATION_CREDENTIALS"),
            self.env.get("GOOGLE_CLOUD_PROJECT"),
        ) {
            (Some(key_path), Some(project_id)) => {
                Ok((CredentialInfo::GcsServiceAccount { key_path, project_id }, false))
            }
            _ => Err(Error::NoCredential {
                endpoint: locator.raw_url.clone(),
            }),
        }
    }

    fn credential_for_override(&self, cred_type: &str) -> Result<CredentialInfo> {
        match cred_type {
            "Anonymous" => Ok(CredentialInfo::Anonymous),
            "OAuthToken" => Ok(CredentialInfo::OAuth(self.token_manager.get_token()?)),
            other => Err(Error::NoCredential {
                endpoint: format!("unrecognized AZCOPY_CRED_TYPE override {other:?}"),
            }),
        }
    }

    fn oauth_from_env_or_cache(&self) -> Result<Option<TokenInfo>> {
        if let Some(json) = self.env.get("AZCOPY_OAUTH_TOKEN_INFO") {
            let token = parse_test_token_info(&json)?;
            return Ok(Some(token));
        }
        if self.token_manager.has_cached_token() {
            return Ok(Some(self.token_manager.get_token()?));
        }
        Ok(None)
    }

    /// For service-to-service copies, both endpoints' credentials must be
    /// resolved; the source must be `Sas` or public, since an
    /// OAuth-authenticated source cannot be handed to a server-side copy.
    pub fn resolve_s2s(
        &self,
        source_location: Location,
        source_locator: &ResourceLocator,
        dest_location: Location,
        dest_locator: &ResourceLocator,
    ) -> Result<(CredentialInfo, CredentialInfo)> {
        let (src_cred, src_public) = self.resolve(source_location, source_locator, true)?;
        if !matches!(src_cred, CredentialInfo::Sas(_)) && !src_public {
            return Err(Error::S2SRequiresSas {
                source: source_locator.raw_url.clone(),
            });
        }
        let (dst_cred, _) = self.resolve(dest_location, dest_locator, false)?;
        Ok((src_cred, dst_cred))
    }
}

fn parse_test_token_info(json: &str) -> Result<TokenInfo> {
    #[derive(serde::Deserialize)]
    struct Raw {
        access_token: String,
        #[serde(with = "time::serde::iso8601")]
        expiry: OffsetDateTime,
        tenant: Option<String>,
        authority: Option<String>,
    }
    let raw: Raw = serde_json::from_str(json).map_err(|e| Error::NoCredential {
        endpoint: format!("invalid AZCOPY_OAUTH_TOKEN_INFO: {e}"),
    })?;
    Ok(TokenInfo {
        access_token: raw.access_token,
        expiry: raw.expiry,
        tenant: raw.tenant,
        authority: raw.authority,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(env: HashMap<String, String>) -> CredentialResolver {
        CredentialResolver::new(
            Arc::new(MapEnv(env)),
            Arc::new(StaticTokenManager::empty()),
            Arc::new(NeverPublic),
        )
    }

    fn locator(raw: &str) -> ResourceLocator {
        ResourceLocator::parse(raw, Location::Blob).unwrap()
    }

    #[test]
    fn local_is_always_anonymous() {
        let r = resolver(HashMap::new());
        let (cred, is_public) = r
            .resolve(Location::Local, &locator("https://acct.blob.core.windows.net/c"), true)
            .unwrap();
        assert!(matches!(cred, CredentialInfo::Anonymous));
        assert!(!is_public);
    }

    #[test]
    fn blob_sas_takes_priority() {
        let r = resolver(HashMap::new());
        let loc = ResourceLocator::parse(
            "https://acct.blob.core.windows.net/c/obj?sv=1&sig=x",
            Location::Blob,
        )
        .unwrap();
        let (cred, _) = r.resolve(Location::Blob, &loc, true).unwrap();
        assert!(matches!(cred, CredentialInfo::Sas(_)));
    }

    #[test]
    fn blob_no_credential_when_private_and_no_token() {
        let r = resolver(HashMap::new());
        let err = r
            .resolve(Location::Blob, &locator("https://acct.blob.core.windows.net/c"), true)
            .unwrap_err();
        assert!(matches!(err, Error::NoCredential { .. }));
    }

    #[test]
    fn s3_requires_both_env_vars() {
        let mut env = HashMap::new();
        env.insert("AWS_ACCESS_KEY_ID".to_string(), "id".to_string());
        let r = resolver(env);
        let loc = ResourceLocator::parse("https://b.s3.amazonaws.com/k", Location::S3).unwrap();
        assert!(matches!(
            r.resolve(Location::S3, &loc, true).unwrap_err(),
            Error::NoCredential { .. }
        ));
    }

    #[test]
    fn s3_resolves_with_both_keys() {
        let mut env = HashMap::new();
        env.insert("AWS_ACCESS_KEY_ID".to_string(), "id".to_string());
        env.insert("AWS_SECRET_ACCESS_KEY".to_string(), "secret".to_string());
        let r = resolver(env);
        let loc = ResourceLocator::parse("https://b.s3.amazonaws.com/k", Location::S3).unwrap();
        let (cred, _) = r.resolve(Location::S3, &loc, true).unwrap();
        assert!(matches!(cred, CredentialInfo::S3AccessKey { .. }));
    }

    #[test]
    fn s2s_oauth_source_is_rejected() {
        let r = CredentialResolver::new(
            Arc::new(MapEnv(HashMap::new())),
            Arc::new(StaticTokenManager::with_token(TokenInfo {
                access_token: "tok".to_string(),
                expiry: OffsetDateTime::UNIX_EPOCH,
                tenant: None,
                authority: None,
            })),
            Arc::new(NeverPublic),
        );
        let src = locator("https://acct.blob.core.windows.net/c/obj");
        let dst = ResourceLocator::parse("https://b.s3.amazonaws.com/k", Location::S3).unwrap();
        let err = r
            .resolve_s2s(Location::Blob, &src, Location::S3, &dst)
            .unwrap_err();
        assert!(matches!(err, Error::S2SRequiresSas { .. }));
    }
}
