//! Signed global references for embedded rich-text objects.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Purpose scope of references embedded in rich text.
pub const ATTACHABLE_PURPOSE: &str = "attachable";

/// `gid://<app>/<Tag>/<id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalId {
    pub app: String,
    pub tag: String,
    pub id: String,
}

impl GlobalId {
    pub fn new(app: impl Into<String>, tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            tag: tag.into(),
            id: id.into(),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix("gid://")?;
        let (app, path) = rest.split_once('/')?;
        let (tag, id) = path.rsplit_once('/')?;
        if app.is_empty() || tag.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(app, tag, id))
    }
}

impl std::fmt::Display for GlobalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gid://{}/{}/{}", self.app, self.tag, self.id)
    }
}

/// Produces and verifies `<base64url(gid)>--<hex hmac>` tokens.
#[derive(Clone)]
pub struct ReferenceSigner {
    secret: Vec<u8>,
    app: String,
}

impl std::fmt::Debug for ReferenceSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceSigner")
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}

impl ReferenceSigner {
    pub fn new(secret: impl AsRef<[u8]>, app: impl Into<String>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            app: app.into(),
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn global_id(&self, tag: &str, id: &str) -> GlobalId {
        GlobalId::new(self.app.clone(), tag, id)
    }

    pub fn sign(&self, gid: &GlobalId, purpose: &str) -> String {
        let payload = URL_SAFE_NO_PAD.encode(gid.to_string());
        let digest = self.mac(purpose, &payload).finalize().into_bytes();
        format!("{}--{}", payload, hex::encode(digest))
    }

    /// The signed id, if the token is intact and was signed for `purpose`.
    pub fn verify(&self, token: &str, purpose: &str) -> Option<GlobalId> {
        let (payload, signature) = token.rsplit_once("--")?;
        let signature = hex::decode(signature).ok()?;
        self.mac(purpose, payload).verify_slice(&signature).ok()?;

        let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
        GlobalId::parse(std::str::from_utf8(&decoded).ok()?)
    }

    fn mac(&self, purpose: &str, payload: &str) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(purpose.as_bytes());
        mac.update(b":");
        mac.update(payload.as_bytes());
        mac
    }
}
