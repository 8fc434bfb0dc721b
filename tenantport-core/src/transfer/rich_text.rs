//! Rewrites imported rich-text bodies for the target tenant.
//!
//! Embedded objects travel as `<attachment-embed gid="gid://app/Tag/id">` and are
//! signed on import. In-product links are re-pointed at the target account's path
//! prefix, translating card and board ids on the way.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;
use url::Url;

use super::entity_kind::EntityKind;
use super::polymorphic::resolve_type_tag;
use super::translator::IdTranslator;
use crate::collaborators::{GlobalId, ReferenceSigner, Route, RouteRecognizer, ATTACHABLE_PURPOSE};

pub const EMBED_ELEMENT: &str = "attachment-embed";

static EMBED_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<attachment-embed\b[^>]*>")
        .expect("Invalid regex pattern for embedded attachments")
});

static GID_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\sgid="([^"]*)""#).expect("Invalid regex pattern for gid attributes")
});

static SGID_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\ssgid="([^"]*)""#).expect("Invalid regex pattern for sgid attributes")
});

static ANCHOR_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)(<a\b[^>]*?\bhref=")([^"]*)(")"#)
        .expect("Invalid regex pattern for anchor hrefs")
});

static RELATIVE_BASE: Lazy<Url> = Lazy::new(|| {
    Url::parse("http://relative.invalid/").expect("Invalid base url for relative links")
});

/// An embedded object after translation, in target-space ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedReference {
    pub kind: EntityKind,
    pub tag: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenBody {
    pub html: String,
    pub embeds: Vec<EmbeddedReference>,
}

pub struct RichTextRewriter<'a> {
    signer: &'a ReferenceSigner,
    routes: &'a dyn RouteRecognizer,
    source_slug: String,
    target_slug: String,
}

impl<'a> RichTextRewriter<'a> {
    pub fn new(
        signer: &'a ReferenceSigner,
        routes: &'a dyn RouteRecognizer,
        source_slug: impl Into<String>,
        target_slug: impl Into<String>,
    ) -> Self {
        Self {
            signer,
            routes,
            source_slug: source_slug.into(),
            target_slug: target_slug.into(),
        }
    }

    pub fn rewrite(&self, html: &str, translator: &IdTranslator) -> RewrittenBody {
        let mut embeds = Vec::new();
        let html = self.sign_embeds(html, translator, &mut embeds);
        let html = self.rewrite_links(&html, translator);
        RewrittenBody { html, embeds }
    }

    fn sign_embeds(
        &self,
        html: &str,
        translator: &IdTranslator,
        embeds: &mut Vec<EmbeddedReference>,
    ) -> String {
        EMBED_TAG
            .replace_all(html, |caps: &Captures| {
                let element = &caps[0];
                let Some(attr) = GID_ATTR.captures(element) else {
                    return element.to_string();
                };
                let Some(gid) = GlobalId::parse(&unescape(&attr[1])) else {
                    return element.to_string();
                };
                let Some(kind) = resolve_type_tag(&gid.tag) else {
                    debug!(tag = %gid.tag, "Leaving embed with unrecognised type");
                    return element.to_string();
                };

                let id = translator.lookup(kind, &gid.id);
                let signed = self
                    .signer
                    .sign(&self.signer.global_id(&gid.tag, &id), ATTACHABLE_PURPOSE);
                embeds.push(EmbeddedReference {
                    kind,
                    tag: gid.tag,
                    id,
                });
                element.replacen(&attr[0], &format!(" sgid=\"{}\"", signed), 1)
            })
            .into_owned()
    }

    fn rewrite_links(&self, html: &str, translator: &IdTranslator) -> String {
        ANCHOR_HREF
            .replace_all(html, |caps: &Captures| {
                let href = self.rewrite_link(&unescape(&caps[2]), translator);
                format!("{}{}{}", &caps[1], escape(&href), &caps[3])
            })
            .into_owned()
    }

    /// Swaps the tenant prefix of an in-product link. Other links come back unchanged.
    pub fn rewrite_link(&self, href: &str, translator: &IdTranslator) -> String {
        let (mut url, relative) = match Url::parse(href) {
            Ok(url) => (url, false),
            Err(url::ParseError::RelativeUrlWithoutBase)
                if href.starts_with('/') && !href.starts_with("//") =>
            {
                match RELATIVE_BASE.join(href) {
                    Ok(url) => (url, true),
                    Err(_) => return href.to_string(),
                }
            }
            Err(_) => return href.to_string(),
        };

        let prefix = format!("/{}/", self.source_slug);
        let Some(rest) = url.path().strip_prefix(&prefix) else {
            return href.to_string();
        };
        let mut path = format!("/{}/{}", self.target_slug, rest);

        if let Some(route) = self.routes.recognize(&path) {
            if let Some(id) = translator.get(route.kind, &route.id) {
                path = self.routes.path_for(&Route {
                    id: id.to_string(),
                    ..route
                });
            }
        }
        url.set_path(&path);

        if !relative {
            return url.to_string();
        }
        let mut out = url.path().to_string();
        if let Some(query) = url.query() {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

/// Turns signed references back into portable `gid` attributes for export.
/// Tokens that fail verification are left as they are.
pub fn to_portable_body(signer: &ReferenceSigner, html: &str) -> String {
    EMBED_TAG
        .replace_all(html, |caps: &Captures| {
            let element = &caps[0];
            let Some(attr) = SGID_ATTR.captures(element) else {
                return element.to_string();
            };
            match signer.verify(&unescape(&attr[1]), ATTACHABLE_PURPOSE) {
                Some(gid) => element.replacen(&attr[0], &format!(" gid=\"{}\"", gid), 1),
                None => element.to_string(),
            }
        })
        .into_owned()
}

/// Every embedded object of a stored body, from either `sgid` or `gid` attributes.
pub fn embedded_global_ids(signer: &ReferenceSigner, html: &str) -> Vec<GlobalId> {
    EMBED_TAG
        .find_iter(html)
        .filter_map(|element| {
            let element = element.as_str();
            if let Some(attr) = SGID_ATTR.captures(element) {
                return signer.verify(&unescape(&attr[1]), ATTACHABLE_PURPOSE);
            }
            GID_ATTR
                .captures(element)
                .and_then(|attr| GlobalId::parse(&unescape(&attr[1])))
        })
        .collect()
}

fn unescape(value: &str) -> String {
    value.replace("&amp;", "&")
}

fn escape(value: &str) -> String {
    value.replace('&', "&amp;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ProductRoutes;

    fn translator() -> IdTranslator {
        let mut translator = IdTranslator::new("target");
        translator.map(EntityKind::Cards, "c1", "C1").unwrap();
        translator.map(EntityKind::Boards, "b1", "B1").unwrap();
        translator.map(EntityKind::Blobs, "blob1", "BLOB1").unwrap();
        translator
    }

    #[test]
    fn test_embeds_become_signed_references() {
        let signer = ReferenceSigner::new("secret", "tenantport");
        let rewriter = RichTextRewriter::new(&signer, &ProductRoutes, "100", "200");
        let html = r#"<p>see</p><attachment-embed content-type="image/png" gid="gid://tenantport/Blob/blob1"></attachment-embed>"#;

        let body = rewriter.rewrite(html, &translator());
        assert!(!body.html.contains(" gid="));
        assert_eq!(
            body.embeds,
            vec![EmbeddedReference {
                kind: EntityKind::Blobs,
                tag: "Blob".to_string(),
                id: "BLOB1".to_string(),
            }]
        );

        let token = SGID_ATTR.captures(&body.html).unwrap()[1].to_string();
        let gid = signer.verify(&token, ATTACHABLE_PURPOSE).unwrap();
        assert_eq!(gid.id, "BLOB1");
        assert!(body.html.contains(r#"content-type="image/png""#));
    }

    #[test]
    fn test_unknown_embed_types_are_left_alone() {
        let signer = ReferenceSigner::new("secret", "tenantport");
        let rewriter = RichTextRewriter::new(&signer, &ProductRoutes, "100", "200");
        let html = r#"<attachment-embed gid="gid://tenantport/Gadget/1"></attachment-embed>"#;
        let body = rewriter.rewrite(html, &translator());
        assert_eq!(body.html, html);
        assert!(body.embeds.is_empty());
    }

    #[test]
    fn test_links() {
        let signer = ReferenceSigner::new("secret", "tenantport");
        let rewriter = RichTextRewriter::new(&signer, &ProductRoutes, "100", "200");
        let t = translator();

        assert_eq!(rewriter.rewrite_link("/100/cards/c1", &t), "/200/cards/C1");
        assert_eq!(rewriter.rewrite_link("/100/boards/b1/", &t), "/200/boards/B1");
        assert_eq!(rewriter.rewrite_link("/100/cards/zzz", &t), "/200/cards/zzz");
        assert_eq!(
            rewriter.rewrite_link("/100/settings?tab=2#top", &t),
            "/200/settings?tab=2#top"
        );
        assert_eq!(
            rewriter.rewrite_link("https://app.example.com/100/cards/c1", &t),
            "https://app.example.com/200/cards/C1"
        );
        assert_eq!(
            rewriter.rewrite_link("https://elsewhere.example.com/other", &t),
            "https://elsewhere.example.com/other"
        );
        assert_eq!(rewriter.rewrite_link("/999/cards/c1", &t), "/999/cards/c1");
        assert_eq!(rewriter.rewrite_link("not a url", &t), "not a url");
    }

    #[test]
    fn test_anchor_hrefs_in_html() {
        let signer = ReferenceSigner::new("secret", "tenantport");
        let rewriter = RichTextRewriter::new(&signer, &ProductRoutes, "100", "200");
        let html = r#"<a class="x" href="/100/cards/c1?a=1&amp;b=2">card</a> <a href="https://example.com">ext</a>"#;
        let body = rewriter.rewrite(html, &translator());
        assert_eq!(
            body.html,
            r#"<a class="x" href="/200/cards/C1?a=1&amp;b=2">card</a> <a href="https://example.com">ext</a>"#
        );
    }

    #[test]
    fn test_portable_body_reverses_signing() {
        let signer = ReferenceSigner::new("secret", "tenantport");
        let token = signer.sign(&signer.global_id("Card", "c9"), ATTACHABLE_PURPOSE);
        let html = format!(r#"<attachment-embed sgid="{}"></attachment-embed>"#, token);
        assert_eq!(
            to_portable_body(&signer, &html),
            r#"<attachment-embed gid="gid://tenantport/Card/c9"></attachment-embed>"#
        );

        let forged = r#"<attachment-embed sgid="abc--00"></attachment-embed>"#;
        assert_eq!(to_portable_body(&signer, forged), forged);
    }
}
