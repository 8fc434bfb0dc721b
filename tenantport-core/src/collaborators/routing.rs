use once_cell::sync::Lazy;
use regex::Regex;

use crate::transfer::EntityKind;

/// What an in-product path addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub slug: String,
    pub kind: EntityKind,
    pub id: String,
}

/// Read-only mapping between paths and the records they address.
pub trait RouteRecognizer: Send + Sync {
    fn recognize(&self, path: &str) -> Option<Route>;

    fn path_for(&self, route: &Route) -> String;
}

static RECORD_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?P<slug>[^/]+)/(?P<resource>cards|boards)/(?P<id>[^/]+)/?$")
        .expect("Invalid regex pattern for record paths")
});

/// Card and board routes: `/<slug>/cards/<id>` and `/<slug>/boards/<id>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductRoutes;

impl RouteRecognizer for ProductRoutes {
    fn recognize(&self, path: &str) -> Option<Route> {
        let captures = RECORD_PATH.captures(path)?;
        let kind = match &captures["resource"] {
            "cards" => EntityKind::Cards,
            "boards" => EntityKind::Boards,
            _ => return None,
        };
        Some(Route {
            slug: captures["slug"].to_string(),
            kind,
            id: captures["id"].to_string(),
        })
    }

    fn path_for(&self, route: &Route) -> String {
        format!("/{}/{}/{}", route.slug, route.kind.directory(), route.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_cards_and_boards() {
        let route = ProductRoutes.recognize("/1234/cards/abc").unwrap();
        assert_eq!(route.kind, EntityKind::Cards);
        assert_eq!(route.id, "abc");
        assert_eq!(route.slug, "1234");
        assert_eq!(ProductRoutes.path_for(&route), "/1234/cards/abc");

        let board = ProductRoutes.recognize("/1234/boards/b1/").unwrap();
        assert_eq!(board.kind, EntityKind::Boards);
    }

    #[test]
    fn test_ignores_other_paths() {
        assert!(ProductRoutes.recognize("/1234/cards/abc/comments").is_none());
        assert!(ProductRoutes.recognize("/1234/settings").is_none());
        assert!(ProductRoutes.recognize("cards/abc").is_none());
    }
}
